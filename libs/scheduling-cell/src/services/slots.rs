// libs/scheduling-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use directory_cell::models::{ConsultationType, OverrideKind};

use crate::intervals::{self, Interval};
use crate::models::{ResolvedSlot, SchedulingError};
use crate::SchedulingState;

/// Read-side slot computation: recurring weekly hours, plus Available
/// overrides, minus Unavailable overrides, minus active appointments.
/// Not linearizable with the booking path by design; the conflict
/// checker is the authoritative gate at commit time.
pub struct SlotResolverService {
    state: Arc<SchedulingState>,
}

impl SlotResolverService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        Self { state }
    }

    /// Merged, ordered, pairwise disjoint open intervals for one doctor
    /// over `[range_start, range_end)`. Instants before `now` are
    /// excluded.
    pub async fn resolve_open_intervals(
        &self,
        doctor_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Interval>, SchedulingError> {
        if range_start >= range_end {
            return Ok(vec![]);
        }
        if !self.state.directory.doctor_exists(doctor_id).await {
            return Err(SchedulingError::DoctorNotFound);
        }

        let bounds = Interval::new(range_start, range_end);

        // Candidates: the weekly pattern projected onto each calendar
        // day in the range.
        let mut candidates = Vec::new();
        let mut day = range_start.date_naive();
        while day.and_time(NaiveTime::MIN).and_utc() < range_end {
            let day_of_week = day.weekday().num_days_from_sunday() as i32;
            for window in self
                .state
                .directory
                .recurring_for_day(doctor_id, day_of_week)
                .await
            {
                let projected = Interval::new(
                    day.and_time(window.start_time).and_utc(),
                    day.and_time(window.end_time).and_utc(),
                );
                if let Some(clamped) = projected.clamp(&bounds) {
                    candidates.push(clamped);
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        // Overrides: Available spans are strictly additive, even
        // outside the weekly pattern; Unavailable spans are cuts.
        let mut cuts = Vec::new();
        for entry in self
            .state
            .directory
            .overrides_intersecting(doctor_id, range_start, range_end)
            .await
        {
            let span = Interval::new(entry.start_time, entry.end_time);
            match entry.kind {
                OverrideKind::Available => {
                    if let Some(clamped) = span.clamp(&bounds) {
                        candidates.push(clamped);
                    }
                }
                OverrideKind::Unavailable => cuts.push(span),
            }
        }

        // Booked time is subtractive exactly like an Unavailable
        // override; cancelled and no-show rows have released their
        // window and are ignored.
        let occupied = self
            .state
            .appointments
            .filter(|apt| {
                apt.doctor_id == doctor_id
                    && apt.is_active()
                    && apt.overlaps(range_start, range_end)
            })
            .await;
        cuts.extend(
            occupied
                .iter()
                .map(|apt| Interval::new(apt.scheduled_start, apt.scheduled_end)),
        );

        let effective = Interval::new(range_start.max(now), range_end);
        let open = intervals::subtract_all(intervals::merge(candidates), &cuts)
            .into_iter()
            .filter_map(|iv| iv.clamp(&effective))
            .collect::<Vec<_>>();

        debug!(
            "Resolved {} open intervals for doctor {} in [{}, {})",
            open.len(),
            doctor_id,
            range_start,
            range_end
        );
        Ok(open)
    }

    /// Slice the open intervals into discrete slots sized to the
    /// doctor's session duration for the consultation type. Partial
    /// trailing steps are discarded.
    pub async fn resolve_slots(
        &self,
        doctor_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        consultation_type: ConsultationType,
        now: DateTime<Utc>,
    ) -> Result<Vec<ResolvedSlot>, SchedulingError> {
        if !self.state.directory.doctor_exists(doctor_id).await {
            return Err(SchedulingError::DoctorNotFound);
        }
        let policy = self
            .state
            .directory
            .consultation_policy(doctor_id, consultation_type)
            .await
            .ok_or(SchedulingError::ConsultationNotOffered(consultation_type))?;

        let open = self
            .resolve_open_intervals(doctor_id, range_start, range_end, now)
            .await?;

        let lead = Duration::minutes(self.state.booking_rules.min_lead_minutes);
        let slots = intervals::slice_slots(&open, policy.session_duration_minutes as i64)
            .into_iter()
            .map(|iv| ResolvedSlot {
                start_time: iv.start,
                end_time: iv.end,
                is_bookable: iv.start >= now + lead,
            })
            .collect();

        Ok(slots)
    }
}
