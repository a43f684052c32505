// libs/scheduling-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, ConflictCheckResponse};
use crate::SchedulingState;

/// Authoritative interval-overlap gate for the write path. Independent
/// of the slot resolver: the resolver may serve a slightly stale view,
/// this check decides at commit time.
pub struct ConflictDetectionService {
    state: Arc<SchedulingState>,
}

impl ConflictDetectionService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        Self { state }
    }

    /// True when `[start, end)` overlaps any active appointment for the
    /// doctor. Touching endpoints do not conflict. The appointment
    /// being moved during a reschedule is excluded so it never
    /// conflicts with itself.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> bool {
        !self
            .conflicting_appointments(doctor_id, start_time, end_time, exclude_appointment_id)
            .await
            .is_empty()
    }

    pub async fn check_conflicts(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> ConflictCheckResponse {
        debug!(
            "Checking conflicts for doctor {} from {} to {}",
            doctor_id, start_time, end_time
        );

        let conflicting_appointments = self
            .conflicting_appointments(doctor_id, start_time, end_time, exclude_appointment_id)
            .await;

        if !conflicting_appointments.is_empty() {
            warn!(
                "Conflict detected for doctor {} - {} overlapping appointments",
                doctor_id,
                conflicting_appointments.len()
            );
        }

        ConflictCheckResponse {
            has_conflict: !conflicting_appointments.is_empty(),
            conflicting_appointments,
        }
    }

    async fn conflicting_appointments(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Vec<Appointment> {
        let mut conflicts = self
            .state
            .appointments
            .filter(|apt| {
                apt.doctor_id == doctor_id
                    && Some(apt.id) != exclude_appointment_id
                    && apt.is_active()
                    && apt.overlaps(start_time, end_time)
            })
            .await;
        conflicts.sort_by_key(|apt| apt.scheduled_start);
        conflicts
    }
}
