// libs/scheduling-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_store::StoreError;

use crate::models::{Appointment, AppointmentStatus, SchedulingError};
use crate::SchedulingState;

/// Drives the appointment status machine. Every move goes through the
/// static transition table; anything the table does not list is an
/// illegal transition, and terminal states accept nothing.
pub struct LifecycleService {
    state: Arc<SchedulingState>,
}

/// Which targets each status may move to. Requesting the current status
/// again is an idempotent no-op handled before this table is consulted.
const ALLOWED_TRANSITIONS: &[(AppointmentStatus, &[AppointmentStatus])] = &[
    (
        AppointmentStatus::Confirmed,
        &[
            AppointmentStatus::CheckedIn,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
    ),
    (
        AppointmentStatus::CheckedIn,
        &[
            AppointmentStatus::InProgress,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
    ),
    (
        AppointmentStatus::InProgress,
        &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
    ),
    (AppointmentStatus::Completed, &[]),
    (AppointmentStatus::Cancelled, &[]),
    (AppointmentStatus::NoShow, &[]),
];

fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    ALLOWED_TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .is_some_and(|(_, targets)| targets.contains(&to))
}

impl LifecycleService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        Self { state }
    }

    /// Move an appointment to `target`. A request for the status the
    /// appointment already has succeeds without touching the row, so
    /// retried deliveries of the same transition are harmless.
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .state
            .appointments
            .get(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;

        if appointment.status == target {
            debug!(
                "Appointment {} already {}, no-op transition",
                appointment_id, target
            );
            return Ok(appointment);
        }

        if !transition_allowed(appointment.status, target) {
            return Err(SchedulingError::IllegalTransition {
                from: appointment.status,
                to: target,
            });
        }

        let now = Utc::now();
        match target {
            AppointmentStatus::CheckedIn => {
                self.validate_checkin_window(&appointment, now)?;
            }
            AppointmentStatus::InProgress => {
                self.validate_single_session(appointment.doctor_id, appointment_id)
                    .await?;
            }
            AppointmentStatus::Cancelled => {
                self.validate_cancellation_reason(reason.as_deref())?;
            }
            _ => {}
        }

        let updated = self
            .state
            .appointments
            .update(appointment_id, |apt| {
                apt.status = target;
                apt.updated_at = now;
                match target {
                    AppointmentStatus::InProgress => apt.actual_start_time = Some(now),
                    AppointmentStatus::Completed => apt.actual_end_time = Some(now),
                    AppointmentStatus::Cancelled => {
                        apt.cancellation_reason = reason.clone();
                        apt.cancelled_at = Some(now);
                    }
                    _ => {}
                }
            })
            .await
            .map_err(|err| match err {
                StoreError::NotFound => SchedulingError::NotFound,
                StoreError::LockTimeout(reason) => SchedulingError::TransientStorage(reason),
            })?;

        info!(
            "Appointment {} transitioned {} -> {}",
            appointment_id, appointment.status, target
        );
        Ok(updated)
    }

    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        reason: String,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(appointment_id, AppointmentStatus::Cancelled, Some(reason))
            .await
    }

    /// Check-in is only accepted in a window around the scheduled
    /// start: not too early, not after the grace period has lapsed.
    fn validate_checkin_window(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let rules = &self.state.lifecycle_rules;
        let earliest = appointment.scheduled_start - Duration::minutes(rules.checkin_early_minutes);
        let latest = appointment.scheduled_start + Duration::minutes(rules.checkin_late_minutes);

        if now < earliest {
            return Err(SchedulingError::Validation(format!(
                "Check-in opens {} minutes before the scheduled start",
                rules.checkin_early_minutes
            )));
        }
        if now > latest {
            return Err(SchedulingError::Validation(format!(
                "Check-in closed {} minutes after the scheduled start",
                rules.checkin_late_minutes
            )));
        }
        Ok(())
    }

    /// A doctor runs one consultation at a time.
    async fn validate_single_session(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<(), SchedulingError> {
        let in_progress = self
            .state
            .appointments
            .filter(|apt| {
                apt.doctor_id == doctor_id
                    && apt.id != appointment_id
                    && apt.status == AppointmentStatus::InProgress
            })
            .await;
        if !in_progress.is_empty() {
            return Err(SchedulingError::Validation(
                "Doctor already has a consultation in progress".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_cancellation_reason(&self, reason: Option<&str>) -> Result<(), SchedulingError> {
        let rules = &self.state.lifecycle_rules;
        let reason = reason.map(str::trim).unwrap_or_default();
        if reason.chars().count() < rules.cancellation_reason_min_chars
            || reason.chars().count() > rules.cancellation_reason_max_chars
        {
            return Err(SchedulingError::Validation(format!(
                "Cancellation reason must be between {} and {} characters",
                rules.cancellation_reason_min_chars, rules.cancellation_reason_max_chars
            )));
        }
        Ok(())
    }
}
