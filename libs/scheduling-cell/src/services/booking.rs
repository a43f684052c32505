// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use directory_cell::models::ConsultationPolicy;
use shared_store::StoreError;

use crate::models::{
    Appointment, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
    RescheduleAppointmentRequest, SchedulingError,
};
use crate::services::conflict::ConflictDetectionService;
use crate::SchedulingState;

/// The only component allowed to insert appointment rows. Booking and
/// reschedule both run their conflict re-check and insert while holding
/// the doctor's gate, so for one doctor no concurrent writer can land
/// between check and commit.
pub struct BookingService {
    state: Arc<SchedulingState>,
    conflict_service: ConflictDetectionService,
}

impl BookingService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        let conflict_service = ConflictDetectionService::new(Arc::clone(&state));
        Self {
            state,
            conflict_service,
        }
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        let now = Utc::now();
        self.validate_window(request.start_time, request.end_time, now)?;
        if request.patient_id == request.doctor_id {
            return Err(SchedulingError::Validation(
                "Patient and doctor must be different parties".to_string(),
            ));
        }

        if !self.state.directory.patient_exists(request.patient_id).await {
            return Err(SchedulingError::PatientNotFound);
        }
        if !self.state.directory.doctor_exists(request.doctor_id).await {
            return Err(SchedulingError::DoctorNotFound);
        }
        let policy = self
            .state
            .directory
            .consultation_policy(request.doctor_id, request.consultation_type)
            .await
            .ok_or(SchedulingError::ConsultationNotOffered(
                request.consultation_type,
            ))?;

        self.with_retries(|| self.try_book(&request, &policy)).await
    }

    /// Reschedule an appointment to a new window with the same doctor.
    /// Validated exactly like a fresh booking; on success the original
    /// moves to Cancelled with a system reason and the replacement
    /// carries a `previous_appointment_id` back-reference.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Rescheduling appointment {}", appointment_id);

        let original = self.get_appointment(appointment_id).await?;
        if original.status != AppointmentStatus::Confirmed {
            return Err(SchedulingError::IllegalTransition {
                from: original.status,
                to: AppointmentStatus::Cancelled,
            });
        }

        let now = Utc::now();
        self.validate_window(request.new_start_time, request.new_end_time, now)?;

        let policy = self
            .state
            .directory
            .consultation_policy(original.doctor_id, original.consultation_type)
            .await
            .ok_or(SchedulingError::ConsultationNotOffered(
                original.consultation_type,
            ))?;

        self.with_retries(|| self.try_reschedule(&original, &request, &policy))
            .await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.state
            .appointments
            .get(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)
    }

    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
    ) -> Vec<Appointment> {
        let mut appointments = self
            .state
            .appointments
            .filter(|apt| {
                query.patient_id.is_none_or(|id| apt.patient_id == id)
                    && query.doctor_id.is_none_or(|id| apt.doctor_id == id)
                    && query.status.is_none_or(|status| apt.status == status)
                    && query.from_date.is_none_or(|from| apt.scheduled_start >= from)
                    && query.to_date.is_none_or(|to| apt.scheduled_start <= to)
            })
            .await;
        appointments.sort_by_key(|apt| apt.scheduled_start);
        appointments
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Bounded retry loop for transient storage failures (gate
    /// acquisition timeouts). Genuine conflicts are never retried: the
    /// caller must pick another slot.
    async fn with_retries<F, Fut>(&self, attempt_fn: F) -> Result<Appointment, SchedulingError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Appointment, SchedulingError>>,
    {
        let max_attempts = self.state.booking_rules.max_retry_attempts.max(1);
        let backoff = self.state.booking_rules.retry_backoff_ms;

        let mut last_error = SchedulingError::TransientStorage(
            "booking transaction never attempted".to_string(),
        );
        for attempt in 1..=max_attempts {
            match attempt_fn().await {
                Err(SchedulingError::TransientStorage(reason)) if attempt < max_attempts => {
                    warn!(
                        "Transient booking failure, retrying attempt {}/{}: {}",
                        attempt, max_attempts, reason
                    );
                    last_error = SchedulingError::TransientStorage(reason);
                    tokio::time::sleep(std::time::Duration::from_millis(
                        backoff * attempt as u64,
                    ))
                    .await;
                }
                other => return other,
            }
        }
        Err(last_error)
    }

    async fn try_book(
        &self,
        request: &BookAppointmentRequest,
        policy: &ConsultationPolicy,
    ) -> Result<Appointment, SchedulingError> {
        let _gate = self
            .state
            .gates
            .acquire(request.doctor_id)
            .await
            .map_err(map_store_error)?;

        // Authoritative re-check under the gate: the resolver's view
        // may be stale, this one cannot be.
        if self
            .conflict_service
            .has_conflict(request.doctor_id, request.start_time, request.end_time, None)
            .await
        {
            warn!(
                "Booking conflict for doctor {} at {}",
                request.doctor_id, request.start_time
            );
            return Err(SchedulingError::Conflict);
        }

        let appointment = self.build_appointment(
            request.patient_id,
            request.doctor_id,
            None,
            request.start_time,
            request.end_time,
            policy,
        );
        self.state
            .appointments
            .insert(appointment.id, appointment.clone())
            .await;

        info!(
            "Appointment {} booked for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled_start
        );
        Ok(appointment)
    }

    async fn try_reschedule(
        &self,
        original: &Appointment,
        request: &RescheduleAppointmentRequest,
        policy: &ConsultationPolicy,
    ) -> Result<Appointment, SchedulingError> {
        let _gate = self
            .state
            .gates
            .acquire(original.doctor_id)
            .await
            .map_err(map_store_error)?;

        // Re-load under the gate: a concurrent cancel or check-in may
        // have moved the original since the caller fetched it.
        let current = self.get_appointment(original.id).await?;
        if current.status != AppointmentStatus::Confirmed {
            return Err(SchedulingError::IllegalTransition {
                from: current.status,
                to: AppointmentStatus::Cancelled,
            });
        }

        if self
            .conflict_service
            .has_conflict(
                original.doctor_id,
                request.new_start_time,
                request.new_end_time,
                Some(original.id),
            )
            .await
        {
            return Err(SchedulingError::Conflict);
        }

        let replacement = self.build_appointment(
            original.patient_id,
            original.doctor_id,
            Some(original.id),
            request.new_start_time,
            request.new_end_time,
            policy,
        );
        self.state
            .appointments
            .insert(replacement.id, replacement.clone())
            .await;

        let now = Utc::now();
        self.state
            .appointments
            .update(original.id, |apt| {
                apt.status = AppointmentStatus::Cancelled;
                apt.cancellation_reason =
                    Some(format!("Rescheduled to appointment {}", replacement.id));
                apt.cancelled_at = Some(now);
                apt.updated_at = now;
            })
            .await
            .map_err(map_store_error)?;

        info!(
            "Appointment {} rescheduled to {} for doctor {}",
            original.id, replacement.id, original.doctor_id
        );
        Ok(replacement)
    }

    fn build_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        previous_appointment_id: Option<Uuid>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        policy: &ConsultationPolicy,
    ) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            previous_appointment_id,
            scheduled_start: start_time,
            scheduled_end: end_time,
            consultation_type: policy.consultation_type,
            consultation_fee: policy.fee,
            session_duration_minutes: policy.session_duration_minutes,
            status: AppointmentStatus::Confirmed,
            cancellation_reason: None,
            cancelled_at: None,
            actual_start_time: None,
            actual_end_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn validate_window(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        if start_time >= end_time {
            return Err(SchedulingError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        let lead = ChronoDuration::minutes(self.state.booking_rules.min_lead_minutes);
        if start_time < now + lead {
            return Err(SchedulingError::Validation(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        let duration_minutes = (end_time - start_time).num_minutes();
        if duration_minutes <= 0
            || duration_minutes > self.state.booking_rules.max_duration_minutes
        {
            return Err(SchedulingError::Validation(format!(
                "Appointment duration must be between 1 and {} minutes",
                self.state.booking_rules.max_duration_minutes
            )));
        }

        Ok(())
    }
}

fn map_store_error(err: StoreError) -> SchedulingError {
    match err {
        StoreError::NotFound => SchedulingError::NotFound,
        StoreError::LockTimeout(reason) => SchedulingError::TransientStorage(reason),
    }
}
