use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    AvailabilityOverride, CreateAvailabilityRequest, CreateOverrideRequest, DirectoryError,
    RecurringAvailability,
};
use crate::DirectoryState;

pub struct AvailabilityService {
    state: Arc<DirectoryState>,
}

impl AvailabilityService {
    pub fn new(state: Arc<DirectoryState>) -> Self {
        Self { state }
    }

    /// Create a recurring weekly availability window for a doctor.
    /// Rejects overlap with any live entry for the same doctor+day so
    /// the weekly pattern stays a set of disjoint intervals.
    pub async fn create_availability(
        &self,
        doctor_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<RecurringAvailability, DirectoryError> {
        debug!(
            "Creating availability for doctor {} on day {}",
            doctor_id, request.day_of_week
        );

        if self.state.doctors.get(doctor_id).await.is_none() {
            return Err(DirectoryError::DoctorNotFound);
        }
        if request.start_time >= request.end_time {
            return Err(DirectoryError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        if request.day_of_week < 0 || request.day_of_week > 6 {
            return Err(DirectoryError::Validation(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        let siblings = self
            .state
            .availability
            .filter(|a| {
                a.doctor_id == doctor_id && a.day_of_week == request.day_of_week && !a.is_deleted
            })
            .await;

        // Half-open overlap test: touching windows are allowed.
        let overlaps = siblings
            .iter()
            .any(|a| request.start_time < a.end_time && request.end_time > a.start_time);
        if overlaps {
            return Err(DirectoryError::OverlappingAvailability);
        }

        let now = Utc::now();
        let availability = RecurringAvailability {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            end_time: request.end_time,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.state
            .availability
            .insert(availability.id, availability.clone())
            .await;

        info!("Availability {} created for doctor {}", availability.id, doctor_id);
        Ok(availability)
    }

    /// List a doctor's live availability entries, ordered by day then
    /// start time.
    pub async fn get_doctor_availability(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<RecurringAvailability>, DirectoryError> {
        let mut rows = self
            .state
            .availability
            .filter(|a| a.doctor_id == doctor_id && !a.is_deleted)
            .await;
        rows.sort_by_key(|a| (a.day_of_week, a.start_time));
        Ok(rows)
    }

    /// Tombstone an availability entry. The row is never physically
    /// removed; past appointments keep their reference context.
    pub async fn delete_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<RecurringAvailability, DirectoryError> {
        debug!("Soft-deleting availability {}", availability_id);

        self.state
            .availability
            .update(availability_id, |a| {
                a.is_deleted = true;
                a.updated_at = Utc::now();
            })
            .await
            .map_err(|_| DirectoryError::AvailabilityNotFound)
    }

    /// Create a date-specific override (vacation span, one-off extra
    /// hours, exceptional closure).
    pub async fn create_override(
        &self,
        doctor_id: Uuid,
        request: CreateOverrideRequest,
    ) -> Result<AvailabilityOverride, DirectoryError> {
        debug!(
            "Creating {:?} override for doctor {} from {} to {}",
            request.kind, doctor_id, request.start_time, request.end_time
        );

        if self.state.doctors.get(doctor_id).await.is_none() {
            return Err(DirectoryError::DoctorNotFound);
        }
        if request.start_time >= request.end_time {
            return Err(DirectoryError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }

        let entry = AvailabilityOverride {
            id: Uuid::new_v4(),
            doctor_id,
            start_time: request.start_time,
            end_time: request.end_time,
            kind: request.kind,
            reason: request.reason,
            created_at: Utc::now(),
        };
        self.state.overrides.insert(entry.id, entry.clone()).await;

        Ok(entry)
    }

    pub async fn get_overrides(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityOverride>, DirectoryError> {
        let mut rows = self
            .state
            .overrides
            .filter(|o| o.doctor_id == doctor_id)
            .await;
        rows.sort_by_key(|o| o.start_time);
        Ok(rows)
    }
}
