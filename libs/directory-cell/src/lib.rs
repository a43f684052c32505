pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_store::Table;
use uuid::Uuid;

use models::{
    AvailabilityOverride, ConsultationPolicy, ConsultationType, Doctor, Patient,
    RecurringAvailability,
};

/// Backing tables for the directory cell. One instance is shared by
/// every service and by the scheduling cell's read seam.
pub struct DirectoryState {
    pub doctors: Table<Doctor>,
    pub patients: Table<Patient>,
    pub policies: Table<ConsultationPolicy>,
    pub availability: Table<RecurringAvailability>,
    pub overrides: Table<AvailabilityOverride>,
}

impl DirectoryState {
    pub fn new() -> Self {
        Self {
            doctors: Table::new(),
            patients: Table::new(),
            policies: Table::new(),
            availability: Table::new(),
            overrides: Table::new(),
        }
    }
}

impl Default for DirectoryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the directory consumed by the scheduling core.
/// The core treats this as an opaque service: it never navigates the
/// directory's object graph, only asks by id.
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    async fn doctor_exists(&self, doctor_id: Uuid) -> bool;

    async fn patient_exists(&self, patient_id: Uuid) -> bool;

    /// Fee and session duration the doctor offers for one consultation
    /// type, or `None` when the doctor does not offer it.
    async fn consultation_policy(
        &self,
        doctor_id: Uuid,
        consultation_type: ConsultationType,
    ) -> Option<ConsultationPolicy>;

    /// Live (non-tombstoned) recurring hours for one day of the week.
    async fn recurring_for_day(&self, doctor_id: Uuid, day_of_week: i32)
        -> Vec<RecurringAvailability>;

    /// Overrides whose span intersects `[start, end)`.
    async fn overrides_intersecting(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<AvailabilityOverride>;
}

#[async_trait]
impl DirectoryReader for DirectoryState {
    async fn doctor_exists(&self, doctor_id: Uuid) -> bool {
        self.doctors.get(doctor_id).await.is_some()
    }

    async fn patient_exists(&self, patient_id: Uuid) -> bool {
        self.patients.get(patient_id).await.is_some()
    }

    async fn consultation_policy(
        &self,
        doctor_id: Uuid,
        consultation_type: ConsultationType,
    ) -> Option<ConsultationPolicy> {
        self.policies
            .filter(|p| p.doctor_id == doctor_id && p.consultation_type == consultation_type)
            .await
            .into_iter()
            .next()
    }

    async fn recurring_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Vec<RecurringAvailability> {
        let mut rows = self
            .availability
            .filter(|a| a.doctor_id == doctor_id && a.day_of_week == day_of_week && !a.is_deleted)
            .await;
        rows.sort_by_key(|a| a.start_time);
        rows
    }

    async fn overrides_intersecting(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<AvailabilityOverride> {
        let mut rows = self
            .overrides
            .filter(|o| o.doctor_id == doctor_id && o.start_time < end && o.end_time > start)
            .await;
        rows.sort_by_key(|o| o.start_time);
        rows
    }
}
