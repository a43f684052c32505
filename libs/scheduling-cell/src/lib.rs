pub mod handlers;
pub mod intervals;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use shared_config::AppConfig;
use shared_store::{DoctorGates, Table};

use directory_cell::DirectoryReader;
use models::{
    Appointment, BookingRules, ConsultationRecord, LabPrescription, LifecycleRules, Prescription,
};

/// Shared state of the scheduling cell: the appointment table and its
/// satellites, the per-doctor booking gates, and the read seam into the
/// directory. Services are cheap per-request constructions over this.
pub struct SchedulingState {
    pub directory: Arc<dyn DirectoryReader>,
    pub appointments: Table<Appointment>,
    pub consultation_records: Table<ConsultationRecord>,
    pub prescriptions: Table<Prescription>,
    pub lab_prescriptions: Table<LabPrescription>,
    pub gates: DoctorGates,
    pub booking_rules: BookingRules,
    pub lifecycle_rules: LifecycleRules,
}

impl SchedulingState {
    pub fn new(directory: Arc<dyn DirectoryReader>, config: &AppConfig) -> Self {
        Self {
            directory,
            appointments: Table::new(),
            consultation_records: Table::new(),
            prescriptions: Table::new(),
            lab_prescriptions: Table::new(),
            gates: DoctorGates::new(Duration::from_millis(config.booking_lock_timeout_ms)),
            booking_rules: BookingRules {
                min_lead_minutes: config.min_booking_lead_minutes,
                max_retry_attempts: config.booking_max_retries,
                ..BookingRules::default()
            },
            lifecycle_rules: LifecycleRules::default(),
        }
    }
}
