// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use directory_cell::models::ConsultationType;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Back-reference set when this appointment was created by a
    /// reschedule; the chain of predecessors forms the appointment's
    /// history.
    pub previous_appointment_id: Option<Uuid>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub consultation_type: ConsultationType,
    /// Fee snapshot taken from the doctor's policy at booking time.
    pub consultation_fee: f64,
    pub session_duration_minutes: i32,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Active appointments occupy their doctor's time window; cancelled
    /// and no-show ones release it.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.scheduled_start < end && self.scheduled_end > start
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::CheckedIn => write!(f, "checked_in"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

// ==============================================================================
// POST-VISIT SATELLITE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabPrescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub test_name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub consultation_type: ConsultationType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_start_time: DateTime<Utc>,
    pub new_end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub target_status: AppointmentStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub doctor_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub consultation_type: ConsultationType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConflictCheckQuery {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub exclude_appointment_id: Option<Uuid>,
}

/// One discrete bookable start time produced by slicing an open
/// interval by the consultation's session duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_bookable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachConsultationRecordRequest {
    pub diagnosis: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachPrescriptionRequest {
    pub medication: String,
    pub dosage: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachLabPrescriptionRequest {
    pub test_name: String,
    pub notes: Option<String>,
}

// ==============================================================================
// RULES
// ==============================================================================

/// Booking-path rules. Lock timeout lives on the store gates; these
/// govern validation and the bounded retry loop.
#[derive(Debug, Clone)]
pub struct BookingRules {
    pub min_lead_minutes: i64,
    pub max_duration_minutes: i64,
    pub max_retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_lead_minutes: 0,
            max_duration_minutes: 480,
            max_retry_attempts: 3,
            retry_backoff_ms: 100,
        }
    }
}

/// Lifecycle windows and bounds.
#[derive(Debug, Clone)]
pub struct LifecycleRules {
    pub checkin_early_minutes: i64,
    pub checkin_late_minutes: i64,
    pub cancellation_reason_min_chars: usize,
    pub cancellation_reason_max_chars: usize,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            checkin_early_minutes: 30,
            checkin_late_minutes: 15,
            cancellation_reason_min_chars: 5,
            cancellation_reason_max_chars: 500,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor does not offer {0} consultations")]
    ConsultationNotOffered(ConsultationType),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Appointment conflicts with an existing booking")]
    Conflict,

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Transient storage failure: {0}")]
    TransientStorage(String),
}
