// libs/directory-cell/src/models.rs
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// IDENTITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// CONSULTATION POLICY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    Video,
    Clinic,
    Phone,
    HomeVisit,
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationType::Video => write!(f, "video"),
            ConsultationType::Clinic => write!(f, "clinic"),
            ConsultationType::Phone => write!(f, "phone"),
            ConsultationType::HomeVisit => write!(f, "home_visit"),
        }
    }
}

/// Fee and session length a doctor offers for one consultation type.
/// Bookings snapshot these values, so later edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationPolicy {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub consultation_type: ConsultationType,
    pub fee: f64,
    pub session_duration_minutes: i32,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// Standing weekly open hours for one day of the week.
/// `day_of_week` runs 0 (Sunday) through 6 (Saturday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringAvailability {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Tombstone. Deleted rows stay in the table so historical
    /// appointments keep a stable reference context; every read path
    /// filters them out.
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    Available,
    Unavailable,
}

/// Date-specific exception to the recurring pattern: a vacation span,
/// a one-off closure, or extra hours outside the weekly schedule.
/// Takes precedence over recurring availability for the instants it
/// covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: OverrideKind,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDoctorRequest {
    pub full_name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPatientRequest {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPolicyRequest {
    pub consultation_type: ConsultationType,
    pub fee: f64,
    pub session_duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOverrideRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: OverrideKind,
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Availability entry not found")]
    AvailabilityNotFound,

    #[error("Availability overlaps an existing schedule entry")]
    OverlappingAvailability,

    #[error("Validation error: {0}")]
    Validation(String),
}
