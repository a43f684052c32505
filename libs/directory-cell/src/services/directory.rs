use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    ConsultationPolicy, DirectoryError, Doctor, Patient, RegisterDoctorRequest,
    RegisterPatientRequest, UpsertPolicyRequest,
};
use crate::DirectoryState;

/// Maximum session length a policy may advertise, in minutes.
const MAX_SESSION_MINUTES: i32 = 480;

pub struct DirectoryService {
    state: Arc<DirectoryState>,
}

impl DirectoryService {
    pub fn new(state: Arc<DirectoryState>) -> Self {
        Self { state }
    }

    pub async fn register_doctor(
        &self,
        request: RegisterDoctorRequest,
    ) -> Result<Doctor, DirectoryError> {
        if request.full_name.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Doctor name must not be empty".to_string(),
            ));
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            specialty: request.specialty,
            created_at: Utc::now(),
        };
        self.state.doctors.insert(doctor.id, doctor.clone()).await;

        info!("Registered doctor {}", doctor.id);
        Ok(doctor)
    }

    pub async fn register_patient(
        &self,
        request: RegisterPatientRequest,
    ) -> Result<Patient, DirectoryError> {
        if request.full_name.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Patient name must not be empty".to_string(),
            ));
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            full_name: request.full_name,
            created_at: Utc::now(),
        };
        self.state.patients.insert(patient.id, patient.clone()).await;

        info!("Registered patient {}", patient.id);
        Ok(patient)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DirectoryError> {
        self.state
            .doctors
            .get(doctor_id)
            .await
            .ok_or(DirectoryError::DoctorNotFound)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, DirectoryError> {
        self.state
            .patients
            .get(patient_id)
            .await
            .ok_or(DirectoryError::PatientNotFound)
    }

    /// Create or replace the doctor's policy for one consultation type.
    pub async fn upsert_policy(
        &self,
        doctor_id: Uuid,
        request: UpsertPolicyRequest,
    ) -> Result<ConsultationPolicy, DirectoryError> {
        debug!(
            "Upserting {} policy for doctor {}",
            request.consultation_type, doctor_id
        );

        if self.state.doctors.get(doctor_id).await.is_none() {
            return Err(DirectoryError::DoctorNotFound);
        }
        if request.fee < 0.0 {
            return Err(DirectoryError::Validation(
                "Consultation fee must not be negative".to_string(),
            ));
        }
        if request.session_duration_minutes <= 0
            || request.session_duration_minutes > MAX_SESSION_MINUTES
        {
            return Err(DirectoryError::Validation(format!(
                "Session duration must be between 1 and {} minutes",
                MAX_SESSION_MINUTES
            )));
        }

        let existing = self
            .state
            .policies
            .filter(|p| p.doctor_id == doctor_id && p.consultation_type == request.consultation_type)
            .await
            .into_iter()
            .next();

        let policy = match existing {
            Some(current) => {
                self.state
                    .policies
                    .update(current.id, |p| {
                        p.fee = request.fee;
                        p.session_duration_minutes = request.session_duration_minutes;
                        p.updated_at = Utc::now();
                    })
                    .await
                    .map_err(|_| DirectoryError::DoctorNotFound)?
            }
            None => {
                let policy = ConsultationPolicy {
                    id: Uuid::new_v4(),
                    doctor_id,
                    consultation_type: request.consultation_type,
                    fee: request.fee,
                    session_duration_minutes: request.session_duration_minutes,
                    updated_at: Utc::now(),
                };
                self.state.policies.insert(policy.id, policy.clone()).await;
                policy
            }
        };

        Ok(policy)
    }
}
