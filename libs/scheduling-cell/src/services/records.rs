// libs/scheduling-cell/src/services/records.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    AppointmentStatus, AttachConsultationRecordRequest, AttachLabPrescriptionRequest,
    AttachPrescriptionRequest, ConsultationRecord, LabPrescription, Prescription, SchedulingError,
};
use crate::SchedulingState;

/// Post-visit artifacts. Everything here hangs off a completed
/// appointment: the consultation record is one-to-one, prescriptions
/// and lab prescriptions accumulate.
pub struct RecordsService {
    state: Arc<SchedulingState>,
}

impl RecordsService {
    pub fn new(state: Arc<SchedulingState>) -> Self {
        Self { state }
    }

    pub async fn attach_consultation_record(
        &self,
        appointment_id: Uuid,
        request: AttachConsultationRecordRequest,
    ) -> Result<ConsultationRecord, SchedulingError> {
        self.require_completed(appointment_id).await?;

        if request.diagnosis.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "Diagnosis cannot be empty".to_string(),
            ));
        }

        let existing = self
            .state
            .consultation_records
            .filter(|rec| rec.appointment_id == appointment_id)
            .await;
        if !existing.is_empty() {
            return Err(SchedulingError::Validation(
                "Appointment already has a consultation record".to_string(),
            ));
        }

        let record = ConsultationRecord {
            id: Uuid::new_v4(),
            appointment_id,
            diagnosis: request.diagnosis,
            notes: request.notes,
            created_at: Utc::now(),
        };
        self.state
            .consultation_records
            .insert(record.id, record.clone())
            .await;

        info!(
            "Consultation record {} attached to appointment {}",
            record.id, appointment_id
        );
        Ok(record)
    }

    pub async fn attach_prescription(
        &self,
        appointment_id: Uuid,
        request: AttachPrescriptionRequest,
    ) -> Result<Prescription, SchedulingError> {
        self.require_completed(appointment_id).await?;

        if request.medication.trim().is_empty() || request.dosage.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "Medication and dosage are required".to_string(),
            ));
        }

        let prescription = Prescription {
            id: Uuid::new_v4(),
            appointment_id,
            medication: request.medication,
            dosage: request.dosage,
            instructions: request.instructions,
            created_at: Utc::now(),
        };
        self.state
            .prescriptions
            .insert(prescription.id, prescription.clone())
            .await;

        debug!(
            "Prescription {} attached to appointment {}",
            prescription.id, appointment_id
        );
        Ok(prescription)
    }

    pub async fn attach_lab_prescription(
        &self,
        appointment_id: Uuid,
        request: AttachLabPrescriptionRequest,
    ) -> Result<LabPrescription, SchedulingError> {
        self.require_completed(appointment_id).await?;

        if request.test_name.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "Test name cannot be empty".to_string(),
            ));
        }

        let lab = LabPrescription {
            id: Uuid::new_v4(),
            appointment_id,
            test_name: request.test_name,
            notes: request.notes,
            created_at: Utc::now(),
        };
        self.state
            .lab_prescriptions
            .insert(lab.id, lab.clone())
            .await;

        debug!(
            "Lab prescription {} attached to appointment {}",
            lab.id, appointment_id
        );
        Ok(lab)
    }

    pub async fn get_consultation_record(
        &self,
        appointment_id: Uuid,
    ) -> Result<ConsultationRecord, SchedulingError> {
        self.state
            .consultation_records
            .filter(|rec| rec.appointment_id == appointment_id)
            .await
            .into_iter()
            .next()
            .ok_or(SchedulingError::NotFound)
    }

    pub async fn get_prescriptions(&self, appointment_id: Uuid) -> Vec<Prescription> {
        let mut rows = self
            .state
            .prescriptions
            .filter(|rx| rx.appointment_id == appointment_id)
            .await;
        rows.sort_by_key(|rx| rx.created_at);
        rows
    }

    pub async fn get_lab_prescriptions(&self, appointment_id: Uuid) -> Vec<LabPrescription> {
        let mut rows = self
            .state
            .lab_prescriptions
            .filter(|lab| lab.appointment_id == appointment_id)
            .await;
        rows.sort_by_key(|lab| lab.created_at);
        rows
    }

    async fn require_completed(&self, appointment_id: Uuid) -> Result<(), SchedulingError> {
        let appointment = self
            .state
            .appointments
            .get(appointment_id)
            .await
            .ok_or(SchedulingError::NotFound)?;
        if appointment.status != AppointmentStatus::Completed {
            return Err(SchedulingError::Validation(format!(
                "Post-visit records require a completed appointment, status is {}",
                appointment.status
            )));
        }
        Ok(())
    }
}
