// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    AppointmentSearchQuery, AttachConsultationRecordRequest, AttachLabPrescriptionRequest,
    AttachPrescriptionRequest, BookAppointmentRequest, CancelAppointmentRequest,
    ConflictCheckQuery, RescheduleAppointmentRequest, SchedulingError, SlotQuery,
    TransitionRequest,
};
use crate::services::booking::BookingService;
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::LifecycleService;
use crate::services::records::RecordsService;
use crate::services::slots::SlotResolverService;
use crate::SchedulingState;

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::NotFound
            | SchedulingError::PatientNotFound
            | SchedulingError::DoctorNotFound => AppError::NotFound(err.to_string()),
            SchedulingError::ConsultationNotOffered(_) => AppError::ValidationError(err.to_string()),
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::Conflict => AppError::Conflict(err.to_string()),
            SchedulingError::IllegalTransition { .. } => AppError::Unprocessable(err.to_string()),
            SchedulingError::TransientStorage(_) => AppError::Unavailable(err.to_string()),
        }
    }
}

pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(state).book_appointment(request).await?;
    Ok(Json(json!(appointment)))
}

pub async fn get_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(state)
        .get_appointment(appointment_id)
        .await?;
    Ok(Json(json!(appointment)))
}

pub async fn search_appointments(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = BookingService::new(state).search_appointments(query).await;
    Ok(Json(json!(appointments)))
}

pub async fn resolve_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = SlotResolverService::new(state)
        .resolve_slots(
            query.doctor_id,
            query.start_date,
            query.end_date,
            query.consultation_type,
            Utc::now(),
        )
        .await?;
    Ok(Json(json!(slots)))
}

pub async fn check_conflicts(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let response = ConflictDetectionService::new(state)
        .check_conflicts(
            query.doctor_id,
            query.start_time,
            query.end_time,
            query.exclude_appointment_id,
        )
        .await;
    Ok(Json(json!(response)))
}

pub async fn transition_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = LifecycleService::new(state)
        .transition(appointment_id, request.target_status, request.reason)
        .await?;
    Ok(Json(json!(appointment)))
}

pub async fn cancel_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = LifecycleService::new(state)
        .cancel(appointment_id, request.reason)
        .await?;
    Ok(Json(json!(appointment)))
}

pub async fn reschedule_appointment(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = BookingService::new(state)
        .reschedule_appointment(appointment_id, request)
        .await?;
    Ok(Json(json!(appointment)))
}

pub async fn attach_consultation_record(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AttachConsultationRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let record = RecordsService::new(state)
        .attach_consultation_record(appointment_id, request)
        .await?;
    Ok(Json(json!(record)))
}

pub async fn get_consultation_record(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let record = RecordsService::new(state)
        .get_consultation_record(appointment_id)
        .await?;
    Ok(Json(json!(record)))
}

pub async fn attach_prescription(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AttachPrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let prescription = RecordsService::new(state)
        .attach_prescription(appointment_id, request)
        .await?;
    Ok(Json(json!(prescription)))
}

pub async fn get_prescriptions(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows = RecordsService::new(state)
        .get_prescriptions(appointment_id)
        .await;
    Ok(Json(json!(rows)))
}

pub async fn attach_lab_prescription(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AttachLabPrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let lab = RecordsService::new(state)
        .attach_lab_prescription(appointment_id, request)
        .await?;
    Ok(Json(json!(lab)))
}

pub async fn get_lab_prescriptions(
    State(state): State<Arc<SchedulingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows = RecordsService::new(state)
        .get_lab_prescriptions(appointment_id)
        .await;
    Ok(Json(json!(rows)))
}
