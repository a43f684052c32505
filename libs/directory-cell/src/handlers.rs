// libs/directory-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    CreateAvailabilityRequest, CreateOverrideRequest, DirectoryError, RegisterDoctorRequest,
    RegisterPatientRequest, UpsertPolicyRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::directory::DirectoryService;
use crate::DirectoryState;

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DoctorNotFound
            | DirectoryError::PatientNotFound
            | DirectoryError::AvailabilityNotFound => AppError::NotFound(err.to_string()),
            DirectoryError::OverlappingAvailability => AppError::Conflict(err.to_string()),
            DirectoryError::Validation(msg) => AppError::ValidationError(msg),
        }
    }
}

pub async fn register_doctor(
    State(state): State<Arc<DirectoryState>>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DirectoryService::new(state).register_doctor(request).await?;
    Ok(Json(json!(doctor)))
}

pub async fn register_patient(
    State(state): State<Arc<DirectoryState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = DirectoryService::new(state).register_patient(request).await?;
    Ok(Json(json!(patient)))
}

pub async fn get_doctor(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = DirectoryService::new(state).get_doctor(doctor_id).await?;
    Ok(Json(json!(doctor)))
}

pub async fn get_patient(
    State(state): State<Arc<DirectoryState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = DirectoryService::new(state).get_patient(patient_id).await?;
    Ok(Json(json!(patient)))
}

pub async fn upsert_policy(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpsertPolicyRequest>,
) -> Result<Json<Value>, AppError> {
    let policy = DirectoryService::new(state)
        .upsert_policy(doctor_id, request)
        .await?;
    Ok(Json(json!(policy)))
}

pub async fn create_availability(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let availability = AvailabilityService::new(state)
        .create_availability(doctor_id, request)
        .await?;
    Ok(Json(json!(availability)))
}

pub async fn get_doctor_availability(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows = AvailabilityService::new(state)
        .get_doctor_availability(doctor_id)
        .await?;
    Ok(Json(json!(rows)))
}

pub async fn delete_availability(
    State(state): State<Arc<DirectoryState>>,
    Path(availability_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = AvailabilityService::new(state)
        .delete_availability(availability_id)
        .await?;
    Ok(Json(json!(deleted)))
}

pub async fn create_override(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateOverrideRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = AvailabilityService::new(state)
        .create_override(doctor_id, request)
        .await?;
    Ok(Json(json!(entry)))
}

pub async fn get_overrides(
    State(state): State<Arc<DirectoryState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows = AvailabilityService::new(state).get_overrides(doctor_id).await?;
    Ok(Json(json!(rows)))
}
