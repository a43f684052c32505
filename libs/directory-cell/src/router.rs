// libs/directory-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::DirectoryState;

pub fn directory_routes(state: Arc<DirectoryState>) -> Router {
    Router::new()
        .route("/doctors", post(handlers::register_doctor))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/doctors/{doctor_id}/policies", post(handlers::upsert_policy))
        .route(
            "/doctors/{doctor_id}/availability",
            post(handlers::create_availability).get(handlers::get_doctor_availability),
        )
        .route(
            "/doctors/{doctor_id}/overrides",
            post(handlers::create_override).get(handlers::get_overrides),
        )
        .route(
            "/availability/{availability_id}",
            delete(handlers::delete_availability),
        )
        .route("/patients", post(handlers::register_patient))
        .route("/patients/{patient_id}", get(handlers::get_patient))
        .with_state(state)
}
