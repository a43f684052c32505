// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/slots", get(handlers::resolve_slots))
        .route("/search", get(handlers::search_appointments))
        .route("/conflicts/check", get(handlers::check_conflicts))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/transition",
            post(handlers::transition_appointment),
        )
        .route(
            "/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/{appointment_id}/reschedule",
            post(handlers::reschedule_appointment),
        )
        .route(
            "/{appointment_id}/consultation-record",
            post(handlers::attach_consultation_record).get(handlers::get_consultation_record),
        )
        .route(
            "/{appointment_id}/prescriptions",
            post(handlers::attach_prescription).get(handlers::get_prescriptions),
        )
        .route(
            "/{appointment_id}/lab-prescriptions",
            post(handlers::attach_lab_prescription).get(handlers::get_lab_prescriptions),
        )
        .with_state(state)
}
