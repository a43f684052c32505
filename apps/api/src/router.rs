use std::sync::Arc;

use axum::{routing::get, Router};

use directory_cell::router::directory_routes;
use directory_cell::DirectoryState;
use scheduling_cell::router::scheduling_routes;
use scheduling_cell::SchedulingState;

pub fn create_router(directory: Arc<DirectoryState>, scheduling: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Vivalta marketplace API is running!" }))
        .nest("/directory", directory_routes(directory))
        .nest("/appointments", scheduling_routes(scheduling))
}
