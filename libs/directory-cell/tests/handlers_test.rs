// libs/directory-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use directory_cell::router::directory_routes;
use directory_cell::DirectoryState;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

fn app() -> Router {
    directory_routes(Arc::new(DirectoryState::new()))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_doctor(app: &Router) -> Uuid {
    let response = app
        .clone()
        .oneshot(post(
            "/doctors",
            json!({"full_name": "Dr. Jane Smith", "specialty": "Cardiology"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

// ==============================================================================
// ENDPOINT TESTS
// ==============================================================================

#[tokio::test]
async fn doctor_registration_round_trips() {
    let app = app();
    let doctor_id = register_doctor(&app).await;

    let response = app
        .oneshot(get(&format!("/doctors/{}", doctor_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["full_name"], "Dr. Jane Smith");
    assert_eq!(body["specialty"], "Cardiology");
}

#[tokio::test]
async fn unknown_doctor_returns_404() {
    let response = app()
        .oneshot(get(&format!("/doctors/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_doctor_name_returns_400() {
    let response = app()
        .oneshot(post(
            "/doctors",
            json!({"full_name": "   ", "specialty": "Cardiology"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn overlapping_availability_returns_409() {
    let app = app();
    let doctor_id = register_doctor(&app).await;
    let uri = format!("/doctors/{}/availability", doctor_id);
    let window = json!({"day_of_week": 1, "start_time": "09:00:00", "end_time": "12:00:00"});

    let response = app.clone().oneshot(post(&uri, window.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post(
            &uri,
            json!({"day_of_week": 1, "start_time": "11:00:00", "end_time": "13:00:00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.oneshot(get(&uri)).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn policy_upsert_replaces_existing_entry() {
    let app = app();
    let doctor_id = register_doctor(&app).await;
    let uri = format!("/doctors/{}/policies", doctor_id);

    let response = app
        .clone()
        .oneshot(post(
            &uri,
            json!({"consultation_type": "video", "fee": 50.0, "session_duration_minutes": 30}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response).await;

    let response = app
        .oneshot(post(
            &uri,
            json!({"consultation_type": "video", "fee": 75.0, "session_duration_minutes": 45}),
        ))
        .await
        .unwrap();
    let second = json_body(response).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["fee"], 75.0);
    assert_eq!(second["session_duration_minutes"], 45);
}

#[tokio::test]
async fn patient_registration_round_trips() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post("/patients", json!({"full_name": "John Doe"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patient_id = json_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(get(&format!("/patients/{}", patient_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
