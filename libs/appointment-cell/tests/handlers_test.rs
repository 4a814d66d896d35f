use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use shared_database::Database;
use shared_models::doctor::{BookedSlots, DoctorProfile};
use shared_models::slot::WorkingWindow;
use shared_utils::state::AppState;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn setup() -> (AppState, Router, DoctorProfile) {
    let state = TestConfig::default().to_state_with(Database::in_memory());
    let doctor = state
        .db
        .doctors
        .insert_doctor(DoctorProfile {
            id: Uuid::new_v4(),
            name: "Dr Christopher Lee".to_string(),
            email: "christopher@prescripto.dev".to_string(),
            speciality: "Pediatricians".to_string(),
            degree: "MBBS".to_string(),
            experience: "2 Years".to_string(),
            about: String::new(),
            fees: 40.0,
            image: None,
            address: None,
            available: true,
            working_window: WorkingWindow::default(),
            slots_booked: BookedSlots::new(),
            reviews: vec![],
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let app = appointment_routes(state.clone());
    (state, app, doctor)
}

fn token_for(user: &TestUser) -> String {
    JwtTestUtils::create_test_token(user, &TestConfig::default().jwt_secret, Some(1))
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, JwtTestUtils::bearer(token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn book(app: &Router, token: &str, doctor_id: Uuid, time: &str) -> (StatusCode, Value) {
    send(
        app,
        request(
            "POST",
            "/",
            token,
            Some(json!({ "doctor_id": doctor_id, "slot_date": "5_6_2024", "slot_time": time })),
        ),
    )
    .await
}

#[tokio::test]
async fn test_requires_authentication() {
    let (_, app, _) = setup().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let expired = JwtTestUtils::create_expired_token(&TestUser::default(), &TestConfig::default().jwt_secret);
    let (status, body) = send(&app, request("GET", "/", &expired, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_book_and_list() {
    let (_, app, doctor) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));

    let (status, body) = book(&app, &token, doctor.id, "10:00 AM").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Appointment Booked");
    assert_eq!(body["appointment"]["status"], "pending_payment");
    assert_eq!(body["appointment"]["patient_name"], "ana");
    assert_eq!(body["appointment"]["payment"], false);
    assert_eq!(body["appointment"]["cancelled"], false);

    let (status, body) = book(&app, &token, doctor.id, "11:30 AM").await;
    assert_eq!(status, StatusCode::OK);
    let newest = body["appointment"]["id"].clone();

    let (status, body) = send(&app, request("GET", "/", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointments"].as_array().unwrap().len(), 2);
    assert_eq!(body["appointments"][0]["id"], newest);

    let other = token_for(&TestUser::patient("bo@example.com"));
    let (_, body) = send(&app, request("GET", "/", &other, None)).await;
    assert!(body["appointments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_double_booking_returns_conflict() {
    let (_, app, doctor) = setup().await;
    let first = token_for(&TestUser::patient("ana@example.com"));
    let second = token_for(&TestUser::patient("bo@example.com"));

    let (status, _) = book(&app, &first, doctor.id, "10:00 AM").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = book(&app, &second, doctor.id, "10:00 AM").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Slot not available");
}

#[tokio::test]
async fn test_invalid_slot_is_bad_request() {
    let (_, app, doctor) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));

    let (status, _) = book(&app, &token, doctor.id, "10:10 AM").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, &token, Uuid::new_v4(), "10:00 AM").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pay_complete_and_receipt() {
    let (_, app, doctor) = setup().await;
    let patient = TestUser::patient("ana@example.com");
    let token = token_for(&patient);
    let doctor_token = token_for(&TestUser::doctor("lee@example.com"));

    let (_, body) = book(&app, &token, doctor.id, "02:00 PM").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, request("GET", &format!("/{}/receipt", id), &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, request("POST", &format!("/{}/pay", id), &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["payment"], true);

    let (status, _) = send(&app, request("POST", &format!("/{}/complete", id), &token, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", &format!("/{}/complete", id), &doctor_token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["is_completed"], true);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/{}/receipt", id), &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"appointment-receipt-{}.txt\"", id).as_str()
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("5 Jun 2024"));
    assert!(text.contains("02:00 PM"));
    assert!(text.contains("Thank you for booking your appointment with us!"));

    let (status, _) = send(&app, request("GET", &format!("/{}/receipt", id), &doctor_token, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_frees_slot_and_blocks_further_changes() {
    let (state, app, doctor) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));
    let stranger = token_for(&TestUser::patient("bo@example.com"));

    let (_, body) = book(&app, &token, doctor.id, "10:00 AM").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, request("POST", &format!("/{}/cancel", id), &stranger, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, request("GET", &format!("/{}", id), &stranger, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request("POST", &format!("/{}/cancel", id), &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["cancelled"], true);

    let stored = state.db.doctors.get_doctor(doctor.id).await.unwrap();
    assert!(stored.slots_booked.is_empty());

    let (status, body) = send(&app, request("POST", &format!("/{}/cancel", id), &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Appointment is already cancelled");

    let (status, _) = send(&app, request("POST", &format!("/{}/pay", id), &token, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, &stranger, doctor.id, "10:00 AM").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_slot_time_is_validation_error() {
    let (state, app, doctor) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/",
            &token,
            Some(json!({ "doctor_id": doctor.id, "slot_date": "5_6_2024" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("slot_time"));
    assert!(state.db.doctors.get_doctor(doctor.id).await.unwrap().slots_booked.is_empty());
}

#[tokio::test]
async fn test_malformed_doctor_id_is_validation_error() {
    let (_, app, _) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/",
            &token,
            Some(json!({ "doctor_id": "doc-1", "slot_date": "5_6_2024", "slot_time": "10:00 AM" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_appointment_id_is_validation_error() {
    let (_, app, _) = setup().await;
    let token = token_for(&TestUser::patient("ana@example.com"));

    for (method, uri) in [("POST", "/not-a-uuid/cancel"), ("GET", "/not-a-uuid"), ("GET", "/42/receipt")] {
        let (status, body) = send(&app, request(method, uri, &token, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(body["success"], false);
    }
}
