use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::router::doctor_routes;
use shared_models::doctor::{BookedSlots, DoctorProfile};
use shared_models::slot::WorkingWindow;
use shared_utils::state::AppState;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn sample_doctor(name: &str) -> DoctorProfile {
    DoctorProfile {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@prescripto.dev", name.to_lowercase().replace(' ', ".")),
        speciality: "General physician".to_string(),
        degree: "MBBS".to_string(),
        experience: "4 Years".to_string(),
        about: "Focuses on preventive care.".to_string(),
        fees: 50.0,
        image: None,
        address: None,
        available: true,
        working_window: WorkingWindow::default(),
        slots_booked: BookedSlots::new(),
        reviews: vec![],
        created_at: Utc::now(),
    }
}

async fn setup() -> (AppState, Router, DoctorProfile) {
    let state = TestConfig::default().to_state();
    let doctor = state
        .db
        .doctors
        .insert_doctor(sample_doctor("Dr Richard James"))
        .await
        .unwrap();
    let app = doctor_routes(state.clone());
    (state, app, doctor)
}

fn token_for(user: &TestUser) -> String {
    JwtTestUtils::create_test_token(user, &TestConfig::default().jwt_secret, Some(1))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", JwtTestUtils::bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_list_doctors_public() {
    let (_, app, doctor) = setup().await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["doctors"].as_array().unwrap().len(), 1);
    assert_eq!(body["doctors"][0]["id"], doctor.id.to_string());
    assert_eq!(body["doctors"][0]["average_rating"], 0.0);
}

#[tokio::test]
async fn test_get_unknown_doctor_is_not_found() {
    let (_, app, _) = setup().await;

    let request = Request::builder()
        .uri(format!("/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_slots_for_reference_time() {
    let (state, app, doctor) = setup().await;
    state
        .db
        .doctors
        .book_slot(doctor.id, "5_6_2024".parse().unwrap(), "11:30 AM".parse().unwrap())
        .await
        .unwrap();

    let request = Request::builder()
        .uri(format!("/{}/slots?at=2024-06-05T10:15:00", doctor.id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], "5_6_2024");

    let first_day: Vec<&str> = days[0]["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["time"].as_str().unwrap())
        .collect();
    assert_eq!(first_day.first(), Some(&"11:00 AM"));
    assert!(!first_day.contains(&"11:30 AM"));
    assert_eq!(days[1]["slots"].as_array().unwrap().len(), 22);
}

#[tokio::test]
async fn test_create_doctor_requires_admin() {
    let (_, app, _) = setup().await;
    let payload = json!({
        "name": "Dr Emily Larson",
        "email": "emily@prescripto.dev",
        "speciality": "Gynecologist",
        "degree": "MBBS",
        "experience": "3 Years",
        "fees": 60.0
    });

    let (status, _) = send(app.clone(), json_request("POST", "/", None, payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let patient = token_for(&TestUser::patient("patient@example.com"));
    let (status, _) = send(app.clone(), json_request("POST", "/", Some(&patient), payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_for(&TestUser::admin("admin@example.com"));
    let (status, body) = send(app.clone(), json_request("POST", "/", Some(&admin), payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctor"]["available"], true);
    assert_eq!(body["doctor"]["working_window"]["start"], "10:00 AM");

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (_, body) = send(app, request).await;
    assert_eq!(body["doctors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_doctor_validates_email() {
    let (_, app, _) = setup().await;
    let admin = token_for(&TestUser::admin("admin@example.com"));
    let payload = json!({
        "name": "Dr Emily Larson",
        "email": "not-an-email",
        "speciality": "Gynecologist",
        "degree": "MBBS",
        "experience": "3 Years",
        "fees": 60.0
    });

    let (status, body) = send(app, json_request("POST", "/", Some(&admin), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_availability() {
    let (state, app, doctor) = setup().await;
    let admin = token_for(&TestUser::admin("admin@example.com"));

    let uri = format!("/{}/availability", doctor.id);
    let (status, body) = send(
        app,
        json_request("PATCH", &uri, Some(&admin), json!({ "available": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert!(!state.db.doctors.get_doctor(doctor.id).await.unwrap().available);
}

#[tokio::test]
async fn test_add_review_updates_average() {
    let (_, app, doctor) = setup().await;
    let patient = token_for(&TestUser::patient("patient@example.com"));
    let uri = format!("/{}/reviews", doctor.id);

    let (status, _) = send(
        app.clone(),
        json_request("POST", &uri, Some(&patient), json!({ "rating": 5, "comment": "Very thorough" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        json_request(
            "POST",
            &uri,
            Some(&patient),
            json!({ "rating": 4, "comment": "Kind", "user_name": "Ana" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_rating"], 4.5);
    assert_eq!(body["reviews"][0]["user_name"], "Anonymous");
    assert_eq!(body["reviews"][1]["user_name"], "Ana");
}

#[tokio::test]
async fn test_add_review_rejects_out_of_range_rating() {
    let (_, app, doctor) = setup().await;
    let patient = token_for(&TestUser::patient("patient@example.com"));

    let (status, _) = send(
        app,
        json_request(
            "POST",
            &format!("/{}/reviews", doctor.id),
            Some(&patient),
            json!({ "rating": 6, "comment": "Too good" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_with_invalid_token_is_forbidden() {
    let (_, app, doctor) = setup().await;
    let token = JwtTestUtils::create_invalid_signature_token(&TestUser::default());

    let (status, body) = send(
        app,
        json_request(
            "POST",
            &format!("/{}/reviews", doctor.id),
            Some(&token),
            json!({ "rating": 3, "comment": "Ok" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_out_of_range_rating_body_is_validation_error() {
    let (_, app, doctor) = setup().await;
    let patient = token_for(&TestUser::patient("patient@example.com"));

    let (status, body) = send(
        app,
        json_request(
            "POST",
            &format!("/{}/reviews", doctor.id),
            Some(&patient),
            json!({ "rating": 300, "comment": "Great" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_doctor_id_and_query_are_validation_errors() {
    let (_, app, doctor) = setup().await;

    let request = Request::builder().uri("/not-a-uuid/slots").body(Body::empty()).unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let request = Request::builder()
        .uri(format!("/{}/slots?at=yesterday", doctor.id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
