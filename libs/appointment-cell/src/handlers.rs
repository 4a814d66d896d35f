use axum::{
    extract::{Extension, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{ValidJson, ValidPath};
use shared_utils::state::AppState;

use crate::models::{BookAppointmentRequest, BookingRequest, ReservationSummary};
use crate::services::{BookingGuard, PlainTextReceiptFormatter};

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);
    let patient_name = user.display_name();

    let reservation = guard
        .reserve(BookingRequest::new(request, user.id.clone(), patient_name))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Booked",
        "appointment": ReservationSummary::from(reservation)
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);

    let appointments: Vec<ReservationSummary> = guard
        .list_for_user(&user)
        .await?
        .into_iter()
        .map(ReservationSummary::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);
    let reservation = guard.get(appointment_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": ReservationSummary::from(reservation)
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);
    let reservation = guard.cancel(appointment_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Cancelled",
        "appointment": ReservationSummary::from(reservation)
    })))
}

#[axum::debug_handler]
pub async fn pay_appointment(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);
    let reservation = guard.pay(appointment_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment Successful",
        "appointment": ReservationSummary::from(reservation)
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let guard = BookingGuard::new(&state);
    let reservation = guard.complete(appointment_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment Completed",
        "appointment": ReservationSummary::from(reservation)
    })))
}

#[axum::debug_handler]
pub async fn download_receipt(
    State(state): State<AppState>,
    ValidPath(appointment_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Response, AppError> {
    let guard = BookingGuard::new(&state);
    let receipt = guard
        .receipt(appointment_id, &user, &PlainTextReceiptFormatter)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, receipt.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", receipt.filename),
        ),
    ];
    Ok((headers, receipt.body).into_response())
}
