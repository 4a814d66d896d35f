use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{ValidJson, ValidPath, ValidQuery};
use shared_utils::state::AppState;

use crate::models::{
    AddReviewRequest, CreateDoctorRequest, DoctorSummary, SlotsQuery, UpdateAvailabilityRequest,
};
use crate::services::DoctorService;

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors: Vec<DoctorSummary> = doctor_service
        .list_doctors()
        .await?
        .into_iter()
        .map(DoctorSummary::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": doctors.len(),
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = DoctorSummary::from(doctor_service.get_doctor(doctor_id).await?);

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let reference = query.at.unwrap_or_else(|| state.clinic_now());

    let days = doctor_service.available_slots(doctor_id, reference).await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "reference": reference,
        "days": days
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Only administrators can create doctor profiles".to_string()));
    }

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service
        .create_doctor(request, state.default_working_window())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor Added",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Only administrators can change availability".to_string()));
    }

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.set_availability(doctor_id, request.available).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability Changed",
        "available": doctor.available
    })))
}

#[axum::debug_handler]
pub async fn add_review(
    State(state): State<AppState>,
    ValidPath(doctor_id): ValidPath<Uuid>,
    Extension(user): Extension<User>,
    ValidJson(request): ValidJson<AddReviewRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.add_review(doctor_id, &user, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review added successfully",
        "average_rating": doctor.average_rating(),
        "reviews": doctor.reviews
    })))
}
