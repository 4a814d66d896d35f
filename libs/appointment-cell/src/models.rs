use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::reservation::Reservation;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Body of `POST /api/appointments`. Date and time stay raw strings so that
/// malformed values surface as validation errors from the booking guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
}

/// A booking attempt on behalf of an authenticated user.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub slot_date: String,
    pub slot_time: String,
    pub user_id: String,
    pub patient_name: String,
}

impl BookingRequest {
    pub fn new(request: BookAppointmentRequest, user_id: impl Into<String>, patient_name: impl Into<String>) -> Self {
        Self {
            doctor_id: request.doctor_id,
            slot_date: request.slot_date,
            slot_time: request.slot_time,
            user_id: user_id.into(),
            patient_name: patient_name.into(),
        }
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Reservation plus the boolean flags older clients read instead of `status`.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationSummary {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub cancelled: bool,
    pub payment: bool,
    pub is_completed: bool,
}

impl From<Reservation> for ReservationSummary {
    fn from(reservation: Reservation) -> Self {
        Self {
            cancelled: reservation.is_cancelled(),
            payment: reservation.is_paid(),
            is_completed: reservation.is_completed(),
            reservation,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => BookingError::NotFound(format!("{} not found", what)),
            StoreError::SlotTaken { .. } => BookingError::Conflict("Slot not available".to_string()),
            StoreError::StatusMismatch { current } => {
                BookingError::Validation(format!("Appointment is already {}", current))
            }
            StoreError::Duplicate(what) => BookingError::Conflict(format!("{} already exists", what)),
            StoreError::Backend(msg) => BookingError::Store(msg),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Conflict(msg) => AppError::Conflict(msg),
            BookingError::NotFound(msg) => AppError::NotFound(msg),
            BookingError::Forbidden(msg) => AppError::Forbidden(msg),
            BookingError::Store(msg) => AppError::Database(msg),
        }
    }
}
