use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::doctor::{Address, DoctorProfile};
use shared_models::error::AppError;
use shared_models::slot::{SlotDate, SlotTime, WorkingWindow};

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub date: SlotDate,
    pub time: SlotTime,
    pub datetime: NaiveDateTime,
}

/// Bookable slots of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: SlotDate,
    /// `SUN` .. `SAT`
    pub weekday: String,
    pub slots: Vec<AvailableSlot>,
}

// ==============================================================================
// DIRECTORY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub average_rating: f64,
}

impl From<DoctorProfile> for DoctorSummary {
    fn from(profile: DoctorProfile) -> Self {
        let average_rating = profile.average_rating();
        Self { profile, average_rating }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    #[serde(default)]
    pub about: String,
    pub fees: f64,
    pub image: Option<String>,
    pub address: Option<Address>,
    pub available: Option<bool>,
    pub working_window: Option<WorkingWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddReviewRequest {
    pub rating: u8,
    pub comment: String,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotsQuery {
    /// Clinic-local reference time; defaults to now.
    pub at: Option<NaiveDateTime>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Doctor already exists")]
    AlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => DoctorError::NotFound,
            StoreError::Duplicate(_) => DoctorError::AlreadyExists,
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::AlreadyExists => AppError::Conflict("Doctor already exists".to_string()),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
