use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::DoctorStore;
use shared_models::auth::User;
use shared_models::doctor::{BookedSlots, DoctorProfile, Review};
use shared_models::slot::WorkingWindow;
use shared_utils::state::AppState;

use crate::models::{AddReviewRequest, CreateDoctorRequest, DaySlots, DoctorError};
use crate::services::slots::generate_slots;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self::with_store(state.db.doctors.clone())
    }

    pub fn with_store(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        Ok(self.store.list_doctors().await?)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);
        Ok(self.store.get_doctor(doctor_id).await?)
    }

    /// Creates a doctor with an empty booked-slots map. `default_window`
    /// applies when the request does not carry its own.
    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        default_window: WorkingWindow,
    ) -> Result<DoctorProfile, DoctorError> {
        if request.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        if !request.email.contains('@') {
            return Err(DoctorError::ValidationError("Please enter a valid email".to_string()));
        }
        if !request.fees.is_finite() || request.fees < 0.0 {
            return Err(DoctorError::ValidationError("Fees must be a non-negative amount".to_string()));
        }

        let doctor = DoctorProfile {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            speciality: request.speciality,
            degree: request.degree,
            experience: request.experience,
            about: request.about,
            fees: request.fees,
            image: request.image,
            address: request.address,
            available: request.available.unwrap_or(true),
            working_window: request.working_window.unwrap_or(default_window),
            slots_booked: BookedSlots::new(),
            reviews: Vec::new(),
            created_at: Utc::now(),
        };

        let doctor = self.store.insert_doctor(doctor).await?;
        info!("Doctor {} created", doctor.id);
        Ok(doctor)
    }

    pub async fn set_availability(&self, doctor_id: Uuid, available: bool) -> Result<DoctorProfile, DoctorError> {
        let doctor = self.store.set_available(doctor_id, available).await?;
        info!("Doctor {} availability set to {}", doctor_id, available);
        Ok(doctor)
    }

    pub async fn add_review(
        &self,
        doctor_id: Uuid,
        user: &User,
        request: AddReviewRequest,
    ) -> Result<DoctorProfile, DoctorError> {
        if !(1..=5).contains(&request.rating) {
            return Err(DoctorError::ValidationError("Rating must be between 1 and 5".to_string()));
        }
        let comment = request.comment.trim();
        if comment.is_empty() {
            return Err(DoctorError::ValidationError("Please provide a rating and comment".to_string()));
        }

        let user_name = request
            .user_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string());

        let review = Review {
            user_id: user.id.clone(),
            user_name,
            user_image: request.user_image.filter(|image| !image.is_empty()),
            rating: request.rating,
            comment: comment.to_string(),
            date: Utc::now(),
        };

        let doctor = self.store.add_review(doctor_id, review).await?;
        info!("Review added for doctor {} by {}", doctor_id, user.id);
        Ok(doctor)
    }

    /// Loads the doctor and generates the bookable slots as of `reference`.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        reference: NaiveDateTime,
    ) -> Result<Vec<DaySlots>, DoctorError> {
        let doctor = self.store.get_doctor(doctor_id).await?;
        let days = generate_slots(&doctor, reference);
        debug!(
            "Generated {} open slots for doctor {} from {}",
            days.iter().map(|day| day.slots.len()).sum::<usize>(),
            doctor_id,
            reference
        );
        Ok(days)
    }
}
