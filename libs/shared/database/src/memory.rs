use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use shared_models::doctor::{DoctorProfile, Review};
use shared_models::reservation::{Reservation, ReservationStatus};
use shared_models::slot::{SlotDate, SlotTime};

use crate::store::{DoctorStore, ReservationStore, StoreError, StoreResult};

/// Process-local store. Each doctor profile sits behind its own mutex so
/// booked-slot updates for one doctor are serialized without blocking others.
#[derive(Default)]
pub struct InMemoryStore {
    doctors: RwLock<HashMap<Uuid, Arc<Mutex<DoctorProfile>>>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn doctor_entry(&self, doctor_id: Uuid) -> StoreResult<Arc<Mutex<DoctorProfile>>> {
        self.doctors
            .read()
            .await
            .get(&doctor_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Doctor {}", doctor_id)))
    }
}

#[async_trait]
impl DoctorStore for InMemoryStore {
    async fn list_doctors(&self) -> StoreResult<Vec<DoctorProfile>> {
        let entries: Vec<_> = self.doctors.read().await.values().cloned().collect();

        let mut doctors = Vec::with_capacity(entries.len());
        for entry in entries {
            doctors.push(entry.lock().await.clone());
        }
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<DoctorProfile> {
        let entry = self.doctor_entry(doctor_id).await?;
        let doctor = entry.lock().await.clone();
        Ok(doctor)
    }

    async fn insert_doctor(&self, doctor: DoctorProfile) -> StoreResult<DoctorProfile> {
        let mut doctors = self.doctors.write().await;
        if doctors.contains_key(&doctor.id) {
            return Err(StoreError::Duplicate(format!("Doctor {}", doctor.id)));
        }
        doctors.insert(doctor.id, Arc::new(Mutex::new(doctor.clone())));
        debug!("Stored doctor {}", doctor.id);
        Ok(doctor)
    }

    async fn set_available(&self, doctor_id: Uuid, available: bool) -> StoreResult<DoctorProfile> {
        let entry = self.doctor_entry(doctor_id).await?;
        let mut doctor = entry.lock().await;
        doctor.available = available;
        Ok(doctor.clone())
    }

    async fn add_review(&self, doctor_id: Uuid, review: Review) -> StoreResult<DoctorProfile> {
        let entry = self.doctor_entry(doctor_id).await?;
        let mut doctor = entry.lock().await;
        doctor.reviews.push(review);
        Ok(doctor.clone())
    }

    async fn book_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<()> {
        let entry = self.doctor_entry(doctor_id).await?;
        let mut doctor = entry.lock().await;
        if !doctor.slots_booked.insert(date, time) {
            return Err(StoreError::SlotTaken { date, time });
        }
        Ok(())
    }

    async fn release_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<bool> {
        let entry = self.doctor_entry(doctor_id).await?;
        let mut doctor = entry.lock().await;
        Ok(doctor.slots_booked.remove(date, time))
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        if reservations.contains_key(&reservation.id) {
            return Err(StoreError::Duplicate(format!("Reservation {}", reservation.id)));
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation> {
        self.reservations
            .read()
            .await
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Reservation {}", reservation_id)))
    }

    async fn list_reservations_for_user(&self, user_id: &str) -> StoreResult<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|reservation| reservation.is_owned_by(user_id))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn transition_reservation(
        &self,
        reservation_id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| StoreError::NotFound(format!("Reservation {}", reservation_id)))?;

        if !expected.contains(&reservation.status) {
            return Err(StoreError::StatusMismatch { current: reservation.status });
        }

        reservation.status = next;
        reservation.updated_at = Utc::now();
        Ok(reservation.clone())
    }
}
