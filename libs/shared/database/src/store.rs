use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::doctor::{DoctorProfile, Review};
use shared_models::reservation::{Reservation, ReservationStatus};
use shared_models::slot::{SlotDate, SlotTime};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Slot {time} on {date} is already booked")]
    SlotTaken { date: SlotDate, time: SlotTime },

    #[error("Reservation is already {current}")]
    StatusMismatch { current: ReservationStatus },

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Doctor profiles, including the booked-slots map that decides availability.
///
/// `book_slot` and `release_slot` are the only writers of the booked-slots
/// map and must be atomic per doctor: two concurrent `book_slot` calls for the
/// same label cannot both succeed.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn list_doctors(&self) -> StoreResult<Vec<DoctorProfile>>;

    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<DoctorProfile>;

    async fn insert_doctor(&self, doctor: DoctorProfile) -> StoreResult<DoctorProfile>;

    async fn set_available(&self, doctor_id: Uuid, available: bool) -> StoreResult<DoctorProfile>;

    async fn add_review(&self, doctor_id: Uuid, review: Review) -> StoreResult<DoctorProfile>;

    /// Adds `time` to the doctor's booked set for `date` if absent,
    /// otherwise fails with [`StoreError::SlotTaken`].
    async fn book_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<()>;

    /// Removes `time` from the booked set; returns whether it was present.
    async fn release_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation>;

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation>;

    /// Reservations of one user, newest first.
    async fn list_reservations_for_user(&self, user_id: &str) -> StoreResult<Vec<Reservation>>;

    /// Moves the reservation to `next` only if its current status is one of
    /// `expected`; otherwise fails with [`StoreError::StatusMismatch`].
    async fn transition_reservation(
        &self,
        reservation_id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
    ) -> StoreResult<Reservation>;
}
