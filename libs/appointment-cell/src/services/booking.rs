use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{DoctorStore, ReservationStore};
use shared_models::auth::User;
use shared_models::reservation::{Reservation, ReservationStatus};
use shared_models::slot::{SlotDate, SlotTime};
use shared_utils::state::AppState;

use crate::models::{BookingError, BookingRequest};
use crate::services::lifecycle::{sources_of, validate_transition};
use crate::services::receipt::{issue_receipt, Receipt, ReceiptFormatter};

/// Owns every change to a doctor's booked slots and to reservation status.
pub struct BookingGuard {
    doctors: Arc<dyn DoctorStore>,
    reservations: Arc<dyn ReservationStore>,
}

impl BookingGuard {
    pub fn new(state: &AppState) -> Self {
        Self::with_stores(state.db.doctors.clone(), state.db.reservations.clone())
    }

    pub fn with_stores(doctors: Arc<dyn DoctorStore>, reservations: Arc<dyn ReservationStore>) -> Self {
        Self { doctors, reservations }
    }

    /// Books the requested slot and records a `pending_payment` reservation.
    ///
    /// The slot is claimed through the store's compare-and-swap, so of two
    /// concurrent attempts on one slot exactly one succeeds and the other gets
    /// [`BookingError::Conflict`].
    pub async fn reserve(&self, request: BookingRequest) -> Result<Reservation, BookingError> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(BookingError::Validation("Missing user id".to_string()));
        }
        let slot_date: SlotDate = request
            .slot_date
            .parse()
            .map_err(|e| BookingError::Validation(format!("{}", e)))?;
        let slot_time: SlotTime = request
            .slot_time
            .parse()
            .map_err(|e| BookingError::Validation(format!("{}", e)))?;

        debug!(
            "Reserve request for doctor {} on {} at {} by {}",
            request.doctor_id, slot_date, slot_time, user_id
        );

        let doctor = self.doctors.get_doctor(request.doctor_id).await?;
        if !doctor.available {
            return Err(BookingError::Validation("Doctor not available".to_string()));
        }
        if !doctor.working_window.admits(slot_time) {
            return Err(BookingError::Validation(format!(
                "{} is not a bookable slot between {} and {}",
                slot_time,
                doctor.working_window.start(),
                doctor.working_window.end()
            )));
        }
        if doctor.slots_booked.is_booked(slot_date, slot_time) {
            warn!("Slot {} {} of doctor {} is already booked", slot_date, slot_time, doctor.id);
            return Err(BookingError::Conflict("Slot not available".to_string()));
        }

        if let Err(err) = self.doctors.book_slot(doctor.id, slot_date, slot_time).await {
            warn!("Booking {} {} for doctor {} rejected: {}", slot_date, slot_time, doctor.id, err);
            return Err(err.into());
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            user_id: user_id.to_string(),
            slot_date,
            slot_time,
            status: ReservationStatus::PendingPayment,
            doctor_name: doctor.name.clone(),
            patient_name: request.patient_name,
            amount: doctor.fees,
            created_at: now,
            updated_at: now,
        };

        match self.reservations.insert_reservation(reservation).await {
            Ok(reservation) => {
                info!(
                    "Appointment {} booked with doctor {} on {} at {}",
                    reservation.id, doctor.id, slot_date, slot_time
                );
                Ok(reservation)
            }
            Err(err) => {
                warn!("Failed to save appointment, releasing slot {} {}: {}", slot_date, slot_time, err);
                if let Err(release_err) = self.doctors.release_slot(doctor.id, slot_date, slot_time).await {
                    error!(
                        "Slot {} {} of doctor {} could not be released: {}",
                        slot_date, slot_time, doctor.id, release_err
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Cancels a pending or paid reservation and frees its slot. Owner or admin only.
    ///
    /// A slot release failure after the status change is logged and the
    /// cancelled reservation is still returned.
    pub async fn cancel(&self, reservation_id: Uuid, user: &User) -> Result<Reservation, BookingError> {
        let reservation = self.reservations.get_reservation(reservation_id).await?;
        if !reservation.is_owned_by(&user.id) && !user.is_admin() {
            return Err(BookingError::Forbidden("Unauthorized action".to_string()));
        }

        let cancelled = self.transition(&reservation, ReservationStatus::Cancelled).await?;

        match self
            .doctors
            .release_slot(cancelled.doctor_id, cancelled.slot_date, cancelled.slot_time)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Slot {} {} of doctor {} was not booked when cancelling {}",
                cancelled.slot_date, cancelled.slot_time, cancelled.doctor_id, cancelled.id
            ),
            Err(err) => error!(
                "Slot {} {} of doctor {} still booked after cancelling {}: {}",
                cancelled.slot_date, cancelled.slot_time, cancelled.doctor_id, cancelled.id, err
            ),
        }

        info!("Appointment {} cancelled by {}", cancelled.id, user.id);
        Ok(cancelled)
    }

    /// Simulated payment. Owner only.
    pub async fn pay(&self, reservation_id: Uuid, user: &User) -> Result<Reservation, BookingError> {
        let reservation = self.reservations.get_reservation(reservation_id).await?;
        if !reservation.is_owned_by(&user.id) {
            return Err(BookingError::Forbidden("Unauthorized action".to_string()));
        }

        let paid = self.transition(&reservation, ReservationStatus::Paid).await?;
        info!("Appointment {} paid ({:.2})", paid.id, paid.amount);
        Ok(paid)
    }

    /// Marks a paid reservation completed. Doctor or admin only.
    pub async fn complete(&self, reservation_id: Uuid, user: &User) -> Result<Reservation, BookingError> {
        if !user.is_doctor() && !user.is_admin() {
            return Err(BookingError::Forbidden(
                "Only doctors or administrators can complete appointments".to_string(),
            ));
        }

        let reservation = self.reservations.get_reservation(reservation_id).await?;
        let completed = self.transition(&reservation, ReservationStatus::Completed).await?;
        info!("Appointment {} completed by {}", completed.id, user.id);
        Ok(completed)
    }

    /// One reservation, visible to its owner, admins and doctors.
    pub async fn get(&self, reservation_id: Uuid, user: &User) -> Result<Reservation, BookingError> {
        let reservation = self.reservations.get_reservation(reservation_id).await?;
        if !reservation.is_owned_by(&user.id) && !user.is_admin() && !user.is_doctor() {
            return Err(BookingError::Forbidden("Unauthorized action".to_string()));
        }
        Ok(reservation)
    }

    pub async fn list_for_user(&self, user: &User) -> Result<Vec<Reservation>, BookingError> {
        Ok(self.reservations.list_reservations_for_user(&user.id).await?)
    }

    pub async fn receipt(
        &self,
        reservation_id: Uuid,
        user: &User,
        formatter: &dyn ReceiptFormatter,
    ) -> Result<Receipt, BookingError> {
        let reservation = self.reservations.get_reservation(reservation_id).await?;
        issue_receipt(&reservation, user, formatter)
    }

    async fn transition(
        &self,
        reservation: &Reservation,
        next: ReservationStatus,
    ) -> Result<Reservation, BookingError> {
        validate_transition(reservation.status, next)?;
        let updated = self
            .reservations
            .transition_reservation(reservation.id, &sources_of(next), next)
            .await?;
        Ok(updated)
    }
}
