use tracing::{debug, warn};

use shared_models::reservation::ReservationStatus;

use crate::models::BookingError;

const ALL_STATUSES: [ReservationStatus; 4] = [
    ReservationStatus::PendingPayment,
    ReservationStatus::Paid,
    ReservationStatus::Completed,
    ReservationStatus::Cancelled,
];

/// Statuses reachable in one step from `status`.
pub fn valid_transitions(status: ReservationStatus) -> &'static [ReservationStatus] {
    match status {
        ReservationStatus::PendingPayment => &[ReservationStatus::Paid, ReservationStatus::Cancelled],
        ReservationStatus::Paid => &[ReservationStatus::Completed, ReservationStatus::Cancelled],
        // Terminal states - no transitions allowed
        ReservationStatus::Completed => &[],
        ReservationStatus::Cancelled => &[],
    }
}

pub fn validate_transition(from: ReservationStatus, to: ReservationStatus) -> Result<(), BookingError> {
    if valid_transitions(from).contains(&to) {
        debug!("Status transition validated: {} -> {}", from, to);
        return Ok(());
    }

    warn!("Invalid status transition attempted: {} -> {}", from, to);
    let message = if from.is_terminal() {
        format!("Appointment is already {}", from)
    } else {
        format!("Appointment cannot move from {} to {}", from, to)
    };
    Err(BookingError::Validation(message))
}

/// Statuses from which `to` may be entered; the expected set for a
/// conditional store update.
pub fn sources_of(to: ReservationStatus) -> Vec<ReservationStatus> {
    ALL_STATUSES
        .into_iter()
        .filter(|from| valid_transitions(*from).contains(&to))
        .collect()
}
