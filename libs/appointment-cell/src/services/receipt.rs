use std::fmt::Write as _;

use serde::Serialize;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::reservation::Reservation;

use crate::models::BookingError;

/// Fields printed on an appointment receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptData {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    /// e.g. `5 Jun 2024`
    pub appointment_date: String,
    pub appointment_time: String,
}

impl From<&Reservation> for ReceiptData {
    fn from(reservation: &Reservation) -> Self {
        Self {
            appointment_id: reservation.id,
            patient_name: reservation.patient_name.clone(),
            doctor_name: reservation.doctor_name.clone(),
            appointment_date: reservation.slot_date.human(),
            appointment_time: reservation.slot_time.to_string(),
        }
    }
}

pub trait ReceiptFormatter: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn render(&self, data: &ReceiptData) -> Result<Vec<u8>, BookingError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReceiptFormatter;

impl ReceiptFormatter for PlainTextReceiptFormatter {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, data: &ReceiptData) -> Result<Vec<u8>, BookingError> {
        let fields = [
            ("Appointment ID", data.appointment_id.to_string()),
            ("Patient Name", data.patient_name.clone()),
            ("Doctor Name", data.doctor_name.clone()),
            ("Date", data.appointment_date.clone()),
            ("Time", data.appointment_time.clone()),
        ];

        let mut out = String::from("Appointment Receipt\n");
        out.push_str(&"-".repeat(40));
        out.push('\n');
        for (label, value) in fields {
            writeln!(out, "{:<16}{}", format!("{}:", label), value)
                .map_err(|e| BookingError::Store(format!("Failed to render receipt: {}", e)))?;
        }
        out.push('\n');
        out.push_str("Thank you for booking your appointment with us!\n");

        Ok(out.into_bytes())
    }
}

/// A rendered receipt ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Renders the receipt for `reservation` if `user` owns it and it has been paid.
pub fn issue_receipt(
    reservation: &Reservation,
    user: &User,
    formatter: &dyn ReceiptFormatter,
) -> Result<Receipt, BookingError> {
    if !reservation.is_owned_by(&user.id) {
        return Err(BookingError::Forbidden("Unauthorized action".to_string()));
    }
    if !reservation.is_paid() {
        return Err(BookingError::Validation(
            "Receipt is only available for paid appointments".to_string(),
        ));
    }

    let body = formatter.render(&ReceiptData::from(reservation))?;
    Ok(Receipt {
        filename: format!("appointment-receipt-{}.{}", reservation.id, formatter.file_extension()),
        content_type: formatter.content_type(),
        body,
    })
}
