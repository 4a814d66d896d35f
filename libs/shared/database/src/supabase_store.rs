use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::doctor::{DoctorProfile, Review};
use shared_models::reservation::{Reservation, ReservationStatus};
use shared_models::slot::{SlotDate, SlotTime};

use crate::store::{DoctorStore, ReservationStore, StoreError, StoreResult};
use crate::supabase::SupabaseClient;

/// Store backed by the `doctors` and `appointments` tables.
///
/// Booked-slot updates go through the `book_doctor_slot` and
/// `release_doctor_slot` database functions, which lock the doctor row and
/// return `true`/`false` for applied/not applied, or `null` for an unknown
/// doctor.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::Backend(format!("Malformed row: {}", e)))
}

fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>, what: String) -> StoreResult<T> {
    match rows.into_iter().next() {
        Some(row) => decode(row),
        None => Err(StoreError::NotFound(what)),
    }
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn call_rpc(&self, function: &str, args: Value) -> StoreResult<Value> {
        let path = format!("/rest/v1/rpc/{}", function);
        self.supabase
            .request(Method::POST, &path, Some(args))
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl DoctorStore for SupabaseStore {
    async fn list_doctors(&self) -> StoreResult<Vec<DoctorProfile>> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=name.asc", None)
            .await
            .map_err(backend)?;

        rows.into_iter().map(decode).collect()
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> StoreResult<DoctorProfile> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(backend)?;

        first_row(rows, format!("Doctor {}", doctor_id))
    }

    async fn insert_doctor(&self, doctor: DoctorProfile) -> StoreResult<DoctorProfile> {
        let body = serde_json::to_value(&doctor)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend)?;

        match rows.into_iter().next() {
            Some(row) => decode(row),
            None => Err(StoreError::Backend("Failed to create doctor".to_string())),
        }
    }

    async fn set_available(&self, doctor_id: Uuid, available: bool) -> StoreResult<DoctorProfile> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "available": available })),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend)?;

        first_row(rows, format!("Doctor {}", doctor_id))
    }

    async fn add_review(&self, doctor_id: Uuid, review: Review) -> StoreResult<DoctorProfile> {
        let result = self
            .call_rpc(
                "add_doctor_review",
                json!({ "p_doctor_id": doctor_id, "p_review": review }),
            )
            .await?;

        if result.is_null() {
            return Err(StoreError::NotFound(format!("Doctor {}", doctor_id)));
        }
        decode(result)
    }

    async fn book_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<()> {
        debug!("Booking slot {} {} for doctor {}", date, time, doctor_id);

        let result = self
            .call_rpc(
                "book_doctor_slot",
                json!({
                    "p_doctor_id": doctor_id,
                    "p_slot_date": date,
                    "p_slot_time": time
                }),
            )
            .await?;

        match result {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => Err(StoreError::SlotTaken { date, time }),
            Value::Null => Err(StoreError::NotFound(format!("Doctor {}", doctor_id))),
            other => Err(StoreError::Backend(format!(
                "Unexpected book_doctor_slot result: {}",
                other
            ))),
        }
    }

    async fn release_slot(&self, doctor_id: Uuid, date: SlotDate, time: SlotTime) -> StoreResult<bool> {
        let result = self
            .call_rpc(
                "release_doctor_slot",
                json!({
                    "p_doctor_id": doctor_id,
                    "p_slot_date": date,
                    "p_slot_time": time
                }),
            )
            .await?;

        match result {
            Value::Bool(released) => Ok(released),
            Value::Null => Err(StoreError::NotFound(format!("Doctor {}", doctor_id))),
            other => Err(StoreError::Backend(format!(
                "Unexpected release_doctor_slot result: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl ReservationStore for SupabaseStore {
    async fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation> {
        let body = serde_json::to_value(&reservation)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend)?;

        match rows.into_iter().next() {
            Some(row) => decode(row),
            None => Err(StoreError::Backend("Failed to create appointment".to_string())),
        }
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation> {
        let path = format!("/rest/v1/appointments?id=eq.{}", reservation_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(backend)?;

        first_row(rows, format!("Reservation {}", reservation_id))
    }

    async fn list_reservations_for_user(&self, user_id: &str) -> StoreResult<Vec<Reservation>> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=created_at.desc",
            urlencoding::encode(user_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(backend)?;

        rows.into_iter().map(decode).collect()
    }

    async fn transition_reservation(
        &self,
        reservation_id: Uuid,
        expected: &[ReservationStatus],
        next: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let allowed = expected
            .iter()
            .map(ReservationStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=in.({})",
            reservation_id, allowed
        );

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "status": next,
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(backend)?;

        if let Some(row) = rows.into_iter().next() {
            return decode(row);
        }

        // Nothing matched: either the row is gone or its status moved on.
        let current = self.get_reservation(reservation_id).await?;
        warn!(
            "Reservation {} not in {:?}, currently {}",
            reservation_id, expected, current.status
        );
        Err(StoreError::StatusMismatch { current: current.status })
    }
}
