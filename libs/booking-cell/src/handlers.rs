// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::AppError;
use shared_utils::ids;

use crate::models::{BookAppointmentInput, BookAppointmentRequest};
use crate::ports::BookingStore;
use crate::services::BookingService;

/// POST /appointments/book
///
/// `appointment_id` and `payment_id` may be supplied by the caller for
/// idempotent retries; when absent they are minted here.
pub async fn book_appointment<S>(
    State(service): State<Arc<BookingService<S>>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError>
where
    S: BookingStore + 'static,
{
    debug!(slot_id = %request.slot_id, "booking request received");

    let input = BookAppointmentInput {
        appointment_id: request
            .appointment_id
            .unwrap_or_else(|| ids::new_id("apt")),
        payment_id: request.payment_id.unwrap_or_else(|| ids::new_id("pay")),
        slot_id: request.slot_id,
        doctor_id: request.doctor_id,
        patient_id: request.patient_id,
        price_cents: request.price_cents,
        payment_provider: request.payment_provider,
        external_ref: request.external_ref.unwrap_or_default(),
    };

    let confirmation = service.book(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment_id": confirmation.appointment_id,
            "payment_id": confirmation.payment_id,
            "status": confirmation.status
        })),
    ))
}
