// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{FixedOffset, Offset, Utc};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{
    GenerateSlotsInput, GenerateSlotsRequest, ListAvailableSlotsInput, ListSlotsQuery,
};
use crate::ports::SlotStore;
use crate::router::AvailabilityState;

const DEFAULT_LIST_LIMIT: usize = 50;

/// POST /doctors/{doctor_id}/slots/generate
pub async fn generate_slots<S>(
    State(state): State<Arc<AvailabilityState<S>>>,
    Path(doctor_id): Path<String>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<(StatusCode, Json<Value>), AppError>
where
    S: SlotStore + 'static,
{
    debug!("Generating slots for doctor: {}", doctor_id);

    let timezone = parse_timezone(request.timezone.as_deref())?;
    let output = state
        .generator
        .generate(GenerateSlotsInput {
            doctor_id,
            from: request.from,
            to: request.to,
            session_minutes: request.session_minutes,
            work_start_hour: request.work_start_hour,
            work_end_hour: request.work_end_hour,
            timezone,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "created": output.created
        })),
    ))
}

/// GET /doctors/{doctor_id}/slots?from=..&to=..&limit=..
pub async fn list_available_slots<S>(
    State(state): State<Arc<AvailabilityState<S>>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Value>, AppError>
where
    S: SlotStore + 'static,
{
    let output = state
        .listing
        .list(ListAvailableSlotsInput {
            doctor_id,
            from: query.from,
            to: query.to,
            limit: query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        })
        .await?;

    Ok(Json(json!({
        "doctor_id": output.doctor_id,
        "slots": output.slots
    })))
}

/// Accepts "UTC" (or empty) and fixed offsets like "+03:00" or "-04:30".
fn parse_timezone(raw: Option<&str>) -> Result<FixedOffset, AppError> {
    let raw = raw.unwrap_or("").trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    raw.parse::<FixedOffset>()
        .map_err(|_| AppError::BadRequest("invalid timezone (use UTC or an offset like +03:00)".to_string()))
}
