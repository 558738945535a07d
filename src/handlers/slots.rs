use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::errors::{AppError, BookingError};
use crate::models::{Day, SlotInventory, TimeSlot};
use crate::state::AppState;

// GET /api/slots
pub async fn get_inventory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SlotInventory>, AppError> {
    Ok(Json(state.engine.inventory().await?))
}

// GET /api/slots/:day
pub async fn get_day(
    State(state): State<Arc<AppState>>,
    Path(day): Path<String>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    Ok(Json(state.engine.available_slots_by_name(&day).await?))
}

// GET /api/slots/:day/:time
#[derive(Serialize)]
pub struct AvailabilityResponse {
    day: Day,
    time: TimeSlot,
    available: bool,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path((day, time)): Path<(String, String)>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let day = day
        .parse::<Day>()
        .map_err(|e| BookingError::MalformedRequest(e.to_string()))?;
    let time = time
        .parse::<TimeSlot>()
        .map_err(|e| BookingError::MalformedRequest(e.to_string()))?;

    let available = state.engine.is_available(day, time).await?;
    Ok(Json(AvailabilityResponse {
        day,
        time,
        available,
    }))
}
