use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::errors::{AppError, BookingError};
use crate::models::{Appointment, BookingId, BookingOutcome, BookingRequest, CancelOutcome, RawBookingRequest};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawBookingRequest>,
) -> Result<Response, AppError> {
    let request = BookingRequest::try_from(raw).map_err(BookingError::from)?;

    let outcome = state.engine.book_outcome(request).await?;
    let status = match outcome {
        BookingOutcome::Booked { .. } => StatusCode::CREATED,
        BookingOutcome::Unavailable { .. } => StatusCode::CONFLICT,
    };
    Ok((status, Json(outcome)).into_response())
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.engine.appointments().await?))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking_id = BookingId::from(id.as_str());
    match state.engine.find(&booking_id).await? {
        Some(appt) => Ok(Json(appt)),
        None => Err(BookingError::BookingNotFound { booking_id }.into()),
    }
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let outcome = state
        .engine
        .cancel_outcome(&BookingId::from(id.as_str()))
        .await?;
    let status = match outcome {
        CancelOutcome::Cancelled { .. } => StatusCode::OK,
        CancelOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    Ok((status, Json(outcome)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_auth() {
        let mut headers = HeaderMap::new();
        assert!(check_auth(&headers, "secret").is_err());

        headers.insert("authorization", "Bearer wrong".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_err());

        headers.insert("authorization", "Bearer secret".parse().unwrap());
        assert!(check_auth(&headers, "secret").is_ok());
    }
}
