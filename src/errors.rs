use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::{BookingId, Day, RequestError, TimeSlot};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{day} at {time} is not available")]
    SlotUnavailable {
        day: Day,
        time: TimeSlot,
        available: Vec<TimeSlot>,
    },

    #[error("booking {booking_id} not found")]
    BookingNotFound { booking_id: BookingId },

    #[error("booking id {booking_id} is shared by {count} appointments")]
    AmbiguousBooking { booking_id: BookingId, count: usize },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl From<RequestError> for BookingError {
    fn from(e: RequestError) -> Self {
        BookingError::MalformedRequest(e.to_string())
    }
}

impl BookingError {
    /// Worth retrying unchanged a moment later.
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Timeout { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("chat is disabled: no LLM API key configured")]
    ChatDisabled,

    #[error("AI provider error: {0}")]
    Ai(String),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ChatDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Ai(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Booking(e) => match e {
                BookingError::SlotUnavailable { .. } => StatusCode::CONFLICT,
                BookingError::BookingNotFound { .. } => StatusCode::NOT_FOUND,
                BookingError::AmbiguousBooking { .. } => StatusCode::CONFLICT,
                BookingError::MalformedRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                BookingError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
