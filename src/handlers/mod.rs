pub mod bookings;
pub mod chat;
pub mod health;
pub mod slots;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/slots", get(slots::get_inventory))
        .route("/api/slots/:day", get(slots::get_day))
        .route("/api/slots/:day/:time", get(slots::get_availability))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/chat", post(chat::send_message))
        .with_state(state)
}
