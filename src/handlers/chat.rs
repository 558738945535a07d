use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::chat::{self, ChatSession, ChatTurn};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session: ChatSession,
}

#[derive(Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub turn: ChatTurn,
    pub session: ChatSession,
}

// POST /api/chat
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let llm = state
        .llm
        .as_deref()
        .ok_or(AppError::ChatDisabled)?;

    let mut session = payload.session;
    let turn = chat::process_message(&state.engine, llm, &mut session, payload.message.trim()).await?;

    Ok(Json(ChatResponse { turn, session }))
}
