use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::booking::BookingEngine;

pub struct AppState {
    pub engine: BookingEngine,
    pub config: AppConfig,
    /// Absent when no LLM key is configured; the chat surface is then disabled.
    pub llm: Option<Box<dyn LlmProvider>>,
}
