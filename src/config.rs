use std::env;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::Schedule;
use crate::services::booking::EngineSettings;

#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Sqlite,
    JsonFile,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub data_file: String,
    pub admin_token: String,
    pub booking_id_prefix: String,
    pub schedule: Schedule,
    pub store_timeout: Duration,
    pub lock_timeout: Duration,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
}

fn millis(var: &str, default: u64) -> Duration {
    Duration::from_millis(
        env::var(var)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "" | "sqlite" => StoreBackend::Sqlite,
            "json" => StoreBackend::JsonFile,
            other => return Err(AppError::Config(format!("unknown STORE_BACKEND: {other}"))),
        };

        let schedule = match env::var("SLOT_TIMES") {
            Ok(list) => Schedule::parse_list(&list)
                .map_err(|e| AppError::Config(format!("SLOT_TIMES: {e}")))?,
            Err(_) => Schedule::default(),
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store_backend,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "dentbook.db".to_string()),
            data_file: env::var("DATA_FILE")
                .unwrap_or_else(|_| "appointment_data.json".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            booking_id_prefix: env::var("BOOKING_ID_PREFIX").unwrap_or_else(|_| "DENT".to_string()),
            schedule,
            store_timeout: millis("STORE_TIMEOUT_MS", 5000),
            lock_timeout: millis("LOCK_TIMEOUT_MS", 5000),
            llm_api_key: env::var("LLM_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .unwrap_or_default(),
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            llm_timeout: millis("LLM_TIMEOUT_MS", 30_000),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            id_prefix: self.booking_id_prefix.clone(),
            lock_timeout: self.lock_timeout,
            store_timeout: self.store_timeout,
        }
    }

    pub fn chat_enabled(&self) -> bool {
        !self.llm_api_key.is_empty()
    }
}
