use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dentbook::config::{AppConfig, StoreBackend};
use dentbook::errors::AppError;
use dentbook::handlers;
use dentbook::services::ai::openai::OpenAiProvider;
use dentbook::services::ai::LlmProvider;
use dentbook::services::booking::BookingEngine;
use dentbook::services::chat::{self, ChatSession};
use dentbook::state::AppState;
use dentbook::store::{JsonFileStore, SqliteStore, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn StateStore> = match config.store_backend {
        StoreBackend::Sqlite => {
            tracing::info!("using SQLite store at {}", config.database_url);
            Arc::new(SqliteStore::open(
                &config.database_url,
                config.schedule.clone(),
                config.store_timeout,
            )?)
        }
        StoreBackend::JsonFile => {
            tracing::info!("using JSON file store at {}", config.data_file);
            Arc::new(JsonFileStore::new(&config.data_file, config.schedule.clone()))
        }
    };
    let engine = BookingEngine::new(store, config.schedule.clone(), config.engine_settings());

    let llm: Option<Box<dyn LlmProvider>> = if config.chat_enabled() {
        tracing::info!("chat enabled (model: {})", config.llm_model);
        Some(Box::new(OpenAiProvider::new(
            config.llm_api_key.clone(),
            config.llm_base_url.clone(),
            config.llm_model.clone(),
            config.llm_timeout,
        )?))
    } else {
        tracing::warn!("no LLM API key set, chat is disabled");
        None
    };

    let state = Arc::new(AppState {
        engine,
        config: config.clone(),
        llm,
    });

    if std::env::args().nth(1).as_deref() == Some("chat") {
        return run_chat_loop(&state).await;
    }

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_chat_loop(state: &AppState) -> anyhow::Result<()> {
    let llm = state
        .llm
        .as_deref()
        .context("chat needs LLM_API_KEY (or OPENAI_API_KEY) to be set")?;

    println!("Dental appointment assistant");
    println!("Type 'quit' to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = ChatSession::default();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            println!("Thanks for using the appointment assistant. Goodbye!");
            break;
        }

        match chat::process_message(&state.engine, llm, &mut session, input).await {
            Ok(turn) => println!("\nAssistant: {}", turn.reply),
            Err(AppError::Ai(e)) => eprintln!("\nThe assistant is unavailable right now: {e}"),
            Err(AppError::Booking(e)) if e.is_transient() => {
                eprintln!("\nThe booking system is busy, please try again: {e}")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
