//! Durable homes for the scheduling document.
//!
//! A store only moves whole documents: `load` hands back the current state and
//! `save` replaces it. Serializing the load-modify-save sequence is the booking
//! engine's job, not the store's.

pub mod json_file;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

use crate::models::SchedulingState;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scheduling document: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("inconsistent scheduling document: {0}")]
    Corrupt(String),

    #[error("store connection poisoned by an earlier panic")]
    Poisoned,

    #[error("store task was cancelled before it finished")]
    Interrupted,
}

pub trait StateStore: Send + Sync {
    /// Returns the current state, seeding the default week on first use.
    fn load(&self) -> Result<SchedulingState, StoreError>;

    /// Replaces the stored state. Either the whole document lands or nothing does.
    fn save(&self, state: &SchedulingState) -> Result<(), StoreError>;
}

pub(crate) fn decode_document(document: &str) -> Result<SchedulingState, StoreError> {
    let mut state: SchedulingState = serde_json::from_str(document)?;
    state.reconcile_counter();
    state.check_consistency().map_err(StoreError::Corrupt)?;
    for id in state.duplicate_ids() {
        tracing::warn!(booking_id = %id, "booking id is shared by several appointments; cancel by that id is refused");
    }
    Ok(state)
}

pub(crate) fn encode_document(state: &SchedulingState) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(state)?)
}
