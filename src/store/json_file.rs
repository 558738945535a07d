use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{decode_document, encode_document, StateStore, StoreError};
use crate::models::{Schedule, SchedulingState};

/// Keeps the document as pretty-printed JSON on disk. Writes go to a sibling
/// temp file that is renamed over the target, so readers never see half a document.
pub struct JsonFileStore {
    path: PathBuf,
    schedule: Schedule,
    io: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, schedule: Schedule) -> Self {
        Self {
            path: path.into(),
            schedule,
            io: Mutex::new(()),
        }
    }

    fn write_atomically(&self, document: &str) -> Result<(), StoreError> {
        let tmp = temp_path(&self.path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(document.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<SchedulingState, StoreError> {
        let _io = self.io.lock().map_err(|_| StoreError::Poisoned)?;

        match fs::read_to_string(&self.path) {
            Ok(document) => decode_document(&document),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let state = SchedulingState::seeded(&self.schedule);
                self.write_atomically(&encode_document(&state)?)?;
                tracing::info!(path = %self.path.display(), "seeded scheduling file with the default week");
                Ok(state)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &SchedulingState) -> Result<(), StoreError> {
        let document = encode_document(state)?;
        let _io = self.io.lock().map_err(|_| StoreError::Poisoned)?;
        self.write_atomically(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Day;

    #[test]
    fn test_creates_file_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointment_data.json");
        let store = JsonFileStore::new(&path, Schedule::default());

        let state = store.load().unwrap();
        assert_eq!(state.available_slots.day(Day::Friday).len(), 6);

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["available_slots"]["Monday"][0], "09:00");
        assert_eq!(on_disk["booked_appointments"], serde_json::json!([]));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_save_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::new(&path, Schedule::default());

        let mut state = store.load().unwrap();
        state.available_slots.take(Day::Tuesday, "11:00".parse().unwrap());
        state.next_booking_number = 9;
        store.save(&state).unwrap();

        let reloaded = JsonFileStore::new(&path, Schedule::default()).load().unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_save_into_missing_directory_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope/state.json"), Schedule::default());
        let state = SchedulingState::seeded(&Schedule::default());
        assert!(matches!(store.save(&state), Err(StoreError::Io(_))));
    }

    #[test]
    fn test_reads_original_unpadded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointment_data.json");
        fs::write(
            &path,
            r#"{"available_slots":{"Monday":["9:00","10:00"]},"booked_appointments":[]}"#,
        )
        .unwrap();

        let state = JsonFileStore::new(&path, Schedule::default()).load().unwrap();
        let row: Vec<String> = state
            .available_slots
            .day(Day::Monday)
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(row, vec!["09:00", "10:00"]);
    }
}
