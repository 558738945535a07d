use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;

use super::{decode_document, encode_document, StateStore, StoreError};
use crate::db::{self, queries};
use crate::models::{Schedule, SchedulingState};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    schedule: Schedule,
}

impl SqliteStore {
    pub fn open(path: &str, schedule: Schedule, busy_timeout: Duration) -> anyhow::Result<Self> {
        let conn = db::init_db(path, busy_timeout)?;
        Ok(Self {
            conn: Mutex::new(conn),
            schedule,
        })
    }
}

impl StateStore for SqliteStore {
    fn load(&self) -> Result<SchedulingState, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        match queries::get_state_document(&conn)? {
            Some(document) => decode_document(&document),
            None => {
                let state = SchedulingState::seeded(&self.schedule);
                queries::put_state_document(&conn, &encode_document(&state)?)?;
                tracing::info!("seeded scheduling state with the default week");
                Ok(state)
            }
        }
    }

    fn save(&self, state: &SchedulingState) -> Result<(), StoreError> {
        let document = encode_document(state)?;
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        queries::put_state_document(&conn, &document)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, BookingId, Day};

    fn store() -> SqliteStore {
        SqliteStore::open(":memory:", Schedule::default(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_first_load_seeds_and_persists() {
        let store = store();
        let state = store.load().unwrap();
        assert_eq!(state.available_slots.iter().count(), 30);

        let conn = store.conn.lock().unwrap();
        assert!(queries::get_state_document(&conn).unwrap().is_some());
    }

    #[test]
    fn test_save_then_load() {
        let store = store();
        let mut state = store.load().unwrap();
        let time = "09:00".parse().unwrap();
        state.available_slots.take(Day::Monday, time);
        let booking_id = state.allocate_booking_id("DENT");
        state.booked_appointments.push(Appointment {
            patient_name: "A".to_string(),
            contact: "a@x.com".to_string(),
            day: Day::Monday,
            time,
            reason: "cleaning".to_string(),
            booking_id,
        });
        store.save(&state).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, state);
        assert!(reloaded
            .booked_appointments
            .find(&BookingId::from("DENT-0001"))
            .is_some());
        assert_eq!(reloaded.next_booking_number, 2);
    }

    #[test]
    fn test_corrupt_document_surfaces() {
        let store = store();
        {
            let conn = store.conn.lock().unwrap();
            queries::put_state_document(&conn, "not json").unwrap();
        }
        assert!(matches!(store.load(), Err(StoreError::Serde(_))));
    }
}
