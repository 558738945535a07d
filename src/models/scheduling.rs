use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{BookingId, BookingLedger, Schedule, SlotInventory};

/// The whole persisted document: open slots, confirmed bookings and the id counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub available_slots: SlotInventory,
    pub booked_appointments: BookingLedger,
    /// Next sequence handed to `allocate_booking_id`. Older documents lack it,
    /// in which case it is rebuilt by `reconcile_counter`.
    #[serde(default)]
    pub next_booking_number: u64,
}

impl SchedulingState {
    pub fn seeded(schedule: &Schedule) -> Self {
        Self {
            available_slots: SlotInventory::seeded(schedule),
            booked_appointments: BookingLedger::default(),
            next_booking_number: 1,
        }
    }

    /// Moves the counter past every id already in the ledger. Never moves it back.
    pub fn reconcile_counter(&mut self) {
        let floor = self
            .booked_appointments
            .highest_sequence()
            .map_or(1, |n| n + 1);
        self.next_booking_number = self.next_booking_number.max(floor);
    }

    /// Hands out the next id and advances the counter. Ids are never reused,
    /// even once the appointment holding them is cancelled.
    pub fn allocate_booking_id(&mut self, prefix: &str) -> BookingId {
        loop {
            let id = BookingId::new(prefix, self.next_booking_number);
            self.next_booking_number += 1;
            if !self.booked_appointments.contains(&id) {
                return id;
            }
        }
    }

    /// Ids held by more than one appointment, in ledger order. Files written
    /// before the counter existed can reuse an id after a cancellation.
    pub fn duplicate_ids(&self) -> Vec<BookingId> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for appt in self.booked_appointments.iter() {
            if !seen.insert(&appt.booking_id) && !dups.contains(&appt.booking_id) {
                dups.push(appt.booking_id.clone());
            }
        }
        dups
    }

    /// Checks the invariant a loaded document must satisfy: no slot that is
    /// both booked and open.
    pub fn check_consistency(&self) -> Result<(), String> {
        for appt in self.booked_appointments.iter() {
            if self.available_slots.contains(appt.day, appt.time) {
                return Err(format!(
                    "{} {} is booked by {} but also listed as open",
                    appt.day, appt.time, appt.booking_id
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Day};

    fn appt(id: &str, day: Day, time: &str) -> Appointment {
        Appointment {
            patient_name: "Bob".to_string(),
            contact: "555-0100".to_string(),
            day,
            time: time.parse().unwrap(),
            reason: "check-up".to_string(),
            booking_id: BookingId::from(id),
        }
    }

    #[test]
    fn test_seeded_state() {
        let state = SchedulingState::seeded(&Schedule::default());
        assert!(state.booked_appointments.is_empty());
        assert_eq!(state.next_booking_number, 1);
        assert!(state.check_consistency().is_ok());
    }

    #[test]
    fn test_allocate_is_monotonic() {
        let mut state = SchedulingState::seeded(&Schedule::default());
        assert_eq!(state.allocate_booking_id("DENT").as_str(), "DENT-0001");
        assert_eq!(state.allocate_booking_id("DENT").as_str(), "DENT-0002");
        assert_eq!(state.next_booking_number, 3);
    }

    #[test]
    fn test_legacy_document_counter_rebuilt() {
        let json = r#"{
            "available_slots": {"Monday": ["10:00"]},
            "booked_appointments": [
                {"patient_name":"A","contact":"a","day":"Monday","time":"9:00","reason":"r","booking_id":"DENT-0002"}
            ]
        }"#;
        let mut state: SchedulingState = serde_json::from_str(json).unwrap();
        assert_eq!(state.next_booking_number, 0);
        state.reconcile_counter();
        assert_eq!(state.next_booking_number, 3);
        assert_eq!(state.allocate_booking_id("DENT").as_str(), "DENT-0003");
    }

    #[test]
    fn test_reconcile_never_lowers_counter() {
        let mut state = SchedulingState::seeded(&Schedule::default());
        state.next_booking_number = 40;
        state.reconcile_counter();
        assert_eq!(state.next_booking_number, 40);
    }

    #[test]
    fn test_allocate_skips_ids_in_use() {
        let mut state = SchedulingState::seeded(&Schedule::default());
        state.available_slots.take(Day::Monday, "09:00".parse().unwrap());
        state.booked_appointments.push(appt("DENT-0001", Day::Monday, "09:00"));
        assert_eq!(state.allocate_booking_id("DENT").as_str(), "DENT-0002");
    }

    #[test]
    fn test_consistency_flags_double_listed_slot() {
        let mut state = SchedulingState::seeded(&Schedule::default());
        state.booked_appointments.push(appt("DENT-0001", Day::Monday, "09:00"));
        let err = state.check_consistency().unwrap_err();
        assert!(err.contains("also listed as open"));
    }

    #[test]
    fn test_duplicate_ids_are_reported_not_rejected() {
        let mut state = SchedulingState::seeded(&Schedule::default());
        for time in ["09:00", "10:00", "11:00"] {
            state.available_slots.take(Day::Monday, time.parse().unwrap());
        }
        state.booked_appointments.push(appt("DENT-0002", Day::Monday, "09:00"));
        state.booked_appointments.push(appt("DENT-0002", Day::Monday, "10:00"));
        state.booked_appointments.push(appt("DENT-0003", Day::Monday, "11:00"));

        assert!(state.check_consistency().is_ok());
        assert_eq!(state.duplicate_ids(), vec![BookingId::from("DENT-0002")]);

        state.reconcile_counter();
        assert_eq!(state.allocate_booking_id("DENT").as_str(), "DENT-0004");
    }
}
