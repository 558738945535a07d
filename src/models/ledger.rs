use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Day, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// `DENT` + 7 -> `DENT-0007`. Sequences past 9999 simply widen.
    pub fn new(prefix: &str, sequence: u64) -> Self {
        Self(format!("{prefix}-{sequence:04}"))
    }

    /// The numeric suffix, if the id has one.
    pub fn sequence(&self) -> Option<u64> {
        self.0.rsplit_once('-')?.1.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookingId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub patient_name: String,
    pub contact: String,
    pub day: Day,
    pub time: TimeSlot,
    pub reason: String,
    pub booking_id: BookingId,
}

/// Confirmed appointments in booking order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingLedger(Vec<Appointment>);

impl BookingLedger {
    pub fn push(&mut self, appointment: Appointment) {
        self.0.push(appointment);
    }

    pub fn find(&self, id: &BookingId) -> Option<&Appointment> {
        self.0.iter().find(|a| &a.booking_id == id)
    }

    pub fn contains(&self, id: &BookingId) -> bool {
        self.find(id).is_some()
    }

    /// How many appointments carry `id`. More than one only in old files.
    pub fn count(&self, id: &BookingId) -> usize {
        self.0.iter().filter(|a| &a.booking_id == id).count()
    }

    /// Removes and returns the appointment, keeping the rest in order.
    pub fn remove(&mut self, id: &BookingId) -> Option<Appointment> {
        let idx = self.0.iter().position(|a| &a.booking_id == id)?;
        Some(self.0.remove(idx))
    }

    pub fn highest_sequence(&self) -> Option<u64> {
        self.0.iter().filter_map(|a| a.booking_id.sequence()).max()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Appointment> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(id: &str, day: Day, time: &str) -> Appointment {
        Appointment {
            patient_name: "Alice".to_string(),
            contact: "alice@example.com".to_string(),
            day,
            time: time.parse().unwrap(),
            reason: "cleaning".to_string(),
            booking_id: BookingId::from(id),
        }
    }

    #[test]
    fn test_booking_id_format() {
        assert_eq!(BookingId::new("DENT", 1).as_str(), "DENT-0001");
        assert_eq!(BookingId::new("DENT", 12345).as_str(), "DENT-12345");
        assert_eq!(BookingId::new("DENT", 42).sequence(), Some(42));
        assert_eq!(BookingId::from("garbage").sequence(), None);
    }

    #[test]
    fn test_remove_keeps_insertion_order() {
        let mut ledger = BookingLedger::default();
        ledger.push(appt("DENT-0001", Day::Monday, "09:00"));
        ledger.push(appt("DENT-0002", Day::Tuesday, "10:00"));
        ledger.push(appt("DENT-0003", Day::Monday, "14:00"));

        let removed = ledger.remove(&BookingId::from("DENT-0002")).unwrap();
        assert_eq!(removed.day, Day::Tuesday);
        assert!(ledger.remove(&BookingId::from("DENT-0002")).is_none());

        let ids: Vec<&str> = ledger.iter().map(|a| a.booking_id.as_str()).collect();
        assert_eq!(ids, vec!["DENT-0001", "DENT-0003"]);
    }

    #[test]
    fn test_highest_sequence() {
        let mut ledger = BookingLedger::default();
        assert_eq!(ledger.highest_sequence(), None);
        ledger.push(appt("DENT-0007", Day::Friday, "16:00"));
        ledger.push(appt("DENT-0003", Day::Monday, "09:00"));

        assert_eq!(ledger.highest_sequence(), Some(7));
    }

    #[test]
    fn test_appointment_wire_shape() {
        let json = serde_json::to_value(appt("DENT-0001", Day::Monday, "9:00")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "patient_name": "Alice",
                "contact": "alice@example.com",
                "day": "Monday",
                "time": "09:00",
                "reason": "cleaning",
                "booking_id": "DENT-0001"
            })
        );
    }
}
