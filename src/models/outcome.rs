use serde::{Deserialize, Serialize};

use super::{Appointment, BookingId, Day, TimeSlot};

/// Result of a booking attempt, shaped for whatever phrases the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookingOutcome {
    Booked {
        booking_id: BookingId,
        name: String,
        contact: String,
        day: Day,
        time: TimeSlot,
        reason: String,
    },
    Unavailable {
        day: Day,
        time: TimeSlot,
        available_slots_for_day: Vec<TimeSlot>,
    },
}

impl From<Appointment> for BookingOutcome {
    fn from(a: Appointment) -> Self {
        BookingOutcome::Booked {
            booking_id: a.booking_id,
            name: a.patient_name,
            contact: a.contact,
            day: a.day,
            time: a.time,
            reason: a.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled { appointment: Appointment },
    NotFound { booking_id: BookingId },
}
