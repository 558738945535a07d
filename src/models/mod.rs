pub mod day;
pub mod inventory;
pub mod ledger;
pub mod outcome;
pub mod request;
pub mod scheduling;
pub mod slot;

pub use day::{Day, UnknownDay};
pub use inventory::SlotInventory;
pub use ledger::{Appointment, BookingId, BookingLedger};
pub use outcome::{BookingOutcome, CancelOutcome};
pub use request::{BookingRequest, RawBookingRequest, RequestError};
pub use scheduling::SchedulingState;
pub use slot::{InvalidTime, Schedule, TimeSlot};
