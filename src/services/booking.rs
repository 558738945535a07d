//! The booking engine: the only code that mutates the scheduling state.
//!
//! Every operation loads the document fresh from the store. Mutations run the
//! whole load-modify-save unit under the write half of one `RwLock`, so two
//! callers racing for the same slot can never both see it open. Reads take the
//! read half and always see a fully saved document.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::errors::BookingError;
use crate::models::{
    Appointment, BookingId, BookingOutcome, BookingRequest, CancelOutcome, Day, Schedule,
    SchedulingState, SlotInventory, TimeSlot,
};
use crate::store::{StateStore, StoreError};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub id_prefix: String,
    /// Longest wait for the state lock.
    pub lock_timeout: Duration,
    /// Longest wait for one load (or load-modify-save) against the store.
    pub store_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            id_prefix: "DENT".to_string(),
            lock_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(5),
        }
    }
}

pub struct BookingEngine {
    store: Arc<dyn StateStore>,
    gate: Arc<RwLock<()>>,
    schedule: Schedule,
    settings: EngineSettings,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn StateStore>, schedule: Schedule, settings: EngineSettings) -> Self {
        Self {
            store,
            gate: Arc::new(RwLock::new(())),
            schedule,
            settings,
        }
    }

    pub async fn is_available(&self, day: Day, time: TimeSlot) -> Result<bool, BookingError> {
        self.read("is_available", move |state| {
            state.available_slots.contains(day, time)
        })
        .await
    }

    /// Open times for the day, earliest first. A fully booked day is an empty list.
    pub async fn available_slots(&self, day: Day) -> Result<Vec<TimeSlot>, BookingError> {
        self.read("available_slots", move |state| state.available_slots.day(day))
            .await
    }

    /// Like `available_slots`, but for an unvetted day name. Names outside the
    /// office week have no slots rather than being an error.
    pub async fn available_slots_by_name(&self, day: &str) -> Result<Vec<TimeSlot>, BookingError> {
        match day.parse::<Day>() {
            Ok(day) => self.available_slots(day).await,
            Err(_) => Ok(Vec::new()),
        }
    }

    pub async fn inventory(&self) -> Result<SlotInventory, BookingError> {
        self.read("inventory", |state| state.available_slots.clone())
            .await
    }

    /// Confirmed appointments in booking order.
    pub async fn appointments(&self) -> Result<Vec<Appointment>, BookingError> {
        self.read("appointments", |state| {
            state.booked_appointments.iter().cloned().collect()
        })
        .await
    }

    pub async fn find(&self, booking_id: &BookingId) -> Result<Option<Appointment>, BookingError> {
        let booking_id = booking_id.clone();
        self.read("find", move |state| {
            state.booked_appointments.find(&booking_id).cloned()
        })
        .await
    }

    pub async fn book(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        if !self.schedule.contains(request.time) {
            let times: Vec<String> = self.schedule.times().map(|t| t.to_string()).collect();
            tracing::warn!(day = %request.day, time = %request.time, "rejected booking outside the schedule");
            return Err(BookingError::MalformedRequest(format!(
                "{} is not an appointment time (bookable times: {})",
                request.time,
                times.join(", ")
            )));
        }

        let prefix = self.settings.id_prefix.clone();
        let result = self
            .write("book", move |state| {
                let BookingRequest {
                    name,
                    contact,
                    day,
                    time,
                    reason,
                } = request;

                if !state.available_slots.take(day, time) {
                    return Err(BookingError::SlotUnavailable {
                        day,
                        time,
                        available: state.available_slots.day(day),
                    });
                }

                let appointment = Appointment {
                    patient_name: name,
                    contact,
                    day,
                    time,
                    reason,
                    booking_id: state.allocate_booking_id(&prefix),
                };
                state.booked_appointments.push(appointment.clone());
                Ok(appointment)
            })
            .await;

        match &result {
            Ok(appt) => tracing::info!(
                booking_id = %appt.booking_id,
                day = %appt.day,
                time = %appt.time,
                "appointment booked"
            ),
            Err(BookingError::SlotUnavailable { day, time, .. }) => {
                tracing::info!(day = %day, time = %time, "slot already taken")
            }
            Err(e) => tracing::error!(error = %e, "booking failed"),
        }
        result
    }

    /// Books, reporting a taken slot as an outcome rather than an error.
    pub async fn book_outcome(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        match self.book(request).await {
            Ok(appt) => Ok(appt.into()),
            Err(BookingError::SlotUnavailable {
                day,
                time,
                available,
            }) => Ok(BookingOutcome::Unavailable {
                day,
                time,
                available_slots_for_day: available,
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn cancel(&self, booking_id: &BookingId) -> Result<Appointment, BookingError> {
        let id = booking_id.clone();
        let result = self
            .write("cancel", move |state| {
                let count = state.booked_appointments.count(&id);
                if count > 1 {
                    return Err(BookingError::AmbiguousBooking {
                        booking_id: id.clone(),
                        count,
                    });
                }
                let appt = state
                    .booked_appointments
                    .remove(&id)
                    .ok_or_else(|| BookingError::BookingNotFound {
                        booking_id: id.clone(),
                    })?;
                if !state.available_slots.restore(appt.day, appt.time) {
                    tracing::warn!(booking_id = %appt.booking_id, "cancelled slot was already open");
                }
                Ok(appt)
            })
            .await;

        match &result {
            Ok(appt) => tracing::info!(
                booking_id = %appt.booking_id,
                day = %appt.day,
                time = %appt.time,
                "appointment cancelled"
            ),
            Err(BookingError::BookingNotFound { booking_id }) => {
                tracing::info!(booking_id = %booking_id, "cancel for unknown booking")
            }
            Err(BookingError::AmbiguousBooking { booking_id, count }) => {
                tracing::warn!(booking_id = %booking_id, count, "refused cancel for a reused booking id")
            }
            Err(e) => tracing::error!(error = %e, "cancel failed"),
        }
        result
    }

    /// Cancels, reporting an unknown id as an outcome rather than an error.
    pub async fn cancel_outcome(&self, booking_id: &BookingId) -> Result<CancelOutcome, BookingError> {
        match self.cancel(booking_id).await {
            Ok(appointment) => Ok(CancelOutcome::Cancelled { appointment }),
            Err(BookingError::BookingNotFound { booking_id }) => {
                Ok(CancelOutcome::NotFound { booking_id })
            }
            Err(e) => Err(e),
        }
    }

    async fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T, BookingError>
    where
        F: FnOnce(&SchedulingState) -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = timeout(self.settings.lock_timeout, Arc::clone(&self.gate).read_owned())
            .await
            .map_err(|_| BookingError::Timeout {
                operation,
                after: self.settings.lock_timeout,
            })?;

        let store = Arc::clone(&self.store);
        self.run_blocking(operation, move || {
            let _guard = guard;
            let state = store.load()?;
            Ok(f(&state))
        })
        .await
    }

    /// Load, mutate, save as one unit. Nothing is saved when `f` fails, and a
    /// failed save leaves the stored document as it was.
    async fn write<T, F>(&self, operation: &'static str, f: F) -> Result<T, BookingError>
    where
        F: FnOnce(&mut SchedulingState) -> Result<T, BookingError> + Send + 'static,
        T: Send + 'static,
    {
        let guard = timeout(self.settings.lock_timeout, Arc::clone(&self.gate).write_owned())
            .await
            .map_err(|_| BookingError::Timeout {
                operation,
                after: self.settings.lock_timeout,
            })?;

        let store = Arc::clone(&self.store);
        self.run_blocking(operation, move || {
            let _guard = guard;
            let mut state = store.load()?;
            let out = f(&mut state)?;
            store.save(&state)?;
            Ok(out)
        })
        .await
    }

    /// Runs store work on the blocking pool. The lock guard travels inside `job`,
    /// so a timed-out caller stops waiting but the lock stays held until the
    /// store call actually returns.
    async fn run_blocking<T, J>(&self, operation: &'static str, job: J) -> Result<T, BookingError>
    where
        J: FnOnce() -> Result<T, BookingError> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);
        match timeout(self.settings.store_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Ok(Err(_)) => Err(StoreError::Interrupted.into()),
            Err(_) => {
                tracing::warn!(operation, "store did not answer in time");
                Err(BookingError::Timeout {
                    operation,
                    after: self.settings.store_timeout,
                })
            }
        }
    }
}
