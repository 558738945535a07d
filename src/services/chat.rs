use serde::{Deserialize, Serialize};

use crate::errors::{AppError, BookingError};
use crate::models::{
    Appointment, BookingOutcome, BookingRequest, Day, RawBookingRequest, SlotInventory, TimeSlot,
};
use crate::services::ai::extract::extract_request;
use crate::services::ai::{LlmProvider, Message};
use crate::services::booking::BookingEngine;

const SYSTEM_PROMPT: &str = r#"You are a friendly assistant for a dental office. You help patients book or cancel appointments.
The office is open Monday through Friday; appointments start on the hour at the times listed below.

To book, you need:
1. The patient's name
2. A phone number or email address
3. The preferred day and time
4. The reason for the visit (cleaning, check-up, a specific problem, ...)

Ask for whatever is missing, one or two items at a time. Keep replies short.
If a system note says an appointment was booked, confirm the details and give the patient the booking ID.
If a system note says the slot is taken, offer the listed alternatives."#;

/// Everything a chat front end has to carry between turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(default)]
    pub history: Vec<Message>,
    /// Requests this session already booked. The extractor re-reads the whole
    /// conversation each turn and would otherwise hand back the same request.
    #[serde(default)]
    pub booked: Vec<BookingRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BookingOutcome>,
}

pub async fn process_message(
    engine: &BookingEngine,
    llm: &dyn LlmProvider,
    session: &mut ChatSession,
    message: &str,
) -> Result<ChatTurn, AppError> {
    let extracted = match extract_request(llm, &session.history, message).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "extraction failed, continuing without booking details");
            RawBookingRequest::default()
        }
    };

    tracing::info!(missing = ?extracted.missing_fields(), "extracted booking details");

    let (note, outcome) = try_booking(engine, session, extracted).await?;

    let slots = match engine.inventory().await {
        Ok(inventory) => render_inventory(&inventory),
        Err(e) if outcome.is_some() => {
            tracing::warn!(error = %e, "could not load slots for the reply prompt");
            "(not available right now)".to_string()
        }
        Err(e) => return Err(e.into()),
    };
    let system = format!("{SYSTEM_PROMPT}\n\nCurrent available slots:\n{slots}");

    let mut messages = session.history.clone();
    messages.push(Message::user(message));
    if let Some(note) = note {
        messages.push(Message::system(note));
    }

    // Once a booking was attempted its outcome has to reach the client, reply model or not.
    let reply = match llm.chat(&system, &messages).await {
        Ok(reply) => reply,
        Err(e) => match &outcome {
            Some(outcome) => {
                tracing::warn!(error = %e, "reply model failed, answering from the booking outcome");
                fallback_reply(outcome)
            }
            None => return Err(AppError::Ai(e.to_string())),
        },
    };

    session.history.push(Message::user(message));
    session.history.push(Message::assistant(reply.clone()));

    Ok(ChatTurn { reply, outcome })
}

/// Books once the extracted request is complete. Returns the note for the
/// responder and the outcome, if a booking was attempted. Only persistence
/// failures escape as errors.
async fn try_booking(
    engine: &BookingEngine,
    session: &mut ChatSession,
    extracted: RawBookingRequest,
) -> Result<(Option<String>, Option<BookingOutcome>), BookingError> {
    if !extracted.is_complete() {
        return Ok((None, None));
    }

    let request = match BookingRequest::try_from(extracted) {
        Ok(request) => request,
        Err(e) => {
            return Ok((
                Some(format!(
                    "The appointment could not be booked: {e}. The office books Monday to Friday only."
                )),
                None,
            ))
        }
    };

    if session.booked.contains(&request) {
        return Ok((None, None));
    }

    let outcome = match engine.book_outcome(request.clone()).await {
        Ok(outcome @ BookingOutcome::Booked { .. }) => outcome,
        // A lost reply on an earlier turn leaves the request booked but the session unaware.
        Ok(outcome @ BookingOutcome::Unavailable { .. }) => {
            match committed_booking(engine, &request).await {
                Some(appt) => appt.into(),
                None => outcome,
            }
        }
        Err(e @ BookingError::MalformedRequest(_)) => {
            return Ok((
                Some(format!("The appointment could not be booked: {e}.")),
                None,
            ))
        }
        // The write behind a timeout may still land.
        Err(e) if e.is_transient() => match committed_booking(engine, &request).await {
            Some(appt) => appt.into(),
            None => {
                return Ok((
                    Some("The booking system is busy. Ask the patient to try again in a moment.".to_string()),
                    None,
                ))
            }
        },
        Err(e) => return Err(e),
    };

    if matches!(outcome, BookingOutcome::Booked { .. }) {
        session.booked.push(request);
    }
    Ok((Some(outcome_note(&outcome)), Some(outcome)))
}

/// The ledger entry that is exactly `request`, if one exists.
async fn committed_booking(engine: &BookingEngine, request: &BookingRequest) -> Option<Appointment> {
    match engine.appointments().await {
        Ok(appointments) => appointments
            .into_iter()
            .find(|appt| request.is_fulfilled_by(appt)),
        Err(e) => {
            tracing::warn!(error = %e, "could not re-read the ledger");
            None
        }
    }
}

fn outcome_note(outcome: &BookingOutcome) -> String {
    match outcome {
        BookingOutcome::Booked {
            booking_id,
            name,
            contact,
            day,
            time,
            reason,
        } => format!(
            "An appointment has been booked.\n\
             Booking ID: {booking_id}\n\
             Patient: {name}\n\
             Contact: {contact}\n\
             Day: {day}\n\
             Time: {time}\n\
             Reason: {reason}"
        ),
        BookingOutcome::Unavailable {
            day,
            time,
            available_slots_for_day,
        } => format!(
            "The requested slot ({day} at {time}) is not available. Available slots for {day}: {}",
            open_times(available_slots_for_day)
        ),
    }
}

/// What the patient hears when the reply model is down.
fn fallback_reply(outcome: &BookingOutcome) -> String {
    match outcome {
        BookingOutcome::Booked {
            booking_id,
            day,
            time,
            ..
        } => format!(
            "Your appointment on {day} at {time} is confirmed. Your booking ID is {booking_id}."
        ),
        BookingOutcome::Unavailable {
            day,
            time,
            available_slots_for_day,
        } => format!(
            "Sorry, {day} at {time} is already taken. Open times on {day}: {}.",
            open_times(available_slots_for_day)
        ),
    }
}

fn open_times(times: &[TimeSlot]) -> String {
    if times.is_empty() {
        "none".to_string()
    } else {
        join_times(times)
    }
}

fn render_inventory(inventory: &SlotInventory) -> String {
    Day::ALL
        .iter()
        .map(|day| {
            let row = inventory.day(*day);
            let times = if row.is_empty() {
                "fully booked".to_string()
            } else {
                join_times(&row)
            };
            format!("{day}: {times}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_times(times: &[TimeSlot]) -> String {
    times
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingId, Schedule};

    #[test]
    fn test_booked_note_has_every_detail() {
        let note = outcome_note(&BookingOutcome::Booked {
            booking_id: BookingId::from("DENT-0003"),
            name: "Ann".to_string(),
            contact: "ann@x.com".to_string(),
            day: Day::Monday,
            time: "9:00".parse().unwrap(),
            reason: "cleaning".to_string(),
        });
        assert!(note.contains("Booking ID: DENT-0003"));
        assert!(note.contains("Time: 09:00"));
        assert!(note.contains("Reason: cleaning"));
    }

    #[test]
    fn test_unavailable_note_lists_alternatives() {
        let note = outcome_note(&BookingOutcome::Unavailable {
            day: Day::Friday,
            time: "10:00".parse().unwrap(),
            available_slots_for_day: vec!["14:00".parse().unwrap(), "9:00".parse().unwrap()],
        });
        assert_eq!(
            note,
            "The requested slot (Friday at 10:00) is not available. Available slots for Friday: 14:00, 09:00"
        );

        let full = outcome_note(&BookingOutcome::Unavailable {
            day: Day::Friday,
            time: "10:00".parse().unwrap(),
            available_slots_for_day: vec![],
        });
        assert!(full.ends_with("Available slots for Friday: none"));
    }

    #[test]
    fn test_fallback_reply_carries_booking_id() {
        let reply = fallback_reply(&BookingOutcome::Booked {
            booking_id: BookingId::from("DENT-0004"),
            name: "Ann".to_string(),
            contact: "ann@x.com".to_string(),
            day: Day::Wednesday,
            time: "14:00".parse().unwrap(),
            reason: "filling".to_string(),
        });
        assert_eq!(
            reply,
            "Your appointment on Wednesday at 14:00 is confirmed. Your booking ID is DENT-0004."
        );

        let taken = fallback_reply(&BookingOutcome::Unavailable {
            day: Day::Friday,
            time: "10:00".parse().unwrap(),
            available_slots_for_day: vec![],
        });
        assert!(taken.ends_with("Open times on Friday: none."));
    }

    #[test]
    fn test_render_inventory_marks_full_days() {
        let mut inventory = SlotInventory::seeded(&Schedule::new(["09:00".parse().unwrap()]));
        inventory.take(Day::Tuesday, "09:00".parse().unwrap());
        let rendered = render_inventory(&inventory);
        assert!(rendered.contains("Monday: 09:00"));
        assert!(rendered.contains("Tuesday: fully booked"));
    }

    #[test]
    fn test_session_round_trips_as_json() {
        let session = ChatSession {
            history: vec![Message::user("hi"), Message::assistant("hello")],
            booked: vec![],
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.history, session.history);

        let empty: ChatSession = serde_json::from_str("{}").unwrap();
        assert!(empty.history.is_empty());
    }
}
