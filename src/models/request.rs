use serde::{Deserialize, Deserializer, Serialize};

use super::{Appointment, Day, InvalidTime, TimeSlot, UnknownDay};

/// What the extractor hands over: any subset of the five fields, loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBookingRequest {
    #[serde(
        default,
        alias = "patient_name",
        alias = "patient name",
        deserialize_with = "lenient_text"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "contact_information",
        alias = "contact information",
        deserialize_with = "lenient_text"
    )]
    pub contact: Option<String>,
    #[serde(
        default,
        alias = "preferred_day",
        alias = "preferred day",
        deserialize_with = "lenient_text"
    )]
    pub day: Option<String>,
    #[serde(
        default,
        alias = "preferred_time",
        alias = "preferred time",
        deserialize_with = "lenient_text"
    )]
    pub time: Option<String>,
    #[serde(
        default,
        alias = "reason_for_visit",
        alias = "reason for visit",
        deserialize_with = "lenient_text"
    )]
    pub reason: Option<String>,
}

/// Strings are trimmed, numbers and booleans become text, and blanks,
/// nulls and placeholder words count as absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return Ok(None),
    };
    match text.to_lowercase().as_str() {
        "" | "null" | "none" | "n/a" | "unknown" => Ok(None),
        _ => Ok(Some(text)),
    }
}

impl RawBookingRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("contact", &self.contact),
            ("day", &self.day),
            ("time", &self.time),
            ("reason", &self.reason),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
        .map(|(k, _)| k)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("missing fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error(transparent)]
    Day(#[from] UnknownDay),

    #[error(transparent)]
    Time(#[from] InvalidTime),
}

/// A complete request in the closed Day/TimeSlot domain. The only input `book` accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub contact: String,
    pub day: Day,
    pub time: TimeSlot,
    pub reason: String,
}

impl BookingRequest {
    /// Whether `appointment` is exactly this request, already booked.
    pub fn is_fulfilled_by(&self, appointment: &Appointment) -> bool {
        appointment.day == self.day
            && appointment.time == self.time
            && appointment.patient_name == self.name
            && appointment.contact == self.contact
            && appointment.reason == self.reason
    }
}

impl TryFrom<RawBookingRequest> for BookingRequest {
    type Error = RequestError;

    fn try_from(raw: RawBookingRequest) -> Result<Self, Self::Error> {
        let missing = raw.missing_fields();
        if !missing.is_empty() {
            return Err(RequestError::Missing(missing));
        }

        let field = |v: Option<String>| v.unwrap_or_default().trim().to_string();
        let day = field(raw.day).parse::<Day>()?;
        let time = field(raw.time).parse::<TimeSlot>()?;

        Ok(BookingRequest {
            name: field(raw.name),
            contact: field(raw.contact),
            day,
            time,
            reason: field(raw.reason),
        })
    }
}
