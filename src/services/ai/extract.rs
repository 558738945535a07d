use crate::models::RawBookingRequest;
use crate::services::ai::{LlmProvider, Message};

pub(crate) const EXTRACTION_PROMPT: &str = r#"You extract appointment details from a conversation between a dental office assistant and a patient.

Return ONLY valid JSON (no markdown, no explanation) with exactly these keys:
{
  "name": "patient name or null",
  "contact": "phone number or email or null",
  "day": "Monday, Tuesday, Wednesday, Thursday or Friday, or null",
  "time": "requested time as HH:MM in 24-hour format, or null",
  "reason": "reason for the visit (cleaning, check-up, toothache, ...) or null"
}

Use null for anything the patient has not stated. Never guess."#;

/// Asks the model for the booking fields mentioned so far. The whole
/// conversation is re-read every turn, so details given earlier carry forward.
pub async fn extract_request(
    llm: &dyn LlmProvider,
    history: &[Message],
    latest_message: &str,
) -> anyhow::Result<RawBookingRequest> {
    let transcript = history
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| format!("{}: {}", m.role, m.content))
        .chain(std::iter::once(format!("user: {latest_message}")))
        .collect::<Vec<_>>()
        .join("\n");

    let response = llm
        .chat(EXTRACTION_PROMPT, &[Message::user(transcript)])
        .await?;

    Ok(parse_extraction(&response))
}

fn parse_extraction(response: &str) -> RawBookingRequest {
    if let Ok(request) = serde_json::from_str::<RawBookingRequest>(response) {
        return request;
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(request) = serde_json::from_str::<RawBookingRequest>(cleaned) {
        return request;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(request) = serde_json::from_str::<RawBookingRequest>(&cleaned[start..=end]) {
                return request;
            }
        }
    }

    tracing::warn!("failed to parse extraction response as JSON, treating as empty request");
    RawBookingRequest::default()
}
