//! Assistant text extraction from response payloads

use crate::error::{ChatError, ChatResult};
use serde_json::Value;

pub const NO_TEXT_OUTPUT: &str = "(no text output)";

/// Parse a raw body that nominally succeeded.
/// Blank bodies and non-JSON bodies are contract violations.
pub fn parse_payload(operation: &'static str, raw: &str) -> ChatResult<Value> {
    if raw.trim().is_empty() {
        return Err(ChatError::EmptyPayload { operation });
    }

    serde_json::from_str(raw).map_err(|e| ChatError::MalformedPayload {
        operation,
        reason: e.to_string(),
    })
}

/// Render the assistant's text from a response payload.
///
/// A non-blank top-level `output_text` wins verbatim. Otherwise every
/// `output[].content[]` part contributes its `text` string, or `text.value`
/// when `text` is not a usable string; fragments are newline-joined and
/// trimmed. Never returns an empty string.
pub fn extract_output_text(payload: &Value) -> String {
    if let Some(text) = payload
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
    {
        return text.to_string();
    }

    let fragments: Vec<&str> = payload
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter_map(content_text)
        .collect();

    let joined = fragments.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        NO_TEXT_OUTPUT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The `id` of a response payload, if it carries a usable one
pub fn response_id(payload: &Value) -> Option<&str> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
}

fn content_text(part: &Value) -> Option<&str> {
    let text = part.get("text")?;
    text.as_str()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            text.get("value")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
        })
}
