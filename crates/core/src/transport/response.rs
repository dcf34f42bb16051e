//! Interpretation of raw `(status, body)` pairs.

use serde_json::{Map, Value};

use crate::error::ConversionError;
use crate::task::TaskHandle;

/// Maximum number of body characters quoted in error messages.
pub const SNIPPET_CHARS: usize = 200;

/// First [`SNIPPET_CHARS`] characters of a response body.
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Server-supplied `message` field of a JSON body, if any.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn http_error(status: u16, body: &str) -> ConversionError {
    let message = server_message(body).unwrap_or_else(|| {
        format!("request failed ({status}) {}", snippet(body))
            .trim_end()
            .to_string()
    });
    ConversionError::http(status, message)
}

/// Interpret the response to a JSON request.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, ConversionError> {
    if !is_success(status) {
        return Err(http_error(status, body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(value) => Ok(value),
        Err(_) => Err(ConversionError::protocol(format!(
            "response parse failure: {}",
            snippet(body)
        ))),
    }
}

/// Interpret the response to an upload, extracting the task identifier.
pub fn interpret_upload(status: u16, body: &str) -> Result<TaskHandle, ConversionError> {
    if !is_success(status) {
        return Err(http_error(status, body));
    }

    let value = if body.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str::<Value>(body).map_err(|_| {
            ConversionError::protocol(format!("response parse failure: {}", snippet(body)))
        })?
    };

    value
        .get("taskId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(TaskHandle::new)
        .ok_or_else(|| ConversionError::protocol("response missing task id"))
}
