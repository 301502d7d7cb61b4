//! Client-side error taxonomy and server message extraction.

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the HTTP client core.
///
/// 401s are recovered internally by the refresh protocol; they only surface
/// here as `SessionExpired` (terminal refresh failure) or `Unauthorized` (a
/// request that already burned its one retry).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session was terminated: refresh failed or no refresh token exists.
    #[error("session expired")]
    SessionExpired,

    /// A 401 that cannot be recovered (the request was already retried).
    #[error("request unauthorized")]
    Unauthorized,

    /// Non-2xx response with a server-supplied message where available.
    #[error("api error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Transport-level failure (no response received). Passed through
    /// unmodified — no retry, no refresh.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response arrived but its body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Keys checked, in order of preference, for a server-supplied message.
const MESSAGE_KEYS: [&str; 5] = ["message", "messages", "error", "errors", "detail"];

/// Pull a human-readable message out of a structured error body.
///
/// Supports string, array and nested-object shapes; arrays are joined so a
/// validation response with several messages stays readable.
pub fn extract_error_message(body: &Value) -> Option<String> {
    fn from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(from_value).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            Value::Object(_) => extract_error_message(value),
            _ => None,
        }
    }

    let fields = body.as_object()?;
    for key in MESSAGE_KEYS {
        if let Some(value) = fields.get(key) {
            if let Some(message) = from_value(value) {
                return Some(message);
            }
        }
    }
    None
}
