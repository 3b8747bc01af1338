//! Scrubbing of credentials from structured log fields.

use serde_json::Value;

pub(crate) const REDACTED: &str = "[REDACTED]";

/// Field names whose values are never written, matched case-insensitively
/// as substrings.
const DENYLIST_KEYS: [&str; 9] = [
    "token",
    "authorization",
    "api_key",
    "apikey",
    "secret",
    "password",
    "cookie",
    "generated_key",
    "full_key",
];

pub(crate) fn sanitize_value(key: &str, value: Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_sensitive_value(&s) => Value::String(REDACTED.to_string()),
        other => other,
    }
}

/// Redacts bearer credentials that were interpolated into a message.
pub(crate) fn sanitize_message(message: String) -> String {
    let lower = message.to_ascii_lowercase();
    let Some(start) = lower.find("bearer ") else {
        return message;
    };

    let token_start = start + "bearer ".len();
    let token_end = message[token_start..]
        .find(char::is_whitespace)
        .map_or(message.len(), |offset| token_start + offset);

    format!("{}{}{}", &message[..token_start], REDACTED, &message[token_end..])
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

fn looks_like_sensitive_value(raw: &str) -> bool {
    if raw.to_ascii_lowercase().starts_with("bearer ") {
        return true;
    }
    // JWT-shaped
    if raw.matches('.').count() == 2 && raw.len() > 40 && !raw.contains(' ') {
        return true;
    }
    is_long_hex(raw)
}

fn is_long_hex(value: &str) -> bool {
    value.len() > 48 && value.chars().all(|c| c.is_ascii_hexdigit())
}
