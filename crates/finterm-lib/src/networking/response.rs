//! Response decoding at the API boundary
//!
//! Metering headers, error detail extraction, and normalization of the
//! list shapes the API returns.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

/// Header carrying the token cost of a request
pub const TOKEN_COST_HEADER: &str = "x-token-cost";

/// Header carrying the remaining credit balance
pub const CREDITS_REMAINING_HEADER: &str = "x-credits-remaining";

/// Metering values reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metering {
    pub token_cost: i64,
    pub credits_remaining: Option<i64>,
}

impl Metering {
    /// Read metering headers; absent or unparseable values fall back to 0/None
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            token_cost: header_int(headers, TOKEN_COST_HEADER).unwrap_or(0),
            credits_remaining: header_int(headers, CREDITS_REMAINING_HEADER),
        }
    }
}

fn header_int(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Human-readable message for a failed response
///
/// Prefers the body's `detail` field: a string, an array of `{msg}` objects
/// joined with `; `, or any other JSON value serialized. Falls back to the
/// status reason phrase, then `HTTP {status}`.
pub fn error_message(status: u16, body: Option<&Value>) -> String {
    if let Some(detail) = body.and_then(|b| b.get("detail")).and_then(detail_message) {
        return detail;
    }

    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(entries) => {
            let messages: Vec<String> = entries
                .iter()
                .map(|entry| match entry.get("msg") {
                    Some(Value::String(msg)) => msg.clone(),
                    Some(other) => other.to_string(),
                    None => entry.to_string(),
                })
                .collect();

            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

/// List payload shapes accepted from list endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemsEnvelope<T> {
    List(Vec<T>),
    Items { items: Vec<T> },
    Data { data: Vec<T> },
}

impl<T> ItemsEnvelope<T> {
    /// Normalize to a plain vector
    pub fn into_items(self) -> Vec<T> {
        match self {
            ItemsEnvelope::List(items) => items,
            ItemsEnvelope::Items { items } => items,
            ItemsEnvelope::Data { data } => data,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("response.test.rs");
}
