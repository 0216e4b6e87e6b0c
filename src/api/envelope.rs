use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

/// Keys a list payload may be wrapped in
const LIST_KEYS: &[&str] = &[
    "results", "items", "stocks", "quotes", "trades", "favorites", "list", "data",
];

/// Uniform response wrapper `{ success, data, message? }`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    /// `success: false` is a recoverable failure just like a non-2xx status
    pub fn into_data(self) -> Result<Value, FetchError> {
        if self.success {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request failed".to_string());
        Err(FetchError::Rejected(message))
    }
}

/// Parse a response body into the envelope's `data`
pub fn parse_body(body: &str) -> Result<Value, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|err| FetchError::Decode(err.to_string()))?;
    envelope.into_data()
}

/// Best-effort `message` from an error body; bodies that are not an envelope yield `None`
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
}

/// Items of a list payload, either a bare array or an object wrapping one
pub fn list_items(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return items,
                    Some(nested @ Value::Object(_)) => return list_items(nested),
                    _ => {}
                }
            }
            vec![]
        }
        _ => vec![],
    }
}
