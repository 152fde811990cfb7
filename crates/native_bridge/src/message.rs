//! Defensive parsing of host payloads
//!
//! Payloads cross the bridge either as a JSON-encoded string or as a
//! structured object, depending on the host platform. Both forms decode
//! to the same message; anything else is a typed error the consumer logs
//! and drops without touching session state.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("malformed bridge payload: {0}")]
    Malformed(String),
}

/// Token/platform message pushed by the host.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMessage {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl BridgeMessage {
    /// Decode a payload that may be a JSON-encoded string or a structured
    /// object. Parsing is pure: identical input yields identical output.
    pub fn parse(payload: &Value) -> Result<BridgeMessage, BridgeError> {
        let value = match payload {
            Value::String(s) => {
                serde_json::from_str::<Value>(s).map_err(|e| BridgeError::Malformed(e.to_string()))?
            }
            other => other.clone(),
        };
        if !value.is_object() {
            return Err(BridgeError::Malformed(format!(
                "expected object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| BridgeError::Malformed(e.to_string()))
    }

    /// A message carries a usable token only when the field is non-empty.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Decode the loading-status payload, which arrives as a bool or as the
/// strings "true"/"false".
pub fn parse_loading_flag(payload: &Value) -> Option<bool> {
    match payload {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
