//! Notification payloads: plaintext push bodies and decrypted envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// `{ title?, body?, icon?, badge?, url? }` plus any extra fields the sender
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationPayload {
    /// A payload with just a title and body.
    pub fn text(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Parse decrypted bytes. Must be UTF-8 JSON describing an object.
    pub fn from_plaintext(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|_| EnvelopeError::InvalidPlaintextFormat)?;
        Self::from_value(value)
    }

    /// Interpret a JSON value as a payload.
    ///
    /// Only non-objects fail. A known field holding anything but a string is
    /// dropped, and the rest of the payload is kept.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut extra) = value else {
            return Err(EnvelopeError::InvalidPlaintextFormat);
        };
        let mut take = |field: &str| match extra.remove(field) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        Ok(Self {
            title: take("title"),
            body: take("body"),
            icon: take("icon"),
            badge: take("badge"),
            url: take("url"),
            extra,
        })
    }

    /// Serialize back to JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
