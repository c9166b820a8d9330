//! Push handling configuration.

use serde::{Deserialize, Serialize};

use sealed_push_store::DEFAULT_KEY_RECORD;

use crate::error::{PushError, Result};

/// Configuration for push handling.
///
/// Every field has a default, so a host can load a partial JSON document and
/// override only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Title when the payload has none.
    pub default_title: String,
    /// Body when the payload has none.
    pub default_body: String,
    /// Icon when the payload has none.
    pub default_icon: String,
    /// Badge when the payload has none.
    pub default_badge: String,
    /// Click-through target when the payload has no `url`.
    pub default_target_url: String,
    /// Title shown when an encrypted push cannot be decrypted.
    pub fallback_title: String,
    /// Body shown when an encrypted push cannot be decrypted.
    pub fallback_body: String,
    /// Title for push bodies that are not JSON.
    pub raw_text_title: String,
    /// Record name the device keypair is stored under.
    pub key_record_name: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            default_title: "Notification".into(),
            default_body: String::new(),
            default_icon: "/icon-192.png".into(),
            default_badge: "/icon-192.png".into(),
            default_target_url: "/pushserver".into(),
            fallback_title: "Encrypted message".into(),
            fallback_body: "Unable to decrypt on device".into(),
            raw_text_title: "Push".into(),
            key_record_name: DEFAULT_KEY_RECORD.into(),
        }
    }
}

impl PushConfig {
    /// Load from a JSON document. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PushError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = PushConfig::default();
        assert_eq!(c.default_title, "Notification");
        assert_eq!(c.default_body, "");
        assert_eq!(c.default_icon, "/icon-192.png");
        assert_eq!(c.default_target_url, "/pushserver");
        assert_eq!(c.fallback_title, "Encrypted message");
        assert_eq!(c.fallback_body, "Unable to decrypt on device");
        assert_eq!(c.key_record_name, "e2eeKeyPair");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c = PushConfig::from_json(r#"{"default_target_url": "/inbox"}"#).unwrap();
        assert_eq!(c.default_target_url, "/inbox");
        assert_eq!(c.default_title, "Notification");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            PushConfig::from_json("{not json"),
            Err(PushError::Config(_))
        ));
    }
}
