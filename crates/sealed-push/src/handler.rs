//! PushHandler: one inbound push in, one display request out.
//!
//! Each push runs through a fixed state machine exactly once, with no
//! retries:
//!
//! ```text
//! ReceivedRaw ─┬─> NoEnvelope ──> Plaintext ──────────────┬─> DisplayRequestBuilt
//!              └─> HasEnvelope ─> Decrypting ─┬─> Decrypted ┤
//!                                             └─> Failed ───┘
//! ```
//!
//! A push always produces a notification. Decrypt failures are logged with
//! their kind and swallowed into the generic fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sealed_push_core::{NotificationPayload, PublicKeyJwk};
use sealed_push_store::{KeyStore, RecordStore};

use crate::config::PushConfig;
use crate::decryptor::EnvelopeDecryptor;
use crate::dispatcher::{DecryptOutcome, DisplayRequest, NotificationDispatcher};
use crate::error::Result;

/// Format tag sent alongside the exported public key.
pub const PUBLIC_KEY_FORMAT: &str = "JWK-P-256";

/// Stages a push passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    ReceivedRaw,
    NoEnvelope,
    Plaintext,
    HasEnvelope,
    Decrypting,
    Decrypted,
    Failed,
    DisplayRequestBuilt,
}

impl PushState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushState::ReceivedRaw => "received_raw",
            PushState::NoEnvelope => "no_envelope",
            PushState::Plaintext => "plaintext",
            PushState::HasEnvelope => "has_envelope",
            PushState::Decrypting => "decrypting",
            PushState::Decrypted => "decrypted",
            PushState::Failed => "failed",
            PushState::DisplayRequestBuilt => "display_request_built",
        }
    }
}

/// What a subscription registration sends to the application server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionKey {
    pub app_public_key: PublicKeyJwk,
    pub app_public_key_format: String,
}

/// A push body after JSON parsing.
enum InboundBody {
    Json(Value),
    Text(NotificationPayload),
}

/// Handles inbound pushes for one device.
pub struct PushHandler<S: RecordStore> {
    decryptor: EnvelopeDecryptor<S>,
    dispatcher: NotificationDispatcher,
}

impl<S: RecordStore> Clone for PushHandler<S> {
    fn clone(&self) -> Self {
        Self {
            decryptor: self.decryptor.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S: RecordStore> PushHandler<S> {
    /// Create a handler over an opened store.
    ///
    /// The keypair lives under `config.key_record_name`.
    pub fn new(store: S, config: PushConfig) -> Self {
        let keys = KeyStore::with_record_name(store, config.key_record_name.clone());
        Self::with_key_store(keys, config)
    }

    /// Create a handler sharing an existing key store.
    pub fn with_key_store(keys: KeyStore<S>, config: PushConfig) -> Self {
        Self {
            decryptor: EnvelopeDecryptor::new(keys),
            dispatcher: NotificationDispatcher::new(config),
        }
    }

    /// Get the key store reference.
    pub fn key_store(&self) -> &KeyStore<S> {
        self.decryptor.key_store()
    }

    /// The device public key for subscription registration.
    ///
    /// Provisions the keypair on first use. Storage failures are returned,
    /// unlike decrypt failures.
    pub async fn subscription_key(&self) -> Result<SubscriptionKey> {
        let pair = self.key_store().ensure_key_pair().await?;
        tracing::debug!(
            fingerprint = %pair.public_key().fingerprint(),
            "exporting subscription key"
        );
        Ok(SubscriptionKey {
            app_public_key: pair.public_jwk(),
            app_public_key_format: PUBLIC_KEY_FORMAT.to_string(),
        })
    }

    /// Process one push body into the notification to display.
    pub async fn handle_push(&self, raw: &[u8]) -> DisplayRequest {
        transition(PushState::ReceivedRaw);
        let outcome = self.process(raw).await;
        let request = self.dispatcher.build_display_request(&outcome);
        transition(PushState::DisplayRequestBuilt);
        request
    }

    async fn process(&self, raw: &[u8]) -> DecryptOutcome {
        let value = match self.parse_body(raw) {
            InboundBody::Json(value) => value,
            InboundBody::Text(payload) => {
                transition(PushState::NoEnvelope);
                transition(PushState::Plaintext);
                return DecryptOutcome::Plaintext(payload);
            }
        };

        if let Some(e2ee) = envelope_of(&value) {
            transition(PushState::HasEnvelope);
            transition(PushState::Decrypting);
            return match self.decryptor.decrypt_value(e2ee).await {
                Ok(payload) => {
                    transition(PushState::Decrypted);
                    DecryptOutcome::Decrypted(payload)
                }
                Err(e) => {
                    let present = |f: &str| e2ee.get(f).is_some();
                    tracing::warn!(
                        kind = e.kind(),
                        error = %e,
                        has_epk = present("epk"),
                        has_iv = present("iv"),
                        has_salt = present("salt"),
                        has_ct = present("ct"),
                        "push decryption failed"
                    );
                    transition(PushState::Failed);
                    DecryptOutcome::Failed
                }
            };
        }

        transition(PushState::NoEnvelope);
        let payload = plain_payload(value);
        transition(PushState::Plaintext);
        DecryptOutcome::Plaintext(payload)
    }

    fn parse_body(&self, raw: &[u8]) -> InboundBody {
        if raw.is_empty() {
            return InboundBody::Json(Value::Object(Map::new()));
        }
        match serde_json::from_slice(raw) {
            Ok(value) => InboundBody::Json(value),
            Err(_) => {
                let title = &self.dispatcher.config().raw_text_title;
                let payload = match std::str::from_utf8(raw) {
                    Ok(text) => NotificationPayload::text(title.as_str(), text),
                    Err(_) => NotificationPayload {
                        title: Some(title.clone()),
                        ..NotificationPayload::default()
                    },
                };
                InboundBody::Text(payload)
            }
        }
    }
}

fn transition(state: PushState) {
    tracing::debug!(state = state.as_str(), "push state");
}

/// The `e2ee` value, unless it is missing or falsy.
///
/// `null`, `false`, `0` and `""` all mean no envelope.
fn envelope_of(value: &Value) -> Option<&Value> {
    value.get("e2ee").filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Interpret an unencrypted JSON body.
///
/// Non-object bodies carry nothing displayable.
fn plain_payload(value: Value) -> NotificationPayload {
    NotificationPayload::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_push_store::MemoryStore;
    use sealed_push_testkit::fixtures::{push_body, TestSender};
    use serde_json::json;

    fn handler() -> PushHandler<MemoryStore> {
        PushHandler::new(MemoryStore::new(), PushConfig::default())
    }

    #[tokio::test]
    async fn test_plain_json_push() {
        let req = handler().handle_push(br#"{"title":"Plain"}"#).await;
        assert_eq!(req.title, "Plain");
        assert_eq!(req.icon, "/icon-192.png");
        assert_eq!(req.target_url, "/pushserver");
    }

    #[tokio::test]
    async fn test_raw_text_push() {
        let req = handler().handle_push(b"server says hello").await;
        assert_eq!(req.title, "Push");
        assert_eq!(req.body, "server says hello");
    }

    #[tokio::test]
    async fn test_non_utf8_push_has_empty_body() {
        let req = handler().handle_push(&[0xff, 0xfe, 0x00]).await;
        assert_eq!(req.title, "Push");
        assert_eq!(req.body, "");
    }

    #[tokio::test]
    async fn test_empty_push_uses_defaults() {
        let req = handler().handle_push(b"").await;
        assert_eq!(req.title, "Notification");
        assert_eq!(req.body, "");
    }

    #[tokio::test]
    async fn test_null_e2ee_is_plaintext() {
        let req = handler()
            .handle_push(br#"{"e2ee":null,"title":"Plain"}"#)
            .await;
        assert_eq!(req.title, "Plain");
    }

    #[tokio::test]
    async fn test_falsy_e2ee_is_plaintext() {
        let h = handler();
        for body in [
            br#"{"e2ee":false,"title":"Plain"}"#.as_slice(),
            br#"{"e2ee":0,"title":"Plain"}"#.as_slice(),
            br#"{"e2ee":"","title":"Plain"}"#.as_slice(),
        ] {
            let req = h.handle_push(body).await;
            assert_eq!(req.title, "Plain");
        }
        assert!(h.key_store().store().is_empty());
    }

    #[tokio::test]
    async fn test_truthy_non_object_e2ee_falls_back() {
        let req = handler()
            .handle_push(br#"{"e2ee":true,"title":"leak"}"#)
            .await;
        assert_eq!(req.title, "Encrypted message");
    }

    #[tokio::test]
    async fn test_incomplete_envelope_falls_back() {
        let req = handler()
            .handle_push(br#"{"e2ee":{"version":1,"epk":"AA"},"title":"leak"}"#)
            .await;
        assert_eq!(req.title, "Encrypted message");
        assert_eq!(req.body, "Unable to decrypt on device");
    }

    #[tokio::test]
    async fn test_ill_typed_fields_are_dropped() {
        let req = handler()
            .handle_push(br#"{"title":42,"body":"still shown"}"#)
            .await;
        assert_eq!(req.title, "Notification");
        assert_eq!(req.body, "still shown");
    }

    #[tokio::test]
    async fn test_non_object_json_uses_defaults() {
        let req = handler().handle_push(br#""just a string""#).await;
        assert_eq!(req.title, "Notification");
    }

    #[tokio::test]
    async fn test_subscription_key_shape() {
        let h = handler();
        let key = h.subscription_key().await.unwrap();

        assert_eq!(key.app_public_key_format, "JWK-P-256");
        assert_eq!(key.app_public_key.crv, "P-256");

        let v = serde_json::to_value(&key).unwrap();
        assert_eq!(v["appPublicKeyFormat"], "JWK-P-256");
        assert_eq!(v["appPublicKey"]["kty"], "EC");

        // Stable across calls.
        assert_eq!(h.subscription_key().await.unwrap(), key);
    }

    #[tokio::test]
    async fn test_configured_record_name_is_used() {
        let config = PushConfig {
            key_record_name: "device-key".into(),
            ..PushConfig::default()
        };
        let h = PushHandler::new(MemoryStore::new(), config);
        h.subscription_key().await.unwrap();

        assert_eq!(h.key_store().record_name(), "device-key");
        assert_eq!(h.key_store().store().len(), 1);
    }

    #[tokio::test]
    async fn test_sealed_payload_with_ill_typed_field_still_displays() {
        let h = handler();
        let key = h.subscription_key().await.unwrap();
        let fields = TestSender::new().seal_to_jwk(
            &key.app_public_key,
            br#"{"title":"Hi","body":"there","badge":7}"#,
        );

        let req = h.handle_push(&push_body(&fields)).await;
        assert_eq!(req.title, "Hi");
        assert_eq!(req.body, "there");
        assert_eq!(req.badge, "/icon-192.png");
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PushState::DisplayRequestBuilt.as_str(), "display_request_built");
        assert_eq!(PushState::HasEnvelope.as_str(), "has_envelope");
    }

    #[test]
    fn test_plain_payload_keeps_well_typed_object() {
        let p = plain_payload(json!({"title": "t", "url": "/u"}));
        assert_eq!(p.title.as_deref(), Some("t"));
        assert_eq!(p.url.as_deref(), Some("/u"));

        let p = plain_payload(json!({"title": "t", "badge": 7}));
        assert_eq!(p.title.as_deref(), Some("t"));
        assert!(p.badge.is_none());
    }
}
