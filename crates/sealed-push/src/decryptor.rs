//! EnvelopeDecryptor: turns an `e2ee` envelope into a notification payload.
//!
//! The pipeline runs in a fixed order and stops at the first failure:
//!
//! 1. Decode the four base64url fields.
//! 2. Check field lengths and the uncompressed-point tag.
//! 3. Fetch the device private key.
//! 4. ECDH with the sender's ephemeral key.
//! 5. HKDF-SHA-256 with the envelope salt and empty info.
//! 6. AES-256-GCM open.
//! 7. Parse the plaintext as a JSON object.
//!
//! No key is fetched until the envelope is structurally valid, so malformed
//! pushes never touch the store.

use serde_json::{Map, Value};
use zeroize::Zeroizing;

use sealed_push_core::{Envelope, EnvelopeFields, NotificationPayload};
use sealed_push_store::{KeyStore, RecordStore};

use crate::error::DecryptError;

/// Opens envelopes with the device's private key.
pub struct EnvelopeDecryptor<S: RecordStore> {
    keys: KeyStore<S>,
}

impl<S: RecordStore> Clone for EnvelopeDecryptor<S> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<S: RecordStore> EnvelopeDecryptor<S> {
    pub fn new(keys: KeyStore<S>) -> Self {
        Self { keys }
    }

    /// Get the key store reference.
    pub fn key_store(&self) -> &KeyStore<S> {
        &self.keys
    }

    /// Decrypt wire fields into a notification payload.
    pub async fn decrypt(&self, fields: &EnvelopeFields) -> Result<NotificationPayload, DecryptError> {
        let envelope = Envelope::decode(fields)?;
        let key = self.keys.private_key_for_derivation().await?;
        let plaintext = Zeroizing::new(envelope.open(&key)?);
        Ok(NotificationPayload::from_plaintext(&plaintext)?)
    }

    /// Decrypt the raw JSON value found under `e2ee`.
    pub async fn decrypt_value(&self, e2ee: &Value) -> Result<NotificationPayload, DecryptError> {
        let fields = envelope_fields(e2ee)?;
        self.decrypt(&fields).await
    }
}

/// Pull the envelope fields out of an `e2ee` value.
///
/// A missing or non-string field is reported as an encoding failure on that
/// field.
pub fn envelope_fields(e2ee: &Value) -> Result<EnvelopeFields, DecryptError> {
    let obj = e2ee
        .as_object()
        .ok_or(DecryptError::InvalidEncoding { field: "e2ee" })?;

    Ok(EnvelopeFields {
        version: obj.get("version").cloned().unwrap_or(Value::Null),
        epk: string_field(obj, "epk")?,
        iv: string_field(obj, "iv")?,
        salt: string_field(obj, "salt")?,
        ct: string_field(obj, "ct")?,
    })
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, DecryptError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(DecryptError::InvalidEncoding { field })
}
