//! Test fixtures and helpers.
//!
//! [`TestSender`] plays the application server: it seals payloads to a
//! device public key with the same ECDH / HKDF-SHA-256 / AES-256-GCM
//! construction the receiver opens.

use serde_json::{json, Value};

use sealed_push_core::{
    DevicePublicKey, DeviceSecret, Envelope, EnvelopeFields, EphemeralPublicKey, PublicKeyJwk,
    NONCE_LEN, SALT_LEN,
};
use sealed_push_store::{KeyStore, MemoryStore};

/// Fixed device secret for deterministic tests.
pub const FIXED_DEVICE_SECRET: &str =
    "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721";

/// Fixed sender ephemeral secret for deterministic tests.
pub const FIXED_EPHEMERAL_SECRET: &str =
    "519b423d715f8b581f4fa8ee59f4771a5b44c8130b4e3eacca54a56dda72b464";

/// Build a device secret from a 64-char hex scalar.
///
/// Panics on malformed input; only for fixtures.
pub fn secret_from_hex(hex_scalar: &str) -> DeviceSecret {
    let bytes: [u8; 32] = hex::decode(hex_scalar)
        .expect("fixture secret must be hex")
        .try_into()
        .expect("fixture secret must be 32 bytes");
    DeviceSecret::from_bytes(&bytes).expect("fixture secret must be a valid scalar")
}

/// Seals notification payloads to a device public key.
pub struct TestSender {
    version: Value,
}

impl Default for TestSender {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSender {
    /// A sender that tags envelopes with version 1.
    pub fn new() -> Self {
        Self { version: json!(1) }
    }

    /// A sender that tags envelopes with the given version value.
    pub fn with_version(version: Value) -> Self {
        Self { version }
    }

    /// Seal `plaintext` with a fresh ephemeral key, iv and salt.
    pub fn seal(&self, recipient: &DevicePublicKey, plaintext: &[u8]) -> EnvelopeFields {
        self.seal_envelope(recipient, plaintext).to_fields()
    }

    /// Seal to a JWK as a device would export it.
    pub fn seal_to_jwk(&self, recipient: &PublicKeyJwk, plaintext: &[u8]) -> EnvelopeFields {
        let recipient = DevicePublicKey::from_jwk(recipient).expect("recipient JWK must be valid");
        self.seal(&recipient, plaintext)
    }

    /// Seal a JSON value.
    pub fn seal_json(&self, recipient: &DevicePublicKey, payload: &Value) -> EnvelopeFields {
        let bytes = serde_json::to_vec(payload).expect("JSON values always serialize");
        self.seal(recipient, &bytes)
    }

    /// Seal and return the decoded envelope, for tests that tamper with bytes.
    pub fn seal_envelope(&self, recipient: &DevicePublicKey, plaintext: &[u8]) -> Envelope {
        self.seal_with(
            &DeviceSecret::generate(),
            rand::random::<[u8; NONCE_LEN]>(),
            rand::random::<[u8; SALT_LEN]>(),
            recipient,
            plaintext,
        )
    }

    /// Seal with caller-chosen ephemeral key, iv and salt.
    pub fn seal_with(
        &self,
        ephemeral: &DeviceSecret,
        iv: [u8; NONCE_LEN],
        salt: [u8; SALT_LEN],
        recipient: &DevicePublicKey,
        plaintext: &[u8],
    ) -> Envelope {
        let shared = ephemeral
            .derivation_key()
            .diffie_hellman(&EphemeralPublicKey::from(*recipient));
        let ciphertext = shared.derive_content_key(&salt).encrypt(plaintext, &iv);

        Envelope {
            version: self.version.clone(),
            epk: ephemeral.public_key().to_uncompressed(),
            iv,
            salt,
            ciphertext,
        }
    }
}

/// A device with a provisioned keypair in a memory store.
pub struct TestDevice {
    pub keys: KeyStore<MemoryStore>,
    pub public_key: DevicePublicKey,
}

impl TestDevice {
    /// Provision a fresh keypair.
    pub async fn provisioned() -> Self {
        let keys = KeyStore::new(MemoryStore::new());
        let public_key = keys
            .ensure_key_pair()
            .await
            .expect("memory store cannot fail")
            .public_key();
        Self { keys, public_key }
    }

    /// Seal a JSON payload to this device and wrap it as a push body.
    pub fn encrypted_push(&self, payload: &Value) -> Vec<u8> {
        push_body(&TestSender::new().seal_json(&self.public_key, payload))
    }
}

/// Wrap envelope fields as a push body: `{ "e2ee": { ... } }`.
pub fn push_body(fields: &EnvelopeFields) -> Vec<u8> {
    serde_json::to_vec(&json!({ "e2ee": fields })).expect("JSON values always serialize")
}

/// Flip one bit of the trailing authentication tag.
pub fn flip_tag_bit(envelope: &mut Envelope, bit: usize) {
    let tag_start = envelope.ciphertext.len() - sealed_push_core::TAG_LEN;
    let byte = tag_start + (bit / 8) % sealed_push_core::TAG_LEN;
    envelope.ciphertext[byte] ^= 1 << (bit % 8);
}
