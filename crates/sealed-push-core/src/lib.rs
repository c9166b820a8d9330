//! # Sealed Push Core
//!
//! Pure primitives for end-to-end encrypted web push: the envelope codec,
//! P-256 key agreement, HKDF-SHA-256 derivation and AES-256-GCM opening.
//!
//! This crate contains no I/O and no storage. Key persistence lives in
//! `sealed-push-store`; the push handling pipeline lives in `sealed-push`.
//!
//! ## Key Types
//!
//! - [`EnvelopeFields`] - The `e2ee` object as it appears on the wire
//! - [`Envelope`] - A decoded envelope whose field lengths have been checked
//! - [`DeviceSecret`] / [`DevicePublicKey`] - The per-device P-256 keypair
//! - [`DerivationKey`] - A private key handle that can only do ECDH
//! - [`NotificationPayload`] - `{ title, body, icon, badge, url }`
//!
//! ## Envelope Opening
//!
//! ```text
//! shared  = ECDH(device_secret, epk)
//! key     = HKDF-SHA-256(salt = envelope.salt, ikm = shared, info = "")
//! payload = AES-256-GCM-Open(key, iv, ct || tag)
//! ```

pub mod codec;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod payload;

pub use codec::{decode_base64url, encode_base64url, validate_fixed_length};
pub use crypto::{
    ContentKey, DerivationKey, DevicePublicKey, DeviceSecret, EphemeralPublicKey, PublicKeyJwk,
    SharedKey, NONCE_LEN, SALT_LEN, TAG_LEN, UNCOMPRESSED_POINT_LEN,
};
pub use envelope::{Envelope, EnvelopeFields, MIN_CIPHERTEXT_LEN};
pub use error::{CodecError, EnvelopeError, KeyError};
pub use payload::NotificationPayload;
