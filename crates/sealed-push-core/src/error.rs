//! Error types for Sealed Push Core.

use thiserror::Error;

/// Errors from the base64url / fixed-length codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid base64url encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid length for {field}: expected {expected}, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while decoding, validating, or opening an envelope.
///
/// `DecryptionFailed` carries no detail. A tag mismatch and any other AEAD
/// failure are reported identically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("envelope field {field} is not valid base64url")]
    InvalidEncoding { field: &'static str },

    #[error("ephemeral key must be a 65-byte uncompressed P-256 point")]
    MalformedEphemeralKey,

    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("invalid salt length: expected {expected}, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    #[error("ciphertext too short: need at least {min} bytes, got {actual}")]
    CiphertextTooShort { min: usize, actual: usize },

    #[error("key agreement failed")]
    KeyAgreementFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("plaintext is not a JSON notification payload")]
    InvalidPlaintextFormat,
}

impl EnvelopeError {
    /// Stable short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EnvelopeError::InvalidEncoding { .. } => "invalid_encoding",
            EnvelopeError::MalformedEphemeralKey => "malformed_ephemeral_key",
            EnvelopeError::InvalidNonceLength { .. } => "invalid_nonce_length",
            EnvelopeError::InvalidSaltLength { .. } => "invalid_salt_length",
            EnvelopeError::CiphertextTooShort { .. } => "ciphertext_too_short",
            EnvelopeError::KeyAgreementFailed => "key_agreement_failed",
            EnvelopeError::DecryptionFailed => "decryption_failed",
            EnvelopeError::InvalidPlaintextFormat => "invalid_plaintext_format",
        }
    }
}

/// Errors from key material handling (import, export, persistence encoding).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret scalar")]
    InvalidSecret,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
