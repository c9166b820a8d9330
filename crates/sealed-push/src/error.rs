//! Error types for push handling.

use sealed_push_core::{CodecError, EnvelopeError};
use sealed_push_store::StoreError;
use thiserror::Error;

/// Why an encrypted push could not be turned into a notification.
///
/// None of these reach the user. Every variant produces the same generic
/// fallback notification; the variant only shows up in logs.
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("envelope field {field} is missing or not valid base64url")]
    InvalidEncoding { field: &'static str },

    #[error("invalid length for {field}: expected {expected}, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

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

    #[error("device key not found")]
    KeyNotFound,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("plaintext is not a JSON notification payload")]
    InvalidPlaintextFormat,

    #[error("key storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

impl DecryptError {
    /// Stable short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DecryptError::InvalidEncoding { .. } => "invalid_encoding",
            DecryptError::InvalidFieldLength { .. } => "invalid_field_length",
            DecryptError::MalformedEphemeralKey => "malformed_ephemeral_key",
            DecryptError::InvalidNonceLength { .. } => "invalid_nonce_length",
            DecryptError::InvalidSaltLength { .. } => "invalid_salt_length",
            DecryptError::CiphertextTooShort { .. } => "ciphertext_too_short",
            DecryptError::KeyAgreementFailed => "key_agreement_failed",
            DecryptError::KeyNotFound => "key_not_found",
            DecryptError::DecryptionFailed => "decryption_failed",
            DecryptError::InvalidPlaintextFormat => "invalid_plaintext_format",
            DecryptError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl From<EnvelopeError> for DecryptError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::InvalidEncoding { field } => DecryptError::InvalidEncoding { field },
            EnvelopeError::MalformedEphemeralKey => DecryptError::MalformedEphemeralKey,
            EnvelopeError::InvalidNonceLength { expected, actual } => {
                DecryptError::InvalidNonceLength { expected, actual }
            }
            EnvelopeError::InvalidSaltLength { expected, actual } => {
                DecryptError::InvalidSaltLength { expected, actual }
            }
            EnvelopeError::CiphertextTooShort { min, actual } => {
                DecryptError::CiphertextTooShort { min, actual }
            }
            EnvelopeError::KeyAgreementFailed => DecryptError::KeyAgreementFailed,
            EnvelopeError::DecryptionFailed => DecryptError::DecryptionFailed,
            EnvelopeError::InvalidPlaintextFormat => DecryptError::InvalidPlaintextFormat,
        }
    }
}

impl From<CodecError> for DecryptError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::InvalidEncoding(_) => DecryptError::InvalidEncoding { field: "e2ee" },
            CodecError::InvalidFieldLength {
                field,
                expected,
                actual,
            } => DecryptError::InvalidFieldLength {
                field,
                expected,
                actual,
            },
        }
    }
}

impl From<StoreError> for DecryptError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            DecryptError::StorageUnavailable(e)
        } else {
            DecryptError::KeyNotFound
        }
    }
}

/// Errors surfaced to callers of provisioning and configuration APIs.
#[derive(Debug, Error)]
pub enum PushError {
    /// The key store could not be read or written, or held an unusable key.
    #[error("key storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// A configuration document could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, PushError>;
