//! Error types for the store module.

use sealed_push_core::KeyError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No device keypair has been provisioned.
    #[error("device key not found")]
    KeyNotFound,

    /// Persisted key material is unusable.
    #[error("invalid key record: {0}")]
    InvalidKey(#[from] KeyError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the backend was poisoned by a panicking holder.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// A blocking storage task could not be joined.
    #[error("storage task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// True for every error except a missing key.
    ///
    /// Anything else means the store could not be read or written, or held
    /// data that cannot be used.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, StoreError::KeyNotFound)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
