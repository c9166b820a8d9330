//! # Sealed Push Store
//!
//! Durable storage for the per-device P-256 keypair. Provides a trait-based
//! record interface with SQLite and in-memory implementations, and the
//! [`KeyStore`] that owns all private key material.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The async trait for single-key durable records
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`KeyStore`] - Lazy, race-safe keypair provisioning and export
//! - [`DeviceKeyPair`] - The persisted keypair
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealed_push_store::{KeyStore, SqliteStore};
//!
//! async fn example() {
//!     // Open the store once at startup and share it
//!     let store = SqliteStore::open("device-keys.db").unwrap();
//!     let keys = KeyStore::new(store);
//!
//!     // Provision (if needed) and export the public key for the sender
//!     let jwk = keys.export_public_key().await.unwrap();
//!     assert_eq!(jwk.crv, "P-256");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Put-if-absent**: concurrent first-time provisioning keeps one keypair
//! - **Single record**: only the keypair is ever written; no envelope or
//!   plaintext data reaches the store

pub mod error;
pub mod keystore;
pub mod memory;
pub mod migration;
pub mod record;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use keystore::{KeyStore, DEFAULT_KEY_RECORD};
pub use memory::MemoryStore;
pub use record::DeviceKeyPair;
pub use sqlite::SqliteStore;
pub use traits::{PutResult, RecordStore};

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
