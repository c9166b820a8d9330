//! # Sealed Push
//!
//! Receiver side of end-to-end encrypted web push. An application server
//! seals each notification to this device's P-256 public key; the push relay
//! only ever sees ciphertext. This crate opens those envelopes and turns
//! every push, encrypted or not, into a notification to display.
//!
//! ## Overview
//!
//! - **Provisioning**: [`PushHandler::subscription_key`] lazily creates the
//!   device keypair and exports its public half as a JWK
//! - **Decryption**: [`EnvelopeDecryptor`] runs ECDH, HKDF-SHA-256 and
//!   AES-256-GCM over the `e2ee` envelope
//! - **Dispatch**: [`NotificationDispatcher`] fills in defaults, or the
//!   generic fallback when decryption fails
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealed_push::{PushConfig, PushHandler};
//! use sealed_push::store::SqliteStore;
//!
//! async fn example(push_body: &[u8]) {
//!     // Open storage once and share the handler
//!     let store = SqliteStore::open("device-keys.db").unwrap();
//!     let handler = PushHandler::new(store, PushConfig::default());
//!
//!     // Register with the application server
//!     let key = handler.subscription_key().await.unwrap();
//!     let _registration = serde_json::to_string(&key).unwrap();
//!
//!     // Handle an incoming push
//!     let request = handler.handle_push(push_body).await;
//!     println!("{}: {}", request.title, request.body);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sealed_push::primitives` - Envelope codec and crypto primitives
//! - `sealed_push::store` - Record storage, SQLite and the KeyStore

pub mod config;
pub mod decryptor;
pub mod dispatcher;
pub mod error;
pub mod handler;

// Re-export component crates
pub use sealed_push_core as primitives;
pub use sealed_push_store as store;

// Re-export main types for convenience
pub use config::PushConfig;
pub use decryptor::{envelope_fields, EnvelopeDecryptor};
pub use dispatcher::{DecryptOutcome, DisplayRequest, NotificationDispatcher};
pub use error::{DecryptError, PushError, Result};
pub use handler::{PushHandler, PushState, SubscriptionKey, PUBLIC_KEY_FORMAT};

pub use sealed_push_core::{EnvelopeFields, NotificationPayload, PublicKeyJwk};
pub use sealed_push_store::{KeyStore, MemoryStore, SqliteStore};
