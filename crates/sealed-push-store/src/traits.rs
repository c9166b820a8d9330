//! RecordStore trait: the abstract interface for durable key-value records.
//!
//! The key store keeps exactly one record (the device keypair) under a fixed
//! name. Implementations include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Result of a put-if-absent write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutResult {
    /// The value was stored.
    Inserted,
    /// A record already existed; it was left untouched.
    AlreadyExists {
        /// The value that was already stored.
        existing: Bytes,
    },
}

/// Async interface for durable, single-key records.
///
/// # Design Notes
///
/// - **Put-if-absent**: `put_record_if_absent` never overwrites. When two
///   callers race, exactly one gets `Inserted` and the other gets
///   `AlreadyExists` carrying the winner's value.
/// - **No partial writes**: a record is either fully stored or absent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read a record by name.
    async fn get_record(&self, name: &str) -> Result<Option<Bytes>>;

    /// Store `value` under `name` unless a record already exists.
    async fn put_record_if_absent(&self, name: &str, value: Bytes) -> Result<PutResult>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn get_record(&self, name: &str) -> Result<Option<Bytes>> {
        (**self).get_record(name).await
    }

    async fn put_record_if_absent(&self, name: &str, value: Bytes) -> Result<PutResult> {
        (**self).put_record_if_absent(name, value).await
    }
}
