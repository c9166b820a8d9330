//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same put-if-absent semantics
//! as SQLite but keeps everything in memory with no persistence.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::{PutResult, RecordStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_record(&self, name: &str) -> Result<Option<Bytes>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(name).cloned())
    }

    async fn put_record_if_absent(&self, name: &str, value: Bytes) -> Result<PutResult> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(PutResult::AlreadyExists {
                existing: e.get().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(value);
                Ok(PutResult::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert!(store.get_record("k").await.unwrap().is_none());

        let r = store
            .put_record_if_absent("k", Bytes::from_static(b"v1"))
            .await
            .unwrap();
        assert_eq!(r, PutResult::Inserted);
        assert_eq!(store.get_record("k").await.unwrap().unwrap(), "v1");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_never_overwrites() {
        let store = MemoryStore::new();
        store
            .put_record_if_absent("k", Bytes::from_static(b"first"))
            .await
            .unwrap();

        let r = store
            .put_record_if_absent("k", Bytes::from_static(b"second"))
            .await
            .unwrap();
        assert_eq!(
            r,
            PutResult::AlreadyExists {
                existing: Bytes::from_static(b"first")
            }
        );
        assert_eq!(store.get_record("k").await.unwrap().unwrap(), "first");
    }

    proptest::proptest! {
        #[test]
        fn prop_first_write_wins(
            name in "[a-zA-Z0-9]{1,16}",
            first in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
            second in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                store.put_record_if_absent(&name, Bytes::from(first.clone())).await.unwrap();
                store.put_record_if_absent(&name, Bytes::from(second)).await.unwrap();
                assert_eq!(store.get_record(&name).await.unwrap().unwrap(), Bytes::from(first));
                assert_eq!(store.len(), 1);
            });
        }
    }
}
