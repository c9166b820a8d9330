//! KeyStore: lazy, race-safe provisioning of the device keypair.
//!
//! Exactly one keypair exists per device. It is generated the first time
//! something needs it (public key export for a subscription) and persisted
//! under a single fixed record name. Generation relies on the backend's
//! put-if-absent: when two callers race, the loser discards its candidate and
//! reads back the winner's keypair.

use std::sync::Arc;

use sealed_push_core::{DerivationKey, PublicKeyJwk};

use crate::error::{Result, StoreError};
use crate::record::DeviceKeyPair;
use crate::traits::{PutResult, RecordStore};

/// Default record name for the device keypair.
pub const DEFAULT_KEY_RECORD: &str = "e2eeKeyPair";

/// Owner of the device's private key material.
pub struct KeyStore<S: RecordStore> {
    store: Arc<S>,
    record_name: String,
}

impl<S: RecordStore> Clone for KeyStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            record_name: self.record_name.clone(),
        }
    }
}

impl<S: RecordStore> KeyStore<S> {
    /// Wrap an opened store, using the default record name.
    pub fn new(store: S) -> Self {
        Self::with_record_name(store, DEFAULT_KEY_RECORD)
    }

    /// Wrap an opened store, keeping the keypair under `record_name`.
    pub fn with_record_name(store: S, record_name: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            record_name: record_name.into(),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The record name the keypair is stored under.
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Return the persisted keypair, generating and storing one if absent.
    pub async fn ensure_key_pair(&self) -> Result<DeviceKeyPair> {
        if let Some(bytes) = self.store.get_record(&self.record_name).await? {
            return DeviceKeyPair::from_bytes(&bytes);
        }

        let candidate = DeviceKeyPair::generate(crate::now_millis());
        let encoded = candidate.to_bytes()?;

        match self
            .store
            .put_record_if_absent(&self.record_name, encoded)
            .await?
        {
            PutResult::Inserted => {
                tracing::info!(
                    fingerprint = %candidate.public_key().fingerprint(),
                    "generated device keypair"
                );
                Ok(candidate)
            }
            PutResult::AlreadyExists { existing } => {
                let winner = DeviceKeyPair::from_bytes(&existing)?;
                tracing::debug!(
                    fingerprint = %winner.public_key().fingerprint(),
                    "device keypair created concurrently; using persisted one"
                );
                Ok(winner)
            }
        }
    }

    /// The public key as a JSON Web Key, provisioning the keypair if needed.
    pub async fn export_public_key(&self) -> Result<PublicKeyJwk> {
        Ok(self.ensure_key_pair().await?.public_jwk())
    }

    /// A key-agreement handle on the private key.
    ///
    /// Never generates a keypair: returns `KeyNotFound` on a device that was
    /// never provisioned.
    pub async fn private_key_for_derivation(&self) -> Result<DerivationKey> {
        let bytes = self
            .store
            .get_record(&self.record_name)
            .await?
            .ok_or(StoreError::KeyNotFound)?;
        Ok(DeviceKeyPair::from_bytes(&bytes)?.derivation_key())
    }

    /// Hex fingerprint of the device public key, provisioning if needed.
    pub async fn public_key_fingerprint(&self) -> Result<String> {
        Ok(self.ensure_key_pair().await?.public_key().fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::sqlite::SqliteStore;
    use bytes::Bytes;
    use sealed_push_core::{DevicePublicKey, EphemeralPublicKey, DeviceSecret};

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let keys = KeyStore::new(MemoryStore::new());

        let a = keys.ensure_key_pair().await.unwrap();
        let b = keys.ensure_key_pair().await.unwrap();

        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(keys.store().len(), 1);
    }

    #[tokio::test]
    async fn test_fingerprint_provisions_and_is_stable() {
        let keys = KeyStore::new(MemoryStore::new());
        assert!(keys.store().is_empty());

        let fp = keys.public_key_fingerprint().await.unwrap();
        assert_eq!(keys.store().len(), 1);
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));

        let pair = keys.ensure_key_pair().await.unwrap();
        assert_eq!(fp, pair.public_key().fingerprint());
        assert_eq!(keys.public_key_fingerprint().await.unwrap(), fp);
    }

    #[tokio::test]
    async fn test_private_key_missing_before_provisioning() {
        let keys = KeyStore::new(MemoryStore::new());

        let err = keys.private_key_for_derivation().await.unwrap_err();
        assert!(matches!(err, StoreError::KeyNotFound));
        assert!(!err.is_unavailable());
        // Asking for the private key must not provision one.
        assert!(keys.store().is_empty());
    }

    #[tokio::test]
    async fn test_export_matches_private_key() {
        let keys = KeyStore::new(MemoryStore::new());

        let jwk = keys.export_public_key().await.unwrap();
        let exported = DevicePublicKey::from_jwk(&jwk).unwrap();

        // ECDH with the stored private key must agree with ECDH against the
        // exported public key.
        let peer = DeviceSecret::generate();
        let ours = keys
            .private_key_for_derivation()
            .await
            .unwrap()
            .diffie_hellman(&EphemeralPublicKey::from(peer.public_key()));
        let theirs = peer
            .derivation_key()
            .diffie_hellman(&EphemeralPublicKey::from(exported));

        assert_eq!(ours.as_bytes(), theirs.as_bytes());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_yields_one_keypair() {
        let keys = KeyStore::new(MemoryStore::new());

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let keys = keys.clone();
                tokio::spawn(async move { keys.ensure_key_pair().await.unwrap().public_key() })
            })
            .collect();

        let mut publics = Vec::new();
        for h in handles {
            publics.push(h.await.unwrap());
        }

        assert_eq!(keys.store().len(), 1);
        let persisted = keys.ensure_key_pair().await.unwrap().public_key();
        assert!(publics.iter().all(|pk| *pk == persisted));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_sqlite() {
        let keys = KeyStore::new(SqliteStore::open_memory().unwrap());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let keys = keys.clone();
                tokio::spawn(async move { keys.ensure_key_pair().await.unwrap().public_key() })
            })
            .collect();

        let mut publics = Vec::new();
        for h in handles {
            publics.push(h.await.unwrap());
        }

        let persisted = keys.ensure_key_pair().await.unwrap().public_key();
        assert!(publics.iter().all(|pk| *pk == persisted));
    }

    #[tokio::test]
    async fn test_keypair_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.db");

        let first = {
            let keys = KeyStore::new(SqliteStore::open(&path).unwrap());
            keys.export_public_key().await.unwrap()
        };

        let keys = KeyStore::new(SqliteStore::open(&path).unwrap());
        assert!(keys.private_key_for_derivation().await.is_ok());
        assert_eq!(keys.export_public_key().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_unavailable_not_replaced() {
        let store = MemoryStore::new();
        store
            .put_record_if_absent(DEFAULT_KEY_RECORD, Bytes::from_static(b"\x00corrupt"))
            .await
            .unwrap();
        let keys = KeyStore::new(store);

        let err = keys.ensure_key_pair().await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(
            keys.store().get_record(DEFAULT_KEY_RECORD).await.unwrap().unwrap(),
            Bytes::from_static(b"\x00corrupt")
        );
    }

    #[tokio::test]
    async fn test_custom_record_name() {
        let keys = KeyStore::with_record_name(MemoryStore::new(), "other");
        keys.ensure_key_pair().await.unwrap();

        assert_eq!(keys.record_name(), "other");
        assert!(keys.store().get_record("other").await.unwrap().is_some());
        assert!(keys
            .store()
            .get_record(DEFAULT_KEY_RECORD)
            .await
            .unwrap()
            .is_none());
    }
}
