//! The persisted device keypair record.
//!
//! Stored as CBOR under a single fixed record name:
//!
//! ```text
//! { version: 1, secret: <32-byte scalar>, public: <65-byte SEC1 point>, created_at: <unix ms> }
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use sealed_push_core::codec::to_fixed;
use sealed_push_core::{
    validate_fixed_length, DerivationKey, DevicePublicKey, DeviceSecret, PublicKeyJwk,
    UNCOMPRESSED_POINT_LEN,
};

use crate::error::{Result, StoreError};

/// Record format version.
pub const RECORD_VERSION: u8 = 1;

/// The device's long-lived P-256 keypair.
#[derive(Debug)]
pub struct DeviceKeyPair {
    secret: DeviceSecret,
    public: DevicePublicKey,
    created_at: i64,
}

#[derive(Serialize, Deserialize)]
struct StoredKeyPair {
    version: u8,
    secret: Vec<u8>,
    public: Vec<u8>,
    created_at: i64,
}

impl DeviceKeyPair {
    /// Generate a fresh keypair.
    pub fn generate(created_at: i64) -> Self {
        let secret = DeviceSecret::generate();
        let public = secret.public_key();
        Self {
            secret,
            public,
            created_at,
        }
    }

    /// The public half.
    pub fn public_key(&self) -> DevicePublicKey {
        self.public
    }

    /// The public half as a JSON Web Key.
    pub fn public_jwk(&self) -> PublicKeyJwk {
        self.public.to_jwk()
    }

    /// A key-agreement-only handle on the private half.
    pub fn derivation_key(&self) -> DerivationKey {
        self.secret.derivation_key()
    }

    /// When the keypair was generated (Unix ms).
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let stored = StoredKeyPair {
            version: RECORD_VERSION,
            secret: self.secret.to_bytes().to_vec(),
            public: self.public.to_uncompressed().to_vec(),
            created_at: self.created_at,
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&stored, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    /// Deserialize from CBOR bytes.
    ///
    /// The stored public key must match the one derived from the secret.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let stored: StoredKeyPair =
            ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))?;

        if stored.version != RECORD_VERSION {
            return Err(StoreError::InvalidData(format!(
                "unsupported key record version: {}",
                stored.version
            )));
        }

        let secret_bytes: [u8; 32] = to_fixed(&stored.secret, "secret")
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let public_bytes = validate_fixed_length(stored.public, UNCOMPRESSED_POINT_LEN, "public")
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let secret = DeviceSecret::from_bytes(&secret_bytes)?;
        let public = DevicePublicKey::from_sec1_bytes(&public_bytes)?;

        if secret.public_key() != public {
            return Err(StoreError::InvalidData(
                "stored public key does not match secret".into(),
            ));
        }

        Ok(Self {
            secret,
            public,
            created_at: stored.created_at,
        })
    }
}
