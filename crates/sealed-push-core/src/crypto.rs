//! Cryptographic primitives for envelope opening.
//!
//! P-256 ECDH for key agreement, HKDF-SHA-256 for key derivation and
//! AES-256-GCM for authenticated decryption.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{EncodedPoint, FieldBytes, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::codec::{decode_base64url, encode_base64url, to_fixed};
use crate::error::{EnvelopeError, KeyError};

/// Length of an uncompressed SEC1 P-256 point.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// SEC1 tag byte for an uncompressed point.
pub const UNCOMPRESSED_TAG: u8 = 0x04;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// HKDF salt length carried in each envelope.
pub const SALT_LEN: usize = 16;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// JWK curve identifier.
pub const JWK_CURVE: &str = "P-256";

/// JWK key type for elliptic-curve keys.
pub const JWK_KEY_TYPE: &str = "EC";

/// A device's long-lived P-256 secret.
///
/// Only the key store should hold one of these; everything else gets a
/// [`DerivationKey`].
pub struct DeviceSecret(SecretKey);

impl DeviceSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        Self(SecretKey::random(&mut rand::thread_rng()))
    }

    /// Restore from the 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        SecretKey::from_bytes(FieldBytes::from_slice(bytes))
            .map(Self)
            .map_err(|_| KeyError::InvalidSecret)
    }

    /// The 32-byte scalar, for persistence only.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    /// Derive the public half.
    pub fn public_key(&self) -> DevicePublicKey {
        DevicePublicKey(self.0.public_key())
    }

    /// Hand out a key-agreement-only handle.
    pub fn derivation_key(&self) -> DerivationKey {
        DerivationKey(self.0.clone())
    }
}

impl fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceSecret").field(&"<redacted>").finish()
    }
}

/// A device's P-256 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePublicKey(PublicKey);

impl DevicePublicKey {
    /// Parse an uncompressed (or compressed) SEC1 point.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
    }

    /// The 65-byte uncompressed SEC1 encoding.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Export as a JSON Web Key.
    pub fn to_jwk(&self) -> PublicKeyJwk {
        let point = self.0.to_encoded_point(false);
        // Uncompressed, non-identity points always carry both coordinates.
        let bytes = point.as_bytes();
        PublicKeyJwk {
            kty: JWK_KEY_TYPE.to_string(),
            crv: JWK_CURVE.to_string(),
            x: encode_base64url(&bytes[1..33]),
            y: encode_base64url(&bytes[33..65]),
        }
    }

    /// Import from a JSON Web Key.
    pub fn from_jwk(jwk: &PublicKeyJwk) -> Result<Self, KeyError> {
        if jwk.kty != JWK_KEY_TYPE {
            return Err(KeyError::InvalidPublicKey(format!("kty {}", jwk.kty)));
        }
        if jwk.crv != JWK_CURVE {
            return Err(KeyError::UnsupportedCurve(jwk.crv.clone()));
        }
        let x: [u8; 32] = to_fixed(&decode_base64url(&jwk.x)?, "x")?;
        let y: [u8; 32] = to_fixed(&decode_base64url(&jwk.y)?, "y")?;

        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&x),
            FieldBytes::from_slice(&y),
            false,
        );
        Option::<PublicKey>::from(PublicKey::from_encoded_point(&point))
            .map(Self)
            .ok_or_else(|| KeyError::InvalidPublicKey("point not on curve".into()))
    }

    /// Short hex fingerprint of the uncompressed point (first 8 bytes of SHA-256).
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_uncompressed());
        hex::encode(&digest[..8])
    }

    pub(crate) fn as_inner(&self) -> &PublicKey {
        &self.0
    }
}

/// Public key in JSON Web Key form: `{ kty, crv, x, y }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

/// A private key handle that can only perform key agreement.
pub struct DerivationKey(SecretKey);

impl DerivationKey {
    /// ECDH with a peer's public key.
    pub fn diffie_hellman(&self, peer: &EphemeralPublicKey) -> SharedKey {
        let shared = p256::ecdh::diffie_hellman(self.0.to_nonzero_scalar(), peer.0.as_affine());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(shared.raw_secret_bytes());
        SharedKey(bytes)
    }
}

impl fmt::Debug for DerivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivationKey").field(&"<redacted>").finish()
    }
}

/// A sender's one-time public key, imported from an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemeralPublicKey(PublicKey);

impl EphemeralPublicKey {
    /// Import a 65-byte uncompressed point.
    ///
    /// Fails with `KeyAgreementFailed` when the point is not on P-256.
    pub fn from_uncompressed(bytes: &[u8; UNCOMPRESSED_POINT_LEN]) -> Result<Self, EnvelopeError> {
        PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| EnvelopeError::KeyAgreementFailed)
    }
}

impl From<DevicePublicKey> for EphemeralPublicKey {
    fn from(pk: DevicePublicKey) -> Self {
        Self(*pk.as_inner())
    }
}

/// Raw 256-bit ECDH output. Zeroized on drop.
pub struct SharedKey([u8; 32]);

impl SharedKey {
    /// Wrap raw shared-secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// HKDF-SHA-256 with the envelope salt and an empty info string.
    pub fn derive_content_key(&self, salt: &[u8; SALT_LEN]) -> ContentKey {
        let hk = Hkdf::<Sha256>::new(Some(&salt[..]), &self.0);
        let mut okm = [0u8; 32];
        hk.expand(&[], &mut okm)
            .expect("32-byte HKDF-SHA-256 output is within limits");
        ContentKey(okm)
    }
}

impl Drop for SharedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// AES-256-GCM content key. Zeroized on drop.
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Seal `plaintext`; output is ciphertext followed by the 16-byte tag.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN]) -> Vec<u8> {
        let cipher = Aes256Gcm::new(&self.0.into());
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .expect("encryption should not fail with valid key")
    }

    /// Open `ciphertext || tag`. Every failure collapses to `DecryptionFailed`.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, EnvelopeError> {
        let cipher = Aes256Gcm::new(&self.0.into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EnvelopeError::DecryptionFailed)
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
