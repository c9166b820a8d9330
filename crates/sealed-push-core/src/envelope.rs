//! The E2EE envelope carried inside a push message.
//!
//! On the wire an envelope is a JSON object of base64url strings:
//!
//! ```json
//! { "version": 1, "epk": "...", "iv": "...", "salt": "...", "ct": "..." }
//! ```
//!
//! [`EnvelopeFields`] is that raw shape. [`Envelope`] is the decoded form
//! whose field lengths have been checked; nothing cryptographic runs until
//! one has been built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{decode_base64url, encode_base64url, to_fixed};
use crate::crypto::{
    DerivationKey, EphemeralPublicKey, NONCE_LEN, SALT_LEN, TAG_LEN, UNCOMPRESSED_POINT_LEN,
    UNCOMPRESSED_TAG,
};
use crate::error::EnvelopeError;

/// Smallest acceptable ciphertext: one plaintext byte plus the tag.
pub const MIN_CIPHERTEXT_LEN: usize = 1 + TAG_LEN;

/// Envelope exactly as it appears under the `e2ee` key of a push body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeFields {
    /// Format tag. Not branched on yet.
    #[serde(default)]
    pub version: Value,
    pub epk: String,
    pub iv: String,
    pub salt: String,
    pub ct: String,
}

/// A decoded, length-validated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: Value,
    pub epk: [u8; UNCOMPRESSED_POINT_LEN],
    pub iv: [u8; NONCE_LEN],
    pub salt: [u8; SALT_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Decode and validate the wire fields.
    ///
    /// All four fields are decoded before any length is checked, and the
    /// checks run in a fixed order: `epk`, `iv`, `salt`, `ct`.
    pub fn decode(fields: &EnvelopeFields) -> Result<Self, EnvelopeError> {
        let epk = decode_field(&fields.epk, "epk")?;
        let iv = decode_field(&fields.iv, "iv")?;
        let salt = decode_field(&fields.salt, "salt")?;
        let ciphertext = decode_field(&fields.ct, "ct")?;

        let epk: [u8; UNCOMPRESSED_POINT_LEN] =
            to_fixed(&epk, "epk").map_err(|_| EnvelopeError::MalformedEphemeralKey)?;
        if epk[0] != UNCOMPRESSED_TAG {
            return Err(EnvelopeError::MalformedEphemeralKey);
        }

        let iv: [u8; NONCE_LEN] =
            to_fixed(&iv, "iv").map_err(|_| EnvelopeError::InvalidNonceLength {
                expected: NONCE_LEN,
                actual: iv.len(),
            })?;
        let salt: [u8; SALT_LEN] =
            to_fixed(&salt, "salt").map_err(|_| EnvelopeError::InvalidSaltLength {
                expected: SALT_LEN,
                actual: salt.len(),
            })?;

        if ciphertext.len() < MIN_CIPHERTEXT_LEN {
            return Err(EnvelopeError::CiphertextTooShort {
                min: MIN_CIPHERTEXT_LEN,
                actual: ciphertext.len(),
            });
        }

        Ok(Self {
            version: fields.version.clone(),
            epk,
            iv,
            salt,
            ciphertext,
        })
    }

    /// Re-encode to wire fields.
    pub fn to_fields(&self) -> EnvelopeFields {
        EnvelopeFields {
            version: self.version.clone(),
            epk: encode_base64url(&self.epk),
            iv: encode_base64url(&self.iv),
            salt: encode_base64url(&self.salt),
            ct: encode_base64url(&self.ciphertext),
        }
    }

    /// Run key agreement, key derivation and AEAD opening.
    ///
    /// Returns the raw plaintext bytes.
    pub fn open(&self, key: &DerivationKey) -> Result<Vec<u8>, EnvelopeError> {
        let sender = EphemeralPublicKey::from_uncompressed(&self.epk)?;
        let shared = key.diffie_hellman(&sender);
        let content_key = shared.derive_content_key(&self.salt);
        content_key.decrypt(&self.ciphertext, &self.iv)
    }
}

fn decode_field(text: &str, field: &'static str) -> Result<Vec<u8>, EnvelopeError> {
    decode_base64url(text).map_err(|_| EnvelopeError::InvalidEncoding { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DeviceSecret;
    use proptest::prelude::*;

    fn fields(epk: &[u8], iv: &[u8], salt: &[u8], ct: &[u8]) -> EnvelopeFields {
        EnvelopeFields {
            version: Value::from(1),
            epk: encode_base64url(epk),
            iv: encode_base64url(iv),
            salt: encode_base64url(salt),
            ct: encode_base64url(ct),
        }
    }

    fn valid_epk() -> [u8; 65] {
        DeviceSecret::generate().public_key().to_uncompressed()
    }

    #[test]
    fn test_decode_valid() {
        let epk = valid_epk();
        let env = Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 17])).unwrap();

        assert_eq!(env.epk, epk);
        assert_eq!(env.iv, [1; 12]);
        assert_eq!(env.salt, [2; 16]);
        assert_eq!(env.ciphertext.len(), 17);
        assert_eq!(env.version, Value::from(1));
    }

    #[test]
    fn test_bad_base64_reports_field() {
        let mut f = fields(&valid_epk(), &[1; 12], &[2; 16], &[3; 17]);
        f.salt = "***".into();
        assert_eq!(
            Envelope::decode(&f).unwrap_err(),
            EnvelopeError::InvalidEncoding { field: "salt" }
        );
    }

    #[test]
    fn test_encoding_checked_before_lengths() {
        // epk is too short, but ct is not base64 at all: encoding wins.
        let mut f = fields(&[4; 10], &[1; 12], &[2; 16], &[3; 17]);
        f.ct = "!".into();
        assert_eq!(
            Envelope::decode(&f).unwrap_err(),
            EnvelopeError::InvalidEncoding { field: "ct" }
        );
    }

    #[test]
    fn test_epk_wrong_prefix() {
        let mut epk = valid_epk();
        epk[0] = 0x02;
        assert_eq!(
            Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 17])).unwrap_err(),
            EnvelopeError::MalformedEphemeralKey
        );
    }

    #[test]
    fn test_ciphertext_minimum() {
        let epk = valid_epk();
        assert_eq!(
            Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 16])).unwrap_err(),
            EnvelopeError::CiphertextTooShort { min: 17, actual: 16 }
        );
        assert!(Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 17])).is_ok());
    }

    #[test]
    fn test_missing_version_defaults_to_null() {
        let json = serde_json::json!({
            "epk": encode_base64url(&valid_epk()),
            "iv": encode_base64url(&[1; 12]),
            "salt": encode_base64url(&[2; 16]),
            "ct": encode_base64url(&[3; 17]),
        });
        let f: EnvelopeFields = serde_json::from_value(json).unwrap();
        assert_eq!(f.version, Value::Null);
    }

    #[test]
    fn test_off_curve_epk_fails_agreement_on_open() {
        let mut epk = [0u8; 65];
        epk[0] = 0x04;
        let env = Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 17])).unwrap();
        let key = DeviceSecret::generate().derivation_key();
        assert_eq!(env.open(&key).unwrap_err(), EnvelopeError::KeyAgreementFailed);
    }

    proptest! {
        #[test]
        fn test_epk_length_must_be_65(len in 0usize..130) {
            prop_assume!(len != 65);
            let epk = vec![0x04u8; len];
            let r = Envelope::decode(&fields(&epk, &[1; 12], &[2; 16], &[3; 17]));
            prop_assert_eq!(r.unwrap_err(), EnvelopeError::MalformedEphemeralKey);
        }

        #[test]
        fn test_iv_length_must_be_12(len in 0usize..40) {
            prop_assume!(len != 12);
            let r = Envelope::decode(&fields(&valid_epk(), &vec![1; len], &[2; 16], &[3; 17]));
            prop_assert_eq!(
                r.unwrap_err(),
                EnvelopeError::InvalidNonceLength { expected: 12, actual: len }
            );
        }

        #[test]
        fn test_salt_length_must_be_16(len in 0usize..40) {
            prop_assume!(len != 16);
            let r = Envelope::decode(&fields(&valid_epk(), &[1; 12], &vec![2; len], &[3; 17]));
            prop_assert_eq!(
                r.unwrap_err(),
                EnvelopeError::InvalidSaltLength { expected: 16, actual: len }
            );
        }

        #[test]
        fn test_short_ciphertext_rejected(len in 0usize..17) {
            let r = Envelope::decode(&fields(&valid_epk(), &[1; 12], &[2; 16], &vec![3; len]));
            prop_assert_eq!(
                r.unwrap_err(),
                EnvelopeError::CiphertextTooShort { min: 17, actual: len }
            );
        }
    }
}
