//! Binary/text helpers: base64url and fixed-length buffer checks.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::CodecError;

/// URL-safe alphabet that accepts input with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode URL-safe base64, padded or not.
pub fn decode_base64url(text: &str) -> Result<Vec<u8>, CodecError> {
    URL_SAFE_LENIENT
        .decode(text.as_bytes())
        .map_err(|e| CodecError::InvalidEncoding(e.to_string()))
}

/// Encode as URL-safe base64 without padding.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Check that `bytes` is exactly `expected` long.
pub fn validate_fixed_length(
    bytes: Vec<u8>,
    expected: usize,
    field: &'static str,
) -> Result<Vec<u8>, CodecError> {
    if bytes.len() != expected {
        return Err(CodecError::InvalidFieldLength {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Like [`validate_fixed_length`] but yields an array.
pub fn to_fixed<const N: usize>(bytes: &[u8], field: &'static str) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::InvalidFieldLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}
