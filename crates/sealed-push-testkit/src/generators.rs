//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

use sealed_push_core::{DeviceSecret, NONCE_LEN, SALT_LEN, UNCOMPRESSED_POINT_LEN};

/// Generate a valid device secret.
pub fn device_secret() -> impl Strategy<Value = DeviceSecret> {
    any::<[u8; 32]>().prop_filter_map("scalar must be in range", |b| {
        DeviceSecret::from_bytes(&b).ok()
    })
}

/// Generate a notification payload object.
pub fn notification_json() -> impl Strategy<Value = Value> {
    (
        "[ -~]{0,40}",
        "[ -~]{0,200}",
        proptest::option::of("/[a-z]{1,12}"),
    )
        .prop_map(|(title, body, url)| match url {
            Some(url) => json!({ "title": title, "body": body, "url": url }),
            None => json!({ "title": title, "body": body }),
        })
}

/// Byte strings of any length in `0..max_len` except `exclude`.
pub fn bytes_not_of_len(exclude: usize, max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len).prop_filter("length excluded", move |v| {
        v.len() != exclude
    })
}

/// An `epk` that is the right length but lacks the uncompressed-point tag.
pub fn untagged_epk() -> impl Strategy<Value = Vec<u8>> {
    (
        any::<u8>().prop_filter("not 0x04", |b| *b != 0x04),
        prop::collection::vec(any::<u8>(), UNCOMPRESSED_POINT_LEN - 1),
    )
        .prop_map(|(first, rest)| {
            let mut v = Vec::with_capacity(UNCOMPRESSED_POINT_LEN);
            v.push(first);
            v.extend_from_slice(&rest);
            v
        })
}

/// A nonce of the wrong length.
pub fn bad_nonce() -> impl Strategy<Value = Vec<u8>> {
    bytes_not_of_len(NONCE_LEN, 40)
}

/// A salt of the wrong length.
pub fn bad_salt() -> impl Strategy<Value = Vec<u8>> {
    bytes_not_of_len(SALT_LEN, 40)
}

/// A bit index inside the 128-bit authentication tag.
pub fn tag_bit() -> impl Strategy<Value = usize> {
    0usize..128
}
