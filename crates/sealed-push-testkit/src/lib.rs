//! # Sealed Push Testkit
//!
//! Testing utilities for Sealed Push.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Test sender**: Seals payloads to a device public key the way an
//!   application server would
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Provisioned test devices and push body helpers
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sealed_push_core::DeviceSecret;
//! use sealed_push_testkit::fixtures::TestSender;
//!
//! let device = DeviceSecret::generate();
//! let fields = TestSender::new().seal(&device.public_key(), br#"{"title":"Hi"}"#);
//! assert!(!fields.ct.is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealed_push_testkit::generators::notification_json;
//!
//! proptest! {
//!     #[test]
//!     fn sealed_payloads_open(payload in notification_json()) {
//!         // seal, then open with the device key
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{flip_tag_bit, push_body, secret_from_hex, TestDevice, TestSender};
