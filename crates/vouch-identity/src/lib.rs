//! # vouch-identity
//!
//! Identity primitives shared by every Vouch crate.
//!
//! Provides:
//! - Service identifiers (ACI and PNI) with their string and binary forms
//! - Serialized identity keys and their base64 transport encoding
//! - Verification statuses, including the introduction-derived ones
//! - Identity records and the aggregate record list used by verification UIs

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod identity_key;
pub mod record;
pub mod service_id;
pub mod verified;

#[cfg(test)]
mod proptests;

pub use error::{IdentityError, Result};
pub use identity_key::{IdentityKey, DJB_KEY_TYPE, IDENTITY_KEY_LEN, PUBLIC_KEY_LEN};
pub use record::{IdentityRecord, IdentityRecordList, DEFAULT_UNTRUSTED_WINDOW};
pub use service_id::ServiceId;
pub use verified::{BasicVerifiedStatus, VerifiedStatus};
