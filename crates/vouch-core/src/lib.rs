//! # vouch-core
//!
//! Trusted introductions: receive, store and act on vouches for contacts'
//! identity keys.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vouch_core::{InMemoryDirectory, IntroductionService, LocalIdentity, TrustConfig};
//!
//! let directory = Arc::new(InMemoryDirectory::new());
//! let service = IntroductionService::open(TrustConfig::in_memory(), directory, local)?;
//!
//! // An incoming message from `alice`
//! service.receive_message(alice, &body, timestamp).await?;
//!
//! // The user trusts the first introduction
//! let first = service.all_displayable().next().unwrap()?;
//! service.accept(first.id).await?;
//! ```
//!
//! ## Introduction States
//!
//! Every introduction has a decision (pending, accepted, rejected), may
//! conflict with the key we already hold for the introducee, and turns
//! stale once the introducee's key changes. See
//! [`IntroductionState`](vouch_protocol::IntroductionState).
//!
//! ## Safety Numbers
//!
//! The introducer predicts the safety number the receiver will see with
//! the introducee. [`SafetyNumber`] computes it independently:
//!
//! ```
//! use vouch_core::safety::{FingerprintParty, SafetyNumber};
//! use vouch_identity::{IdentityKey, ServiceId};
//!
//! let me = FingerprintParty::service(ServiceId::random_aci(), IdentityKey::from_public_bytes([1; 32]));
//! let carol = FingerprintParty::service(ServiceId::random_aci(), IdentityKey::from_public_bytes([2; 32]));
//!
//! let number = SafetyNumber::compute(&me, &carol).unwrap();
//! println!("Verify: {}", number);
//! println!("QR: {}", number.to_qr_string());
//! ```
//!
//! ## Architecture
//!
//! - **IntroductionService**: applies decisions, key changes and inbound
//!   messages on a bounded worker pool, one introducee at a time
//! - **IdentityDirectory**: the host's store of contacts' keys and status
//! - **trust**: start states and the verification status cascade

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod directory;
pub mod error;
pub mod internal;
pub mod outbound;
pub mod safety;
pub mod service;
pub mod trust;

#[cfg(test)]
mod proptests;

pub use batch::ReceiveBatch;
pub use config::{
    ConfigError, JobConfig, StorageConfig, TrustConfig, TrustConfigBuilder, VerificationConfig,
    WorkerConfig,
};
pub use directory::{
    Contact, DirectoryError, DirectoryResult, IdentityDirectory, InMemoryDirectory, StatusChange,
};
pub use error::{CoreError, Result};
pub use outbound::{OutboundContact, OutboundIntroduction};
pub use safety::{FingerprintParty, SafetyNumber, StableIdentifier};
pub use service::{FingerprintCheck, IntroductionService, LocalIdentity, ReceiveOutcome};

// Re-export commonly used types
pub use vouch_identity::{IdentityKey, IdentityRecord, ServiceId, VerifiedStatus};
pub use vouch_protocol::{Introducer, IntroductionState};
pub use vouch_store::{Introduction, IntroductionId, IntroductionStore};
