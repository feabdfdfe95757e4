//! # vouch-protocol
//!
//! Protocol definitions for trusted introductions.
//!
//! Provides:
//! - The twelve-state introduction lifecycle and its legal transitions
//! - Introducer provenance (known, forgotten, undisclosed)
//! - The wire format tunneled through ordinary message bodies
//! - Size limits applied to untrusted input
//!
//! ## Wire Format
//!
//! An introduction message is a fixed marker line, a separator, and a JSON
//! array of introducees:
//!
//! ```
//! use vouch_protocol::message;
//!
//! // Ordinary text is not an introduction and is not an error.
//! assert!(message::decode("see you at 8").unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod introducer;
pub mod limits;
pub mod message;
pub mod state;

#[cfg(test)]
mod proptests;

pub use error::{ProtocolError, Result, TransitionError};
pub use introducer::Introducer;
pub use message::{IntroduceePayload, PredictedFingerprint, MARKER, SEPARATOR};
pub use state::{Decision, IntroductionState};
