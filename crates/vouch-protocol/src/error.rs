//! Error types for protocol operations.

use thiserror::Error;

use crate::IntroductionState;

/// Errors that can occur while encoding or decoding introductions.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Body carries the marker but the payload is not valid.
    #[error("Malformed introduction: {0}")]
    Malformed(String),

    /// A payload field failed validation.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// Reason for invalidity.
        reason: String,
    },

    /// Introduction carries no introducees.
    #[error("Introduction contains no introducees")]
    Empty,

    /// Input exceeds a protocol limit.
    #[error("{what} too large: {actual} exceeds limit of {max}")]
    TooLarge {
        /// What was measured.
        what: &'static str,
        /// Measured size.
        actual: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Serialization failed while encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// A state change that the lifecycle does not allow.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid introduction state transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current state.
    pub from: IntroductionState,
    /// Requested state.
    pub to: IntroductionState,
}
