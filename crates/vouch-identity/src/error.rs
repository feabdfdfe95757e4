//! Error types for identity operations.

use thiserror::Error;

/// Errors that can occur while parsing or validating identity data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Service identifier could not be parsed.
    #[error("Invalid service id '{value}': {reason}")]
    InvalidServiceId {
        /// The rejected input.
        value: String,
        /// Reason for invalidity.
        reason: String,
    },

    /// Identity key bytes or encoding are malformed.
    #[error("Invalid identity key: {0}")]
    InvalidIdentityKey(String),

    /// Identity key has the wrong length.
    #[error("Invalid identity key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// Unknown verification status name.
    #[error("Unknown verification status: {0}")]
    UnknownVerifiedStatus(String),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
