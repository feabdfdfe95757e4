//! Error types for storage operations.

use thiserror::Error;
use vouch_protocol::IntroductionState;

use crate::IntroductionId;

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Introduction does not exist.
    #[error("Introduction not found: {0}")]
    NotFound(IntroductionId),

    /// Row no longer holds the state the caller read.
    #[error("Introduction {id} changed concurrently: expected {expected}, found {actual}")]
    StateChanged {
        /// The introduction.
        id: IntroductionId,
        /// State the caller expected.
        expected: IntroductionState,
        /// State actually stored.
        actual: IntroductionState,
    },

    /// State is not allowed for this operation.
    #[error("State {state} not allowed: {reason}")]
    InvalidState {
        /// The rejected state.
        state: IntroductionState,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Backup was written by an unsupported version.
    #[error("Unsupported backup version {found}, expected {expected}")]
    UnsupportedBackupVersion {
        /// Version in the backup.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
