//! Error types for the introduction service.

use thiserror::Error;
use vouch_identity::{ServiceId, VerifiedStatus};
use vouch_store::IntroductionId;

use crate::config::ConfigError;
use crate::directory::DirectoryError;

/// Errors that can occur while handling introductions.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Protocol error: a malformed message or payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] vouch_protocol::ProtocolError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Store(#[from] vouch_store::StoreError),

    /// Identity error.
    #[error("Identity error: {0}")]
    Identity(#[from] vouch_identity::IdentityError),

    /// The requested state change is not allowed.
    #[error("{0}")]
    InvalidTransition(#[from] vouch_protocol::TransitionError),

    /// The verification cascade could not be applied.
    ///
    /// Raised when a stale batch or the follow-up status change failed.
    /// Nothing from the aborted step was applied.
    #[error("Verification cascade for {introducee} aborted: {reason}")]
    CascadeInconsistency {
        /// Introducee whose cascade failed.
        introducee: ServiceId,
        /// What went wrong.
        reason: String,
    },

    /// Identity directory error.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// No introduction with this id.
    #[error("Introduction not found: {0}")]
    IntroductionNotFound(IntroductionId),

    /// The contact has no identity key in the directory.
    #[error("Unknown contact: {0}")]
    UnknownContact(ServiceId),

    /// The contact's verification status does not allow this use.
    #[error("Contact {service_id} is not unlocked for {purpose} (status {status})")]
    NotUnlocked {
        /// The contact.
        service_id: ServiceId,
        /// Its current status.
        status: VerifiedStatus,
        /// `"forwarding"` or `"receiving"`.
        purpose: &'static str,
    },

    /// An outbound introduction was malformed.
    #[error("Invalid introduction: {0}")]
    InvalidIntroduction(String),

    /// Fingerprint identifiers of different versions were mixed.
    #[error("Fingerprint identifier versions differ: local v{local}, remote v{remote}")]
    FingerprintVersionMismatch {
        /// Local identifier version.
        local: u8,
        /// Remote identifier version.
        remote: u8,
    },

    /// A receive batch ran out of attempts or time.
    #[error("Receive batch abandoned after {attempts} attempts")]
    BatchAbandoned {
        /// Attempts made.
        attempts: u32,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A background task failed to run to completion.
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl CoreError {
    /// Check if retrying the operation may succeed.
    ///
    /// Storage, directory and cascade failures are transient. Everything
    /// else fails the same way on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Directory(_) | Self::CascadeInconsistency { .. } | Self::TaskFailed(_)
        )
    }
}

/// Result type for introduction service operations.
pub type Result<T> = std::result::Result<T, CoreError>;
