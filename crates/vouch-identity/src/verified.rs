//! Verification statuses.
//!
//! Besides the basic default/verified/unverified triple, a contact can be
//! verified through introductions. The extra statuses encode how the
//! verification was reached:
//!
//! - `DirectlyVerified`: safety number compared in person
//! - `Introduced`: vouched for by an accepted introduction
//! - `DuplexVerified`: both of the above
//! - `SuspectedCompromise`: an accepted introduction conflicts with the
//!   key we know
//!
//! Devices that do not understand introductions only ever see the
//! [`BasicVerifiedStatus`] projection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{IdentityError, Result};

/// Verification status of a contact's identity key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifiedStatus {
    /// Never verified, never flagged.
    #[default]
    Default,
    /// Marked verified by the user without comparing safety numbers.
    ManuallyVerified,
    /// Verification was revoked or the key changed.
    Unverified,
    /// Safety number compared directly.
    DirectlyVerified,
    /// Vouched for by an accepted introduction.
    Introduced,
    /// Directly verified and vouched for by an introduction.
    DuplexVerified,
    /// An accepted introduction asserts a different key.
    SuspectedCompromise,
}

/// Status understood by clients without introduction support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasicVerifiedStatus {
    /// Never verified.
    Default,
    /// Verified.
    Verified,
    /// Verification revoked.
    Unverified,
}

impl VerifiedStatus {
    /// Every status, in stable order.
    pub const ALL: [VerifiedStatus; 7] = [
        Self::Default,
        Self::ManuallyVerified,
        Self::Unverified,
        Self::DirectlyVerified,
        Self::Introduced,
        Self::DuplexVerified,
        Self::SuspectedCompromise,
    ];

    /// Check if the contact counts as verified.
    pub fn is_verified(&self) -> bool {
        matches!(
            self,
            Self::DirectlyVerified | Self::Introduced | Self::DuplexVerified | Self::ManuallyVerified
        )
    }

    /// Check if the contact may be forwarded to others as an introducee.
    ///
    /// Only directly compared keys can be vouched for; second-hand trust
    /// is never passed on.
    pub fn forward_unlocked(&self) -> bool {
        matches!(self, Self::DirectlyVerified | Self::DuplexVerified)
    }

    /// Check if the contact may receive introductions from us.
    pub fn recipient_unlocked(&self) -> bool {
        matches!(
            self,
            Self::DirectlyVerified | Self::DuplexVerified | Self::Introduced
        )
    }

    /// Check if the verification involved a safety number comparison,
    /// first or second hand.
    pub fn strongly_verified(&self) -> bool {
        matches!(
            self,
            Self::DirectlyVerified | Self::DuplexVerified | Self::Introduced
        )
    }

    /// Project onto the basic status triple.
    pub fn to_basic(&self) -> BasicVerifiedStatus {
        match self {
            Self::Default => BasicVerifiedStatus::Default,
            Self::Unverified | Self::SuspectedCompromise => BasicVerifiedStatus::Unverified,
            Self::ManuallyVerified
            | Self::DirectlyVerified
            | Self::Introduced
            | Self::DuplexVerified => BasicVerifiedStatus::Verified,
        }
    }

    /// Stable name used in logs and files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::ManuallyVerified => "MANUALLY_VERIFIED",
            Self::Unverified => "UNVERIFIED",
            Self::DirectlyVerified => "DIRECTLY_VERIFIED",
            Self::Introduced => "INTRODUCED",
            Self::DuplexVerified => "DUPLEX_VERIFIED",
            Self::SuspectedCompromise => "SUSPECTED_COMPROMISE",
        }
    }
}

impl fmt::Display for VerifiedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerifiedStatus {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| IdentityError::UnknownVerifiedStatus(s.to_string()))
    }
}
