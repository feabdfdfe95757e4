//! Provenance of an introduction.
//!
//! A stored introduction remembers who vouched for it. The user may later
//! forget the introducer for privacy, which is irreversible. Rows that never
//! carried provenance (restored from a backup without it) are kept apart
//! from forgotten ones so listings can tell the two cases apart.

use std::fmt;

use serde::{Deserialize, Serialize};
use vouch_identity::ServiceId;

/// Who vouched for an introduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Introducer {
    /// The introducer's service id.
    Known(ServiceId),
    /// The user chose to forget the introducer.
    Forgotten,
    /// The introduction never had a known introducer.
    Undisclosed,
}

impl Introducer {
    /// The introducer's id, if still known.
    pub fn service_id(&self) -> Option<ServiceId> {
        match self {
            Self::Known(id) => Some(*id),
            Self::Forgotten | Self::Undisclosed => None,
        }
    }

    /// Check if the introducer is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Check if the introducer was forgotten.
    pub fn is_forgotten(&self) -> bool {
        matches!(self, Self::Forgotten)
    }

    /// Forget the introducer. Forgotten stays forgotten.
    pub fn forget(&self) -> Self {
        match self {
            Self::Known(_) | Self::Forgotten => Self::Forgotten,
            Self::Undisclosed => Self::Undisclosed,
        }
    }
}

impl fmt::Display for Introducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => write!(f, "{}", id),
            Self::Forgotten => f.write_str("forgotten"),
            Self::Undisclosed => f.write_str("undisclosed"),
        }
    }
}

impl From<ServiceId> for Introducer {
    fn from(id: ServiceId) -> Self {
        Self::Known(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forget_is_one_way() {
        let known = Introducer::Known(ServiceId::random_aci());
        let forgotten = known.forget();
        assert!(forgotten.is_forgotten());
        assert_eq!(forgotten.service_id(), None);
        assert_eq!(forgotten.forget(), Introducer::Forgotten);
    }

    #[test]
    fn test_undisclosed_is_not_forgotten() {
        let undisclosed = Introducer::Undisclosed;
        assert!(!undisclosed.is_forgotten());
        assert_eq!(undisclosed.forget(), Introducer::Undisclosed);
    }

    #[test]
    fn test_display() {
        let id = ServiceId::random_aci();
        assert_eq!(Introducer::Known(id).to_string(), id.to_string());
        assert_eq!(Introducer::Forgotten.to_string(), "forgotten");
    }
}
