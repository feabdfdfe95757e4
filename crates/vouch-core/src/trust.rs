//! Trust decisions.
//!
//! Pure functions deciding the start state of a new introduction and how a
//! state change moves the introducee's verification status. The service
//! applies them; nothing here touches storage.

use vouch_identity::{IdentityKey, VerifiedStatus};
use vouch_protocol::IntroductionState;

/// Start state for an introduction asserting `asserted`, given the key we
/// hold for the introducee, if any.
pub fn classify(local_key: Option<&IdentityKey>, asserted: &IdentityKey) -> IntroductionState {
    let conflicting = local_key.is_some_and(|key| key != asserted);
    IntroductionState::initial(conflicting)
}

/// What remains for an introducee after a state change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Remaining {
    /// Some introduction is `ACCEPTED`.
    pub accepted: bool,
    /// Some introduction is `ACCEPTED_CONFLICTING`.
    pub accepted_conflicting: bool,
}

/// Verification status after an introduction moved to `new_state`.
pub fn next_verification_status(
    current: VerifiedStatus,
    new_state: IntroductionState,
    remaining: Remaining,
) -> VerifiedStatus {
    use IntroductionState as S;
    use VerifiedStatus as V;

    if new_state.is_stale() {
        return V::Unverified;
    }

    match new_state {
        S::Accepted => match current {
            V::DirectlyVerified | V::DuplexVerified => V::DuplexVerified,
            V::SuspectedCompromise => V::SuspectedCompromise,
            _ => V::Introduced,
        },
        S::Rejected => match current {
            V::DuplexVerified if remaining.accepted => V::DuplexVerified,
            V::DuplexVerified => V::DirectlyVerified,
            V::Introduced if remaining.accepted => V::Introduced,
            V::Introduced => V::Unverified,
            other => other,
        },
        S::AcceptedConflicting => V::SuspectedCompromise,
        S::RejectedConflicting => match current {
            V::SuspectedCompromise if remaining.accepted_conflicting => V::SuspectedCompromise,
            V::SuspectedCompromise if remaining.accepted => V::Introduced,
            V::SuspectedCompromise => V::Unverified,
            other => other,
        },
        _ => current,
    }
}
