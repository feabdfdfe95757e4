//! Introduction lifecycle.
//!
//! An introduction's state is the product of three axes:
//!
//! - **decision**: pending, accepted or rejected by the user
//! - **conflicting**: the asserted key disagreed with a locally known key
//!   when the introduction was first classified
//! - **stale**: the introducee's real key has since diverged from the
//!   asserted one
//!
//! ```text
//!                 accept                 reject
//!   PENDING ─────────────► ACCEPTED ◄──────────► REJECTED
//!      │                      │       accept        │
//!      └──────────┬───────────┴─────────────────────┘
//!                 │ key change
//!                 ▼
//!           STALE_<same>   (no way out)
//! ```
//!
//! The conflicting axis is fixed at insertion and carried through every
//! transition. Only `Pending` and `PendingConflicting` are initial states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TransitionError;

/// The user's decision on an introduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Not yet decided.
    Pending,
    /// Introduced key is trusted.
    Accepted,
    /// Introduced key is not trusted.
    Rejected,
}

/// State of a stored introduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntroductionState {
    /// Awaiting a decision.
    Pending,
    /// Accepted by the user.
    Accepted,
    /// Rejected by the user.
    Rejected,
    /// Awaiting a decision; asserted key conflicts with the known key.
    PendingConflicting,
    /// Accepted despite a key conflict.
    AcceptedConflicting,
    /// Rejected; asserted key conflicts with the known key.
    RejectedConflicting,
    /// Pending, but the introducee's key has changed since.
    StalePending,
    /// Accepted, but the introducee's key has changed since.
    StaleAccepted,
    /// Rejected, but the introducee's key has changed since.
    StaleRejected,
    /// Pending conflicting, but the introducee's key has changed since.
    StalePendingConflicting,
    /// Accepted conflicting, but the introducee's key has changed since.
    StaleAcceptedConflicting,
    /// Rejected conflicting, but the introducee's key has changed since.
    StaleRejectedConflicting,
}

impl IntroductionState {
    /// Every state, in stable order.
    pub const ALL: [IntroductionState; 12] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::PendingConflicting,
        Self::AcceptedConflicting,
        Self::RejectedConflicting,
        Self::StalePending,
        Self::StaleAccepted,
        Self::StaleRejected,
        Self::StalePendingConflicting,
        Self::StaleAcceptedConflicting,
        Self::StaleRejectedConflicting,
    ];

    /// Assemble a state from its three axes.
    pub fn from_parts(decision: Decision, conflicting: bool, stale: bool) -> Self {
        use Decision::*;
        match (decision, conflicting, stale) {
            (Pending, false, false) => Self::Pending,
            (Accepted, false, false) => Self::Accepted,
            (Rejected, false, false) => Self::Rejected,
            (Pending, true, false) => Self::PendingConflicting,
            (Accepted, true, false) => Self::AcceptedConflicting,
            (Rejected, true, false) => Self::RejectedConflicting,
            (Pending, false, true) => Self::StalePending,
            (Accepted, false, true) => Self::StaleAccepted,
            (Rejected, false, true) => Self::StaleRejected,
            (Pending, true, true) => Self::StalePendingConflicting,
            (Accepted, true, true) => Self::StaleAcceptedConflicting,
            (Rejected, true, true) => Self::StaleRejectedConflicting,
        }
    }

    /// Initial state for a newly classified introduction.
    pub fn initial(conflicting: bool) -> Self {
        Self::from_parts(Decision::Pending, conflicting, false)
    }

    /// The decision axis.
    pub fn decision(&self) -> Decision {
        match self {
            Self::Pending
            | Self::PendingConflicting
            | Self::StalePending
            | Self::StalePendingConflicting => Decision::Pending,
            Self::Accepted
            | Self::AcceptedConflicting
            | Self::StaleAccepted
            | Self::StaleAcceptedConflicting => Decision::Accepted,
            Self::Rejected
            | Self::RejectedConflicting
            | Self::StaleRejected
            | Self::StaleRejectedConflicting => Decision::Rejected,
        }
    }

    /// Check if the asserted key conflicted at classification time.
    pub fn is_conflicting(&self) -> bool {
        matches!(
            self,
            Self::PendingConflicting
                | Self::AcceptedConflicting
                | Self::RejectedConflicting
                | Self::StalePendingConflicting
                | Self::StaleAcceptedConflicting
                | Self::StaleRejectedConflicting
        )
    }

    /// Check if the introducee's key has changed since.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::StalePending
                | Self::StaleAccepted
                | Self::StaleRejected
                | Self::StalePendingConflicting
                | Self::StaleAcceptedConflicting
                | Self::StaleRejectedConflicting
        )
    }

    /// Check if this state may be assigned on insertion.
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Pending | Self::PendingConflicting)
    }

    /// The stale counterpart, preserving the other axes.
    ///
    /// Stale states map to themselves.
    pub fn turned_stale(&self) -> Self {
        Self::from_parts(self.decision(), self.is_conflicting(), true)
    }

    /// Accept this introduction.
    ///
    /// # Errors
    ///
    /// Fails from stale states and from states that are already accepted.
    pub fn accept(&self) -> Result<Self, TransitionError> {
        self.transition_to(Self::from_parts(
            Decision::Accepted,
            self.is_conflicting(),
            false,
        ))
    }

    /// Reject this introduction.
    ///
    /// # Errors
    ///
    /// Fails from stale states and from states that are already rejected.
    pub fn reject(&self) -> Result<Self, TransitionError> {
        self.transition_to(Self::from_parts(
            Decision::Rejected,
            self.is_conflicting(),
            false,
        ))
    }

    /// Validate a single explicit transition to `target`.
    ///
    /// Legal transitions:
    /// - pending or rejected to accepted
    /// - pending or accepted to rejected
    /// - any non-stale state to its stale counterpart
    ///
    /// The conflicting axis never changes, and nothing leaves a stale state.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] for every other pair.
    pub fn transition_to(&self, target: Self) -> Result<Self, TransitionError> {
        let invalid = TransitionError {
            from: *self,
            to: target,
        };

        if self.is_stale() || self.is_conflicting() != target.is_conflicting() {
            return Err(invalid);
        }
        if target.is_stale() {
            return if target == self.turned_stale() {
                Ok(target)
            } else {
                Err(invalid)
            };
        }

        match (self.decision(), target.decision()) {
            (Decision::Pending | Decision::Rejected, Decision::Accepted)
            | (Decision::Pending | Decision::Accepted, Decision::Rejected) => Ok(target),
            _ => Err(invalid),
        }
    }

    /// Stable name used in logs, files and the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::PendingConflicting => "PENDING_CONFLICTING",
            Self::AcceptedConflicting => "ACCEPTED_CONFLICTING",
            Self::RejectedConflicting => "REJECTED_CONFLICTING",
            Self::StalePending => "STALE_PENDING",
            Self::StaleAccepted => "STALE_ACCEPTED",
            Self::StaleRejected => "STALE_REJECTED",
            Self::StalePendingConflicting => "STALE_PENDING_CONFLICTING",
            Self::StaleAcceptedConflicting => "STALE_ACCEPTED_CONFLICTING",
            Self::StaleRejectedConflicting => "STALE_REJECTED_CONFLICTING",
        }
    }

    /// Look up a state by its [`as_str`](Self::as_str) name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for IntroductionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_covers_all_states() {
        for state in IntroductionState::ALL {
            let rebuilt =
                IntroductionState::from_parts(state.decision(), state.is_conflicting(), state.is_stale());
            assert_eq!(rebuilt, state);
        }
    }

    #[test]
    fn test_only_pending_states_are_initial() {
        let initial: Vec<_> = IntroductionState::ALL
            .iter()
            .filter(|s| s.is_initial())
            .copied()
            .collect();
        assert_eq!(
            initial,
            vec![
                IntroductionState::Pending,
                IntroductionState::PendingConflicting
            ]
        );
        assert_eq!(IntroductionState::initial(false), IntroductionState::Pending);
        assert_eq!(
            IntroductionState::initial(true),
            IntroductionState::PendingConflicting
        );
    }

    #[test]
    fn test_accept_reject_accept() {
        let state = IntroductionState::Pending;
        let state = state.accept().unwrap();
        assert_eq!(state, IntroductionState::Accepted);
        let state = state.reject().unwrap();
        assert_eq!(state, IntroductionState::Rejected);
        let state = state.accept().unwrap();
        assert_eq!(state, IntroductionState::Accepted);
    }

    #[test]
    fn test_conflicting_follows_plain_transitions() {
        let state = IntroductionState::PendingConflicting.accept().unwrap();
        assert_eq!(state, IntroductionState::AcceptedConflicting);
        let state = state.reject().unwrap();
        assert_eq!(state, IntroductionState::RejectedConflicting);
    }

    #[test]
    fn test_repeat_decision_is_invalid() {
        assert!(IntroductionState::Accepted.accept().is_err());
        assert!(IntroductionState::Rejected.reject().is_err());
    }

    #[test]
    fn test_no_transition_out_of_stale() {
        for state in IntroductionState::ALL.iter().filter(|s| s.is_stale()) {
            let err = state.accept().unwrap_err();
            assert_eq!(err.from, *state);
            assert!(state.reject().is_err());
            assert!(state.transition_to(state.turned_stale()).is_err());
        }
    }

    #[test]
    fn test_turned_stale_preserves_axes() {
        for state in IntroductionState::ALL.iter().filter(|s| !s.is_stale()) {
            let stale = state.turned_stale();
            assert!(stale.is_stale());
            assert_eq!(stale.decision(), state.decision());
            assert_eq!(stale.is_conflicting(), state.is_conflicting());
            assert_eq!(state.transition_to(stale), Ok(stale));
        }
        assert_eq!(
            IntroductionState::StaleAccepted.turned_stale(),
            IntroductionState::StaleAccepted
        );
    }

    #[test]
    fn test_cannot_return_to_pending_or_switch_conflict() {
        assert!(IntroductionState::Accepted
            .transition_to(IntroductionState::Pending)
            .is_err());
        assert!(IntroductionState::Pending
            .transition_to(IntroductionState::AcceptedConflicting)
            .is_err());
        assert!(IntroductionState::Pending
            .transition_to(IntroductionState::StaleAccepted)
            .is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for state in IntroductionState::ALL {
            assert_eq!(IntroductionState::from_name(state.as_str()), Some(state));
        }
        assert_eq!(
            IntroductionState::from_name("stale_pending"),
            Some(IntroductionState::StalePending)
        );
        assert_eq!(IntroductionState::from_name("VERIFIED"), None);
    }

    #[test]
    fn test_transition_error_display() {
        let err = IntroductionState::StalePending.accept().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid introduction state transition: STALE_PENDING -> ACCEPTED"
        );
    }
}
