//! Property-based tests for vouch-core.
//!
//! These tests verify:
//!
//! - Both parties see the same displayed safety number
//! - A prediction made for one key never matches another key
//! - Start states conflict exactly when the keys differ
//! - Stale states always cascade to `UNVERIFIED`

use proptest::prelude::*;
use uuid::Uuid;
use vouch_identity::{IdentityKey, ServiceId, VerifiedStatus};
use vouch_protocol::IntroductionState;

use crate::safety::SafetyNumber;
use crate::trust::{self, Remaining};

fn arb_party() -> impl Strategy<Value = (ServiceId, IdentityKey)> {
    (any::<[u8; 16]>(), any::<[u8; 32]>()).prop_map(|(id, key)| {
        (
            ServiceId::Aci(Uuid::from_bytes(id)),
            IdentityKey::from_public_bytes(key),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Swapping roles keeps the displayed digits.
    #[test]
    fn display_is_symmetric((a, a_key) in arb_party(), (b, b_key) in arb_party()) {
        let ab = SafetyNumber::for_services(a, a_key, b, b_key);
        let ba = SafetyNumber::for_services(b, b_key, a, a_key);

        prop_assert_eq!(ab.display_digits(), ba.display_digits());
        prop_assert_eq!(ab.display_digits().len(), 60);
        prop_assert!(ab.display_digits().bytes().all(|c| c.is_ascii_digit()));
    }

    /// A substituted introducee key is detected.
    #[test]
    fn substituted_key_mismatches(
        (me, my_key) in arb_party(),
        (them, their_key) in arb_party(),
        forged in any::<[u8; 32]>(),
    ) {
        let forged = IdentityKey::from_public_bytes(forged);
        prop_assume!(forged != their_key);

        let predicted = SafetyNumber::for_services(me, my_key, them, forged)
            .to_predicted()
            .unwrap();
        let actual = SafetyNumber::for_services(me, my_key, them, their_key);
        prop_assert!(!actual.matches(&predicted));
    }
}

proptest! {
    /// Conflicting exactly when a different key is held.
    #[test]
    fn classify_conflicts_on_difference(held in proptest::option::of(any::<[u8; 32]>()), asserted in any::<[u8; 32]>()) {
        let held = held.map(IdentityKey::from_public_bytes);
        let asserted = IdentityKey::from_public_bytes(asserted);

        let state = trust::classify(held.as_ref(), &asserted);
        prop_assert!(state.is_initial());
        prop_assert_eq!(state.is_conflicting(), held.is_some_and(|k| k != asserted));
    }

    /// Stale states cascade to unverified whatever came before.
    #[test]
    fn stale_cascades_to_unverified(
        status in 0usize..VerifiedStatus::ALL.len(),
        state in 0usize..IntroductionState::ALL.len(),
        accepted in any::<bool>(),
        accepted_conflicting in any::<bool>(),
    ) {
        let current = VerifiedStatus::ALL[status];
        let state = IntroductionState::ALL[state];
        let next = trust::next_verification_status(
            current,
            state,
            Remaining { accepted, accepted_conflicting },
        );

        if state.is_stale() {
            prop_assert_eq!(next, VerifiedStatus::Unverified);
        }
        if state == IntroductionState::AcceptedConflicting {
            prop_assert_eq!(next, VerifiedStatus::SuspectedCompromise);
        }
        if state.decision() == vouch_protocol::Decision::Pending && !state.is_stale() {
            prop_assert_eq!(next, current);
        }
    }
}
