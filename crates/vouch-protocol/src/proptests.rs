//! Property-based tests for the protocol.
//!
//! These tests verify:
//!
//! - Decoding arbitrary input never panics
//! - Text without the marker is never treated as an introduction
//! - Well-formed introducee lists survive encoding
//! - Accept/reject sequences keep the conflicting axis and never go stale

use proptest::prelude::*;
use uuid::Uuid;
use vouch_identity::{IdentityKey, ServiceId};

use crate::message::{self, IntroduceePayload, PredictedFingerprint, MARKER, SEPARATOR};
use crate::{Decision, IntroductionState};

fn arb_payload() -> impl Strategy<Value = IntroduceePayload> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,30}",
        proptest::option::of("\\+[0-9]{6,15}"),
        any::<[u8; 16]>(),
        any::<[u8; 32]>(),
        "[0-9]{60}",
    )
        .prop_map(|(name, number, service_id, key, digits)| IntroduceePayload {
            name,
            number,
            service_id: ServiceId::Aci(Uuid::from_bytes(service_id)),
            identity_key: IdentityKey::from_public_bytes(key),
            predicted_fingerprint: PredictedFingerprint::new(&digits).expect("60 digits"),
        })
}

proptest! {
    /// Arbitrary text after the marker never panics the decoder.
    #[test]
    fn decode_never_panics(tail in ".{0,512}") {
        let body = format!("{}{}{}", MARKER, SEPARATOR, tail);
        let _ = message::decode(&body);
    }

    /// Text that does not lead with the marker is ignored.
    #[test]
    fn unmarked_text_ignored(text in "[^Q\\s].{0,256}") {
        prop_assert!(message::decode(&text).unwrap().is_none());
    }

    /// Non-empty lists of valid introducees survive encoding.
    #[test]
    fn encode_then_decode(payloads in prop::collection::vec(arb_payload(), 1..8)) {
        let body = message::encode(&payloads).unwrap();
        prop_assert_eq!(message::decode(&body).unwrap(), Some(payloads));
    }

    /// Any accept/reject sequence keeps the state fresh and its conflict flag.
    #[test]
    fn decisions_preserve_conflict(conflicting in any::<bool>(), ops in prop::collection::vec(any::<bool>(), 0..20)) {
        let mut state = IntroductionState::initial(conflicting);
        for accept in ops {
            let next = if accept { state.accept() } else { state.reject() };
            match next {
                Ok(next) => {
                    prop_assert_eq!(next.decision(), if accept { Decision::Accepted } else { Decision::Rejected });
                    state = next;
                }
                Err(err) => prop_assert_eq!(err.from, state),
            }
            prop_assert!(!state.is_stale());
            prop_assert_eq!(state.is_conflicting(), conflicting);
        }
    }
}
