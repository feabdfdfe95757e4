//! Property-based tests for identity primitives.
//!
//! These tests verify:
//!
//! - Service id parsing never panics and accepts what Display produces
//! - Identity key decoding never panics and ignores padding
//! - The record list aggregates agree with per-record predicates

use proptest::prelude::*;
use uuid::Uuid;

use crate::{IdentityKey, IdentityRecord, IdentityRecordList, ServiceId, VerifiedStatus};

fn arb_status() -> impl Strategy<Value = VerifiedStatus> {
    prop::sample::select(VerifiedStatus::ALL.to_vec())
}

fn arb_record() -> impl Strategy<Value = IdentityRecord> {
    (
        any::<[u8; 16]>(),
        any::<[u8; 32]>(),
        arb_status(),
        any::<bool>(),
        0i64..20_000,
        any::<bool>(),
    )
        .prop_map(|(id, key, status, first_use, age, approved)| IdentityRecord {
            service_id: ServiceId::Aci(Uuid::from_bytes(id)),
            identity_key: IdentityKey::from_public_bytes(key),
            verified_status: status,
            first_use,
            timestamp: 1_000_000 - age,
            nonblocking_approval: approved,
        })
}

proptest! {
    /// Arbitrary text never panics the parser.
    #[test]
    fn service_id_parse_never_panics(s in ".{0,64}") {
        let _ = ServiceId::parse(&s);
    }

    /// Display output of any service id parses back to the same id.
    #[test]
    fn service_id_display_parses(bytes in any::<[u8; 16]>(), pni in any::<bool>()) {
        let uuid = Uuid::from_bytes(bytes);
        let id = if pni { ServiceId::Pni(uuid) } else { ServiceId::Aci(uuid) };
        prop_assert_eq!(ServiceId::parse(&id.to_string()).unwrap(), id);
        prop_assert_eq!(ServiceId::from_binary(&id.to_binary()).unwrap(), id);
    }

    /// Arbitrary bytes never panic the binary parser.
    #[test]
    fn service_id_binary_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..40)) {
        let _ = ServiceId::from_binary(&bytes);
    }

    /// Arbitrary text never panics the key decoder.
    #[test]
    fn identity_key_decode_never_panics(s in "[A-Za-z0-9+/=]{0,60}") {
        let _ = IdentityKey::from_base64(&s);
    }

    /// Only the DJB type byte is accepted.
    #[test]
    fn identity_key_rejects_other_types(ty in any::<u8>(), public in any::<[u8; 32]>()) {
        prop_assume!(ty != crate::DJB_KEY_TYPE);
        let mut bytes = vec![ty];
        bytes.extend_from_slice(&public);
        prop_assert!(IdentityKey::from_bytes(&bytes).is_err());
    }

    /// `is_verified` holds exactly when every record is verified.
    #[test]
    fn record_list_verified_matches_all(records in prop::collection::vec(arb_record(), 0..8)) {
        let expected = !records.is_empty()
            && records.iter().all(|r| r.verified_status.is_verified());
        let list = IdentityRecordList::new(records);
        prop_assert_eq!(list.is_verified(), expected);
    }

    /// Excluding first-use records can only make the list look less unverified.
    #[test]
    fn exclude_first_use_is_monotone(records in prop::collection::vec(arb_record(), 0..8)) {
        let list = IdentityRecordList::new(records);
        prop_assert!(!list.is_unverified(true) || list.is_unverified(false));
        prop_assert_eq!(list.is_unverified(false), !list.unverified_records().is_empty());
    }
}
