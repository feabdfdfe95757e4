//! Property-based tests for the introduction store.
//!
//! These tests verify:
//!
//! - Redelivery never creates duplicate rows
//! - A refreshed row carries the last delivery's timestamp
//! - Stale batches preserve each row's decision and conflict flag

use std::collections::HashMap;

use proptest::prelude::*;
use uuid::Uuid;
use vouch_identity::{IdentityKey, ServiceId};
use vouch_protocol::{Introducer, IntroductionState, PredictedFingerprint};

use crate::{IncomingIntroduction, IntroductionStore};

fn incoming(introducer: u8, introducee: u8, key: u8, timestamp: i64) -> IncomingIntroduction {
    IncomingIntroduction {
        introducer: Introducer::Known(ServiceId::Aci(Uuid::from_bytes([introducer; 16]))),
        introducee_service_id: ServiceId::Aci(Uuid::from_bytes([introducee.wrapping_add(100); 16])),
        introducee_name: format!("contact-{}", introducee),
        introducee_number: None,
        introducee_identity_key: IdentityKey::from_public_bytes([key; 32]),
        predicted_fingerprint: PredictedFingerprint::new(&"3".repeat(60)).expect("60 digits"),
        timestamp,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Row count equals the number of distinct natural keys delivered.
    #[test]
    fn redelivery_is_idempotent(deliveries in prop::collection::vec((0u8..3, 0u8..3, 0u8..2, 0i64..1_000), 1..30)) {
        let store = IntroductionStore::temporary().unwrap();
        let mut last_seen: HashMap<(u8, u8, u8), i64> = HashMap::new();

        for (introducer, introducee, key, ts) in deliveries {
            store
                .insert_or_refresh(&incoming(introducer, introducee, key, ts), IntroductionState::Pending)
                .unwrap();
            last_seen.insert((introducer, introducee, key), ts);
        }

        prop_assert_eq!(store.len(), last_seen.len());
        for ((introducer, introducee, key), ts) in last_seen {
            let probe = incoming(introducer, introducee, key, 0);
            let id = store.find_duplicate(&probe).unwrap().unwrap();
            prop_assert_eq!(store.get(id).unwrap().unwrap().timestamp, ts);
        }
    }

    /// Turning rows stale keeps every other axis.
    #[test]
    fn mark_stale_preserves_axes(decisions in prop::collection::vec((any::<bool>(), 0u8..3), 1..10)) {
        let store = IntroductionStore::temporary().unwrap();
        let mut ids = Vec::new();

        for (i, (conflicting, decision)) in decisions.iter().enumerate() {
            let initial = IntroductionState::initial(*conflicting);
            let id = store
                .insert_or_refresh(&incoming(i as u8, 0, 0, i as i64), initial)
                .unwrap()
                .id();
            let target = match decision {
                0 => None,
                1 => initial.accept().ok(),
                _ => initial.reject().ok(),
            };
            if let Some(target) = target {
                store.update_state(id, initial, target).unwrap();
            }
            ids.push(id);
        }

        let before: Vec<_> = ids.iter().map(|id| store.get(*id).unwrap().unwrap().state).collect();
        store.mark_stale(&ids).unwrap();

        for (id, old) in ids.iter().zip(before) {
            let new = store.get(*id).unwrap().unwrap().state;
            prop_assert!(new.is_stale());
            prop_assert_eq!(new.decision(), old.decision());
            prop_assert_eq!(new.is_conflicting(), old.is_conflicting());
        }
    }
}
