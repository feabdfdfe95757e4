//! Identity records and their aggregate view.
//!
//! An [`IdentityRecord`] is the directory's knowledge of one contact's key.
//! [`IdentityRecordList`] answers the questions a verification screen asks
//! about a set of contacts at once.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{IdentityKey, ServiceId, VerifiedStatus};

/// How long a freshly changed, unapproved key is flagged as untrusted.
pub const DEFAULT_UNTRUSTED_WINDOW: Duration = Duration::from_secs(5);

/// A contact's locally known identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// The contact.
    pub service_id: ServiceId,
    /// The key we currently hold for the contact.
    pub identity_key: IdentityKey,
    /// Verification status of that key.
    pub verified_status: VerifiedStatus,
    /// Whether the key was accepted on first use without any check.
    pub first_use: bool,
    /// When the key was last saved, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Whether the user approved the key without blocking on it.
    pub nonblocking_approval: bool,
}

impl IdentityRecord {
    /// Check if the key is unapproved and changed within `window` of `now_millis`.
    pub fn is_untrusted_at(&self, window: Duration, now_millis: i64) -> bool {
        let window_millis = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        !self.nonblocking_approval && now_millis.saturating_sub(self.timestamp) < window_millis
    }

    fn is_unverified(&self) -> bool {
        self.verified_status == VerifiedStatus::Unverified
    }
}

/// Read-only view over the identity records of a set of contacts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityRecordList {
    records: Vec<IdentityRecord>,
}

impl IdentityRecordList {
    /// Create a list from records.
    pub fn new(records: Vec<IdentityRecord>) -> Self {
        Self { records }
    }

    /// All records.
    pub fn records(&self) -> &[IdentityRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True only if the list is non-empty and every record is verified.
    pub fn is_verified(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.verified_status.is_verified())
    }

    /// True if any record is unverified.
    ///
    /// With `exclude_first_use`, records accepted on first use are skipped.
    pub fn is_unverified(&self, exclude_first_use: bool) -> bool {
        self.records
            .iter()
            .filter(|r| !(exclude_first_use && r.first_use))
            .any(IdentityRecord::is_unverified)
    }

    /// True if any record is untrusted within [`DEFAULT_UNTRUSTED_WINDOW`].
    ///
    /// With `exclude_first_use`, records accepted on first use are skipped.
    pub fn is_untrusted(&self, exclude_first_use: bool) -> bool {
        let now = Utc::now().timestamp_millis();
        self.records
            .iter()
            .filter(|r| !(exclude_first_use && r.first_use))
            .any(|r| r.is_untrusted_at(DEFAULT_UNTRUSTED_WINDOW, now))
    }

    /// Records that are unapproved and were changed within `window`.
    pub fn untrusted_records(&self, window: Duration) -> Vec<&IdentityRecord> {
        self.untrusted_records_at(window, Utc::now().timestamp_millis())
    }

    /// Like [`untrusted_records`](Self::untrusted_records) against a fixed clock.
    pub fn untrusted_records_at(&self, window: Duration, now_millis: i64) -> Vec<&IdentityRecord> {
        self.records
            .iter()
            .filter(|r| r.is_untrusted_at(window, now_millis))
            .collect()
    }

    /// Records whose status is unverified.
    pub fn unverified_records(&self) -> Vec<&IdentityRecord> {
        self.records.iter().filter(|r| r.is_unverified()).collect()
    }
}

impl FromIterator<IdentityRecord> for IdentityRecordList {
    fn from_iter<I: IntoIterator<Item = IdentityRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn record(status: VerifiedStatus, first_use: bool, age_ms: i64, approved: bool) -> IdentityRecord {
        IdentityRecord {
            service_id: ServiceId::random_aci(),
            identity_key: IdentityKey::from_public_bytes([7u8; 32]),
            verified_status: status,
            first_use,
            timestamp: NOW - age_ms,
            nonblocking_approval: approved,
        }
    }

    #[test]
    fn test_empty_list_is_not_verified() {
        let list = IdentityRecordList::default();
        assert!(!list.is_verified());
        assert!(!list.is_unverified(false));
        assert!(list.untrusted_records_at(DEFAULT_UNTRUSTED_WINDOW, NOW).is_empty());
    }

    #[test]
    fn test_is_verified_requires_all() {
        let list = IdentityRecordList::new(vec![
            record(VerifiedStatus::DirectlyVerified, false, 0, true),
            record(VerifiedStatus::Introduced, false, 0, true),
        ]);
        assert!(list.is_verified());

        let list: IdentityRecordList = vec![
            record(VerifiedStatus::DirectlyVerified, false, 0, true),
            record(VerifiedStatus::Default, false, 0, true),
        ]
        .into_iter()
        .collect();
        assert!(!list.is_verified());
    }

    #[test]
    fn test_is_unverified_exclude_first_use() {
        let list = IdentityRecordList::new(vec![
            record(VerifiedStatus::Unverified, true, 0, true),
            record(VerifiedStatus::Default, false, 0, true),
        ]);
        assert!(list.is_unverified(false));
        assert!(!list.is_unverified(true));
        assert_eq!(list.unverified_records().len(), 1);
    }

    #[test]
    fn test_untrusted_window() {
        let list = IdentityRecordList::new(vec![
            record(VerifiedStatus::Default, false, 1_000, false),
            record(VerifiedStatus::Default, false, 10_000, false),
            record(VerifiedStatus::Default, false, 1_000, true),
        ]);

        let untrusted = list.untrusted_records_at(DEFAULT_UNTRUSTED_WINDOW, NOW);
        assert_eq!(untrusted.len(), 1);
        assert_eq!(untrusted[0].timestamp, NOW - 1_000);

        let wide = list.untrusted_records_at(Duration::from_secs(60), NOW);
        assert_eq!(wide.len(), 2);
    }

    #[test]
    fn test_untrusted_window_boundary_is_exclusive() {
        let r = record(VerifiedStatus::Default, false, 5_000, false);
        assert!(!r.is_untrusted_at(DEFAULT_UNTRUSTED_WINDOW, NOW));
        let r = record(VerifiedStatus::Default, false, 4_999, false);
        assert!(r.is_untrusted_at(DEFAULT_UNTRUSTED_WINDOW, NOW));
    }

    #[test]
    fn test_is_untrusted_uses_wall_clock() {
        let mut fresh = record(VerifiedStatus::Default, false, 0, false);
        fresh.timestamp = Utc::now().timestamp_millis();
        let list = IdentityRecordList::new(vec![fresh.clone()]);
        assert!(list.is_untrusted(false));

        fresh.first_use = true;
        let list = IdentityRecordList::new(vec![fresh]);
        assert!(!list.is_untrusted(true));
    }
}
