//! Introduction records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vouch_identity::{IdentityKey, ServiceId};
use vouch_protocol::{Introducer, IntroduceePayload, IntroductionState, PredictedFingerprint};

use crate::{Result, StoreError};

/// Format used when listing introduction dates.
pub const INTRODUCTION_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Identifier of a stored introduction. Always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntroductionId(u64);

impl IntroductionId {
    /// Wrap a raw id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] for zero.
    pub fn new(raw: u64) -> Result<Self> {
        if raw == 0 {
            return Err(StoreError::Serialization(
                "Introduction id must be non-zero".into(),
            ));
        }
        Ok(Self(raw))
    }

    /// The raw id.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Big-endian key bytes, so tree order is insertion order.
    pub(crate) fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub(crate) fn from_key(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 8] = bytes.try_into().map_err(|_| {
            StoreError::Serialization(format!(
                "Invalid introduction id length: expected 8, got {}",
                bytes.len()
            ))
        })?;
        Self::new(u64::from_be_bytes(arr))
    }
}

impl fmt::Display for IntroductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IntroductionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s
            .trim()
            .parse::<u64>()
            .map_err(|e| StoreError::Serialization(format!("Invalid introduction id '{}': {}", s, e)))?;
        Self::new(raw)
    }
}

/// A decoded introduction that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingIntroduction {
    /// Who vouched.
    pub introducer: Introducer,
    /// The introduced contact.
    pub introducee_service_id: ServiceId,
    /// Name at introduction time.
    pub introducee_name: String,
    /// Number at introduction time, if disclosed.
    pub introducee_number: Option<String>,
    /// The key vouched for.
    pub introducee_identity_key: IdentityKey,
    /// Safety number predicted by the introducer.
    pub predicted_fingerprint: PredictedFingerprint,
    /// When the introduction was received, in milliseconds since the epoch.
    pub timestamp: i64,
}

impl IncomingIntroduction {
    /// Build from a wire payload received from `introducer` at `timestamp`.
    pub fn from_payload(introducer: Introducer, payload: IntroduceePayload, timestamp: i64) -> Self {
        Self {
            introducer,
            introducee_service_id: payload.service_id,
            introducee_name: payload.name,
            introducee_number: payload.number,
            introducee_identity_key: payload.identity_key,
            predicted_fingerprint: payload.predicted_fingerprint,
            timestamp,
        }
    }

    /// Natural key `(introducer, introducee, identity key)`.
    ///
    /// `None` unless the introducer is known: rows without provenance are
    /// never merged.
    pub fn dedup_key(&self) -> Option<Vec<u8>> {
        dedup_key(
            &self.introducer,
            &self.introducee_service_id,
            &self.introducee_identity_key,
        )
    }

    pub(crate) fn into_stored(self, id: IntroductionId, state: IntroductionState) -> Introduction {
        Introduction {
            id,
            introducer: self.introducer,
            introducee_service_id: self.introducee_service_id,
            introducee_name: self.introducee_name,
            introducee_number: self.introducee_number,
            introducee_identity_key: self.introducee_identity_key,
            predicted_fingerprint: self.predicted_fingerprint,
            timestamp: self.timestamp,
            state,
        }
    }
}

/// A stored introduction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introduction {
    /// Assigned on insertion.
    pub id: IntroductionId,
    /// Who vouched.
    pub introducer: Introducer,
    /// The introduced contact.
    pub introducee_service_id: ServiceId,
    /// Name at introduction time.
    pub introducee_name: String,
    /// Number at introduction time, if disclosed.
    pub introducee_number: Option<String>,
    /// The key vouched for.
    pub introducee_identity_key: IdentityKey,
    /// Safety number predicted by the introducer.
    pub predicted_fingerprint: PredictedFingerprint,
    /// Creation or last duplicate refresh, in milliseconds since the epoch.
    pub timestamp: i64,
    /// Lifecycle state.
    pub state: IntroductionState,
}

impl Introduction {
    /// Natural key `(introducer, introducee, identity key)`.
    ///
    /// `None` unless the introducer is known: rows without provenance are
    /// never merged.
    pub fn dedup_key(&self) -> Option<Vec<u8>> {
        dedup_key(
            &self.introducer,
            &self.introducee_service_id,
            &self.introducee_identity_key,
        )
    }

    /// Timestamp as a date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Timestamp formatted for listings.
    pub fn formatted_date(&self) -> String {
        self.date()
            .map(|d| d.format(INTRODUCTION_DATE_FORMAT).to_string())
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

/// Outcome of an insert-or-refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted(IntroductionId),
    /// An existing row had its timestamp refreshed.
    Refreshed(IntroductionId),
}

impl InsertOutcome {
    /// The affected row.
    pub fn id(&self) -> IntroductionId {
        match self {
            Self::Inserted(id) | Self::Refreshed(id) => *id,
        }
    }

    /// Check if a new row was created.
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

const KEY_SEPARATOR: u8 = 0x1f;

fn dedup_key(
    introducer: &Introducer,
    introducee: &ServiceId,
    key: &IdentityKey,
) -> Option<Vec<u8>> {
    let introducer = introducer.service_id()?;
    let mut out = Vec::with_capacity(128);
    out.extend_from_slice(introducer.to_string().as_bytes());
    out.push(KEY_SEPARATOR);
    out.extend_from_slice(introducee.to_string().as_bytes());
    out.push(KEY_SEPARATOR);
    out.extend_from_slice(key.to_base64().as_bytes());
    Some(out)
}

/// Prefix of the per-introducee index.
pub(crate) fn introducee_prefix(introducee: &ServiceId) -> Vec<u8> {
    let mut out = introducee.to_string().into_bytes();
    out.push(0);
    out
}

/// Full per-introducee index key.
pub(crate) fn introducee_key(introducee: &ServiceId, id: IntroductionId) -> Vec<u8> {
    let mut out = introducee_prefix(introducee);
    out.extend_from_slice(&id.to_key());
    out
}
