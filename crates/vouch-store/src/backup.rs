//! Backup export and import.
//!
//! A backup is a versioned JSON document holding every introduction with
//! its state and provenance. Row ids are not exported; import assigns new
//! ones and goes through the dedup index, so importing the same backup
//! twice only refreshes timestamps. Rows without a known introducer have
//! no natural key; an entry identical to a row already present is skipped,
//! each row matching at most one entry.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use vouch_identity::{IdentityKey, ServiceId};
use vouch_protocol::{Introducer, IntroductionState, PredictedFingerprint};

use crate::{IncomingIntroduction, Introduction, IntroductionId, IntroductionStore, Result, StoreError};

/// Version written by this build.
pub const BACKUP_VERSION: u32 = 1;

/// Serialized set of introductions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroductionBackup {
    /// Format version.
    pub version: u32,
    /// Export time, in milliseconds since the epoch.
    pub exported_at: i64,
    /// Exported rows.
    pub introductions: Vec<BackupEntry>,
}

/// One exported introduction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
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
    /// Last touched, in milliseconds since the epoch.
    pub timestamp: i64,
    /// Lifecycle state.
    pub state: IntroductionState,
}

impl From<Introduction> for BackupEntry {
    fn from(row: Introduction) -> Self {
        Self {
            introducer: row.introducer,
            introducee_service_id: row.introducee_service_id,
            introducee_name: row.introducee_name,
            introducee_number: row.introducee_number,
            introducee_identity_key: row.introducee_identity_key,
            predicted_fingerprint: row.predicted_fingerprint,
            timestamp: row.timestamp,
            state: row.state,
        }
    }
}

impl BackupEntry {
    fn to_incoming(&self) -> IncomingIntroduction {
        IncomingIntroduction {
            introducer: self.introducer,
            introducee_service_id: self.introducee_service_id,
            introducee_name: self.introducee_name.clone(),
            introducee_number: self.introducee_number.clone(),
            introducee_identity_key: self.introducee_identity_key,
            predicted_fingerprint: self.predicted_fingerprint.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl IntroductionBackup {
    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize backup: {}", e)))
    }

    /// Parse a backup and check its version.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid JSON or an unsupported version.
    pub fn from_json(json: &str) -> Result<Self> {
        let backup: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::Serialization(format!("Failed to parse backup: {}", e)))?;
        if backup.version != BACKUP_VERSION {
            return Err(StoreError::UnsupportedBackupVersion {
                found: backup.version,
                expected: BACKUP_VERSION,
            });
        }
        Ok(backup)
    }
}

/// Result of an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows created.
    pub inserted: usize,
    /// Existing rows whose timestamp was refreshed.
    pub refreshed: usize,
    /// Entries without a known introducer already present as identical rows.
    pub unchanged: usize,
}

impl IntroductionStore {
    /// Export every introduction.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be read.
    pub fn export(&self) -> Result<IntroductionBackup> {
        let introductions = self
            .iter()
            .map(|row| row.map(BackupEntry::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(IntroductionBackup {
            version: BACKUP_VERSION,
            exported_at: Utc::now().timestamp_millis(),
            introductions,
        })
    }

    /// Import a backup.
    ///
    /// Entries matching an existing row only refresh its timestamp; the
    /// local state wins.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported version or a failed write.
    /// Entries imported before the failure stay imported.
    pub fn import(&self, backup: &IntroductionBackup) -> Result<ImportSummary> {
        if backup.version != BACKUP_VERSION {
            return Err(StoreError::UnsupportedBackupVersion {
                found: backup.version,
                expected: BACKUP_VERSION,
            });
        }

        let mut summary = ImportSummary::default();
        let mut claimed: HashSet<IntroductionId> = HashSet::new();
        for entry in &backup.introductions {
            if !entry.introducer.is_known() {
                if let Some(id) = self.find_identical(entry, &claimed)? {
                    claimed.insert(id);
                    summary.unchanged += 1;
                    continue;
                }
            }

            let outcome = self.insert_with_state(&entry.to_incoming(), entry.state)?;
            claimed.insert(outcome.id());
            if outcome.is_inserted() {
                summary.inserted += 1;
            } else {
                summary.refreshed += 1;
            }
        }

        info!(
            inserted = summary.inserted,
            refreshed = summary.refreshed,
            unchanged = summary.unchanged,
            "Imported introduction backup"
        );
        Ok(summary)
    }

    fn find_identical(
        &self,
        entry: &BackupEntry,
        claimed: &HashSet<IntroductionId>,
    ) -> Result<Option<IntroductionId>> {
        Ok(self
            .for_introducee(&entry.introducee_service_id)?
            .into_iter()
            .filter(|row| !claimed.contains(&row.id))
            .find(|row| BackupEntry::from(row.clone()) == *entry)
            .map(|row| row.id))
    }
}
