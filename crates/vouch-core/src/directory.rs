//! The identity directory seam.
//!
//! The service never owns contacts' identity keys or verification status.
//! It reads and writes them through [`IdentityDirectory`], which the host
//! application implements over its own identity store.
//! [`InMemoryDirectory`] backs tests and the command line node.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use vouch_identity::{IdentityKey, IdentityRecord, ServiceId, VerifiedStatus};

/// Errors raised by an identity directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The contact is not in the directory.
    #[error("Contact not in directory: {0}")]
    UnknownContact(ServiceId),

    /// The directory could not be reached or refused the write.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Access to locally known identities.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// The identity key held for `id`, if any.
    async fn resolve_identity_key(&self, id: &ServiceId) -> DirectoryResult<Option<IdentityKey>>;

    /// The full identity record for `id`, if any.
    async fn identity_record(&self, id: &ServiceId) -> DirectoryResult<Option<IdentityRecord>>;

    /// Verification status of `id`. Unknown contacts are `Default`.
    async fn verification_status(&self, id: &ServiceId) -> DirectoryResult<VerifiedStatus>;

    /// Change the verification status of a known contact.
    async fn set_verification_status(
        &self,
        id: &ServiceId,
        status: VerifiedStatus,
        reason: &str,
    ) -> DirectoryResult<()>;
}

/// A directory entry: an identity record plus how to address the contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name.
    pub name: String,
    /// Phone number, if shared.
    #[serde(default)]
    pub number: Option<String>,
    /// Identity record.
    #[serde(flatten)]
    pub record: IdentityRecord,
}

/// A recorded status change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// The contact.
    pub service_id: ServiceId,
    /// Status before the change.
    pub from: VerifiedStatus,
    /// Status after the change.
    pub to: VerifiedStatus,
    /// Why it changed.
    pub reason: String,
}

#[derive(Debug, Default)]
struct DirectoryState {
    contacts: HashMap<ServiceId, Contact>,
    changes: Vec<StatusChange>,
    read_only: bool,
}

/// Directory held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `contacts`.
    pub fn from_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let contacts = contacts
            .into_iter()
            .map(|c| (c.record.service_id, c))
            .collect();
        Self {
            state: RwLock::new(DirectoryState {
                contacts,
                ..DirectoryState::default()
            }),
        }
    }

    /// Add or replace a contact.
    pub async fn insert(&self, contact: Contact) {
        let mut state = self.state.write().await;
        state.contacts.insert(contact.record.service_id, contact);
    }

    /// Remove a contact.
    pub async fn remove(&self, id: &ServiceId) -> Option<Contact> {
        self.state.write().await.contacts.remove(id)
    }

    /// Look up a contact.
    pub async fn contact(&self, id: &ServiceId) -> Option<Contact> {
        self.state.read().await.contacts.get(id).cloned()
    }

    /// All contacts, ordered by service id.
    pub async fn contacts(&self) -> Vec<Contact> {
        let state = self.state.read().await;
        let mut out: Vec<_> = state.contacts.values().cloned().collect();
        out.sort_by_key(|c| c.record.service_id.to_string());
        out
    }

    /// Status changes applied so far, oldest first.
    pub async fn status_changes(&self) -> Vec<StatusChange> {
        self.state.read().await.changes.clone()
    }

    /// Refuse status writes while set.
    pub async fn set_read_only(&self, read_only: bool) {
        self.state.write().await.read_only = read_only;
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn resolve_identity_key(&self, id: &ServiceId) -> DirectoryResult<Option<IdentityKey>> {
        let state = self.state.read().await;
        Ok(state.contacts.get(id).map(|c| c.record.identity_key))
    }

    async fn identity_record(&self, id: &ServiceId) -> DirectoryResult<Option<IdentityRecord>> {
        let state = self.state.read().await;
        Ok(state.contacts.get(id).map(|c| c.record.clone()))
    }

    async fn verification_status(&self, id: &ServiceId) -> DirectoryResult<VerifiedStatus> {
        let state = self.state.read().await;
        Ok(state
            .contacts
            .get(id)
            .map(|c| c.record.verified_status)
            .unwrap_or_default())
    }

    async fn set_verification_status(
        &self,
        id: &ServiceId,
        status: VerifiedStatus,
        reason: &str,
    ) -> DirectoryResult<()> {
        let mut state = self.state.write().await;
        if state.read_only {
            return Err(DirectoryError::Unavailable("directory is read-only".into()));
        }

        let contact = state
            .contacts
            .get_mut(id)
            .ok_or(DirectoryError::UnknownContact(*id))?;
        let from = contact.record.verified_status;
        contact.record.verified_status = status;

        debug!(contact = %id, from = %from, to = %status, reason, "Verification status changed");
        state.changes.push(StatusChange {
            service_id: *id,
            from,
            to: status,
            reason: reason.to_string(),
        });
        Ok(())
    }
}
