//! Contacts file.
//!
//! The node keeps the local account and the identity directory in one JSON
//! file:
//!
//! ```json
//! {
//!   "local": { "service_id": "...", "identity_key": "..." },
//!   "contacts": [
//!     {
//!       "name": "Bob",
//!       "number": "+14153333333",
//!       "service_id": "...",
//!       "identity_key": "...",
//!       "verified_status": "DIRECTLY_VERIFIED",
//!       "first_use": false,
//!       "timestamp": 0,
//!       "nonblocking_approval": true
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vouch_core::{Contact, InMemoryDirectory, LocalIdentity};

/// Contents of the contacts file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsFile {
    /// The account running the node.
    pub local: LocalIdentity,
    /// Known contacts.
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl ContactsFile {
    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contacts file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse contacts file {}", path.display()))
    }

    /// Write the file to `path`, replacing it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize contacts")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace contacts file {}", path.display()))
    }

    /// Build a directory over the contacts.
    pub fn directory(&self) -> InMemoryDirectory {
        InMemoryDirectory::from_contacts(self.contacts.iter().cloned())
    }

    /// Take the directory's current contacts.
    pub async fn sync_from(&mut self, directory: &InMemoryDirectory) {
        self.contacts = directory.contacts().await;
    }
}
