//! # vouch-store
//!
//! Local storage for received introductions.
//!
//! Provides:
//! - The introduction table on top of sled, with a dedup index and a
//!   per-introducee index
//! - Atomic insert-or-refresh, compare-and-swap state updates and
//!   all-or-nothing stale batches
//! - JSON backup export and import
//!
//! ```no_run
//! use vouch_store::IntroductionStore;
//! use std::path::Path;
//!
//! let store = IntroductionStore::open(Path::new("/tmp/vouch-db")).unwrap();
//! for introduction in store.all_displayable() {
//!     let introduction = introduction.unwrap();
//!     println!("{} {}", introduction.id, introduction.state);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
pub mod error;
pub mod introduction;
pub mod introduction_store;

#[cfg(test)]
mod proptests;

pub use backup::{BackupEntry, ImportSummary, IntroductionBackup, BACKUP_VERSION};
pub use error::{Result, StoreError};
pub use introduction::{IncomingIntroduction, InsertOutcome, Introduction, IntroductionId};
pub use introduction_store::IntroductionStore;
