//! Introduction table backed by sled.
//!
//! Three trees make up the table:
//!
//! | Tree                          | Key                                   | Value              |
//! |-------------------------------|---------------------------------------|--------------------|
//! | `introductions`               | id (u64, big-endian)                  | bincode row        |
//! | `introductions_by_key`        | introducer, introducee, key (0x1f)    | id                 |
//! | `introductions_by_introducee` | introducee, 0x00, id                  | empty              |
//!
//! Every mutation that touches more than one row or tree runs in a sled
//! transaction, so readers never observe a row without its index entries.
//! Readers do not lock: iteration yields whatever rows exist when each one
//! is reached and skips rows deleted in the meantime.

use std::path::Path;

use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;
use tracing::{debug, warn};
use vouch_identity::ServiceId;
use vouch_protocol::IntroductionState;

use crate::introduction::{introducee_key, introducee_prefix};
use crate::{IncomingIntroduction, InsertOutcome, Introduction, IntroductionId, Result, StoreError};

/// Tree name for introduction rows.
const ROWS_TREE: &str = "introductions";

/// Tree name for the dedup index.
const BY_KEY_TREE: &str = "introductions_by_key";

/// Tree name for the per-introducee index.
const BY_INTRODUCEE_TREE: &str = "introductions_by_introducee";

/// Persistent store of received introductions.
///
/// Cheap to clone; clones share the same database.
#[derive(Clone)]
pub struct IntroductionStore {
    db: sled::Db,
    rows: sled::Tree,
    by_key: sled::Tree,
    by_introducee: sled::Tree,
}

impl IntroductionStore {
    /// Open the introduction trees in an existing database.
    ///
    /// # Errors
    ///
    /// Returns an error if a tree cannot be opened.
    pub fn new(db: &sled::Db) -> Result<Self> {
        let rows = db
            .open_tree(ROWS_TREE)
            .map_err(|e| StoreError::Database(format!("Failed to open introductions tree: {}", e)))?;
        let by_key = db
            .open_tree(BY_KEY_TREE)
            .map_err(|e| StoreError::Database(format!("Failed to open dedup index: {}", e)))?;
        let by_introducee = db.open_tree(BY_INTRODUCEE_TREE).map_err(|e| {
            StoreError::Database(format!("Failed to open introducee index: {}", e))
        })?;

        Ok(Self {
            db: db.clone(),
            rows,
            by_key,
            by_introducee,
        })
    }

    /// Open or create a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| StoreError::Database(format!("Failed to open database: {}", e)))?;
        Self::new(&db)
    }

    /// Create a store that lives only as long as the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary database cannot be created.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::Database(format!("Failed to open temporary database: {}", e)))?;
        Self::new(&db)
    }

    /// Look up an existing row with the same natural key.
    ///
    /// Introductions without a known introducer have no duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn find_duplicate(&self, incoming: &IncomingIntroduction) -> Result<Option<IntroductionId>> {
        let Some(dedup_key) = incoming.dedup_key() else {
            return Ok(None);
        };
        let Some(raw) = self
            .by_key
            .get(dedup_key)
            .map_err(|e| StoreError::Database(format!("Failed to read dedup index: {}", e)))?
        else {
            return Ok(None);
        };
        let id = IntroductionId::from_key(&raw)?;
        Ok(self.get(id)?.map(|row| row.id))
    }

    /// Insert an introduction, or refresh the timestamp of its duplicate.
    ///
    /// A duplicate keeps its id and state; only its timestamp is replaced
    /// with `incoming.timestamp`. The dedup check and the write are atomic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] if `state` is not an initial
    /// state, or a storage error if the write fails.
    pub fn insert_or_refresh(
        &self,
        incoming: &IncomingIntroduction,
        state: IntroductionState,
    ) -> Result<InsertOutcome> {
        if !state.is_initial() {
            return Err(StoreError::InvalidState {
                state,
                reason: "new introductions must start pending",
            });
        }
        self.insert_with_state(incoming, state)
    }

    /// Insert-or-refresh without restricting the state. Used by import.
    pub(crate) fn insert_with_state(
        &self,
        incoming: &IncomingIntroduction,
        state: IntroductionState,
    ) -> Result<InsertOutcome> {
        let new_id = self.next_id()?;
        let dedup_key = incoming.dedup_key();

        let outcome = (&self.rows, &self.by_key, &self.by_introducee)
            .transaction(|(rows, by_key, by_introducee)| {
                let indexed = match &dedup_key {
                    Some(key) => by_key.get(&key[..])?,
                    None => None,
                };
                if let Some(raw) = indexed {
                    let existing = IntroductionId::from_key(&raw).map_err(ConflictableTransactionError::Abort)?;
                    if let Some(mut row) = read_row(rows, existing)? {
                        row.timestamp = incoming.timestamp;
                        write_row(rows, &row)?;
                        return Ok(InsertOutcome::Refreshed(existing));
                    }
                }

                let row = incoming.clone().into_stored(new_id, state);
                write_row(rows, &row)?;
                if let Some(dedup_key) = &dedup_key {
                    by_key.insert(&dedup_key[..], &new_id.to_key()[..])?;
                }
                by_introducee.insert(
                    introducee_key(&row.introducee_service_id, new_id),
                    &b""[..],
                )?;
                Ok(InsertOutcome::Inserted(new_id))
            })
            .map_err(tx_error)?;

        match outcome {
            InsertOutcome::Inserted(id) => debug!(
                id = %id,
                introducee = %incoming.introducee_service_id,
                state = %state,
                "Stored introduction"
            ),
            InsertOutcome::Refreshed(id) => debug!(
                id = %id,
                timestamp = incoming.timestamp,
                "Refreshed duplicate introduction"
            ),
        }
        Ok(outcome)
    }

    /// Get an introduction by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be read or decoded.
    pub fn get(&self, id: IntroductionId) -> Result<Option<Introduction>> {
        match self
            .rows
            .get(id.to_key())
            .map_err(|e| StoreError::Database(format!("Failed to get introduction: {}", e)))?
        {
            Some(value) => Ok(Some(decode_row(&value)?)),
            None => Ok(None),
        }
    }

    /// Replace the state of one row, if it still holds `expected`.
    ///
    /// The store does not judge whether the transition is legal beyond
    /// refusing initial states; that is the caller's job.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidState`] if `new` is an initial state
    /// - [`StoreError::NotFound`] if the row does not exist
    /// - [`StoreError::StateChanged`] if the row no longer holds `expected`
    pub fn update_state(
        &self,
        id: IntroductionId,
        expected: IntroductionState,
        new: IntroductionState,
    ) -> Result<Introduction> {
        if new.is_initial() {
            return Err(StoreError::InvalidState {
                state: new,
                reason: "pending states are only assigned on insertion",
            });
        }

        self.rows
            .transaction(|rows| {
                let Some(mut row) = read_row(rows, id)? else {
                    return abort(StoreError::NotFound(id));
                };
                if row.state != expected {
                    return abort(StoreError::StateChanged {
                        id,
                        expected,
                        actual: row.state,
                    });
                }
                row.state = new;
                write_row(rows, &row)?;
                Ok(row)
            })
            .map_err(tx_error)
    }

    /// Drop the introducer of one row. Irreversible and idempotent.
    ///
    /// The dedup entry naming the introducer is removed with it, so a later
    /// delivery of the same introduction creates a fresh row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the row does not exist.
    pub fn forget_introducer(&self, id: IntroductionId) -> Result<Introduction> {
        (&self.rows, &self.by_key)
            .transaction(|(rows, by_key)| {
                let Some(mut row) = read_row(rows, id)? else {
                    return abort(StoreError::NotFound(id));
                };
                if let Some(dedup_key) = row.dedup_key() {
                    remove_index_if_owned(by_key, &dedup_key, id)?;
                    row.introducer = row.introducer.forget();
                    write_row(rows, &row)?;
                }
                Ok(row)
            })
            .map_err(tx_error)
    }

    /// Delete one row and its index entries.
    ///
    /// Returns `false` if the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn delete(&self, id: IntroductionId) -> Result<bool> {
        (&self.rows, &self.by_key, &self.by_introducee)
            .transaction(|(rows, by_key, by_introducee)| {
                let Some(row) = read_row(rows, id)? else {
                    return Ok(false);
                };
                rows.remove(&id.to_key()[..])?;
                by_introducee.remove(introducee_key(&row.introducee_service_id, id))?;
                if let Some(dedup_key) = row.dedup_key() {
                    remove_index_if_owned(by_key, &dedup_key, id)?;
                }
                Ok(true)
            })
            .map_err(tx_error)
    }

    /// All introductions of one introducee, oldest first.
    ///
    /// Rows deleted while the scan runs are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or a row cannot be read.
    pub fn for_introducee(&self, introducee: &ServiceId) -> Result<Vec<Introduction>> {
        let mut out = Vec::new();
        for entry in self.by_introducee.scan_prefix(introducee_prefix(introducee)) {
            let (key, _) = entry
                .map_err(|e| StoreError::Database(format!("Failed to scan introducee index: {}", e)))?;
            let id = IntroductionId::from_key(&key[key.len().saturating_sub(8)..])?;
            match self.get(id)? {
                Some(row) => out.push(row),
                None => debug!(id = %id, "Introduction vanished during scan"),
            }
        }
        Ok(out)
    }

    /// Check if any introduction of `introducee` is in `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    pub fn any_in_state(&self, introducee: &ServiceId, state: IntroductionState) -> Result<bool> {
        Ok(self
            .for_introducee(introducee)?
            .iter()
            .any(|row| row.state == state))
    }

    /// Move the given rows to their stale counterparts in one transaction.
    ///
    /// Rows that are already stale are left as they are. If any row is
    /// missing nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for a missing row, or a storage
    /// error if the batch fails.
    pub fn mark_stale(&self, ids: &[IntroductionId]) -> Result<Vec<Introduction>> {
        let updated = self
            .rows
            .transaction(|rows| {
                let mut updated = Vec::with_capacity(ids.len());
                for &id in ids {
                    let Some(mut row) = read_row(rows, id)? else {
                        return abort(StoreError::NotFound(id));
                    };
                    if row.state.is_stale() {
                        continue;
                    }
                    row.state = row.state.turned_stale();
                    write_row(rows, &row)?;
                    updated.push(row);
                }
                Ok(updated)
            })
            .map_err(tx_error)?;

        if !updated.is_empty() {
            debug!(count = updated.len(), "Marked introductions stale");
        }
        Ok(updated)
    }

    /// Undo state changes in one transaction.
    ///
    /// Each entry is `(id, changed, previous)`: the row must still hold
    /// `changed` and is put back to `previous`. Initial states are allowed
    /// here since nothing new is being decided. If any row is missing or has
    /// moved on, nothing is written.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if a row does not exist
    /// - [`StoreError::StateChanged`] if a row no longer holds `changed`
    pub fn revert_states(
        &self,
        reverts: &[(IntroductionId, IntroductionState, IntroductionState)],
    ) -> Result<()> {
        self.rows
            .transaction(|rows| {
                for &(id, changed, previous) in reverts {
                    let Some(mut row) = read_row(rows, id)? else {
                        return abort(StoreError::NotFound(id));
                    };
                    if row.state != changed {
                        return abort(StoreError::StateChanged {
                            id,
                            expected: changed,
                            actual: row.state,
                        });
                    }
                    row.state = previous;
                    write_row(rows, &row)?;
                }
                Ok(())
            })
            .map_err(tx_error)?;

        debug!(count = reverts.len(), "Reverted introduction states");
        Ok(())
    }

    /// Lazily iterate over every introduction in id order.
    ///
    /// The iterator can be dropped and recreated at any time; each call
    /// starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = Result<Introduction>> {
        self.rows.iter().values().map(|value| {
            let value = value
                .map_err(|e| StoreError::Database(format!("Failed to iterate introductions: {}", e)))?;
            decode_row(&value)
        })
    }

    /// Every introduction the user can manage.
    ///
    /// Rows with a forgotten or undisclosed introducer are included;
    /// presenting them with a placeholder is up to the caller.
    pub fn all_displayable(&self) -> impl Iterator<Item = Result<Introduction>> {
        self.iter()
    }

    /// Number of stored introductions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flush pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StoreError::Database(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    fn next_id(&self) -> Result<IntroductionId> {
        let raw = self
            .db
            .generate_id()
            .map_err(|e| StoreError::Database(format!("Failed to generate id: {}", e)))?;
        IntroductionId::new(raw + 1)
    }
}

impl std::fmt::Debug for IntroductionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntroductionStore")
            .field("introductions", &self.rows.len())
            .finish()
    }
}

fn abort<T>(err: StoreError) -> ConflictableTransactionResult<T, StoreError> {
    Err(ConflictableTransactionError::Abort(err))
}

fn tx_error(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Database(format!("Transaction failed: {}", e)),
    }
}

fn decode_row(bytes: &[u8]) -> Result<Introduction> {
    bincode::deserialize(bytes)
        .map_err(|e| StoreError::Serialization(format!("Failed to deserialize introduction: {}", e)))
}

fn read_row(
    rows: &TransactionalTree,
    id: IntroductionId,
) -> ConflictableTransactionResult<Option<Introduction>, StoreError> {
    match rows.get(&id.to_key()[..])? {
        Some(value) => decode_row(&value)
            .map(Some)
            .map_err(ConflictableTransactionError::Abort),
        None => Ok(None),
    }
}

fn write_row(
    rows: &TransactionalTree,
    row: &Introduction,
) -> ConflictableTransactionResult<(), StoreError> {
    let value = bincode::serialize(row).map_err(|e| {
        ConflictableTransactionError::Abort(StoreError::Serialization(format!(
            "Failed to serialize introduction: {}",
            e
        )))
    })?;
    rows.insert(&row.id.to_key()[..], value)?;
    Ok(())
}

fn remove_index_if_owned(
    by_key: &TransactionalTree,
    dedup_key: &[u8],
    id: IntroductionId,
) -> ConflictableTransactionResult<(), StoreError> {
    match by_key.get(dedup_key)? {
        Some(raw) if raw[..] == id.to_key()[..] => {
            by_key.remove(dedup_key)?;
        }
        Some(_) => warn!(id = %id, "Dedup index points at another introduction"),
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vouch_identity::IdentityKey;
    use vouch_protocol::{Introducer, PredictedFingerprint};

    fn create_test_store() -> (TempDir, IntroductionStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = IntroductionStore::open(dir.path()).expect("Failed to open store");
        (dir, store)
    }

    fn incoming(introducer: ServiceId, introducee: ServiceId, key: u8, ts: i64) -> IncomingIntroduction {
        IncomingIntroduction {
            introducer: Introducer::Known(introducer),
            introducee_service_id: introducee,
            introducee_name: "Bob".into(),
            introducee_number: Some("+14153333333".into()),
            introducee_identity_key: IdentityKey::from_public_bytes([key; 32]),
            predicted_fingerprint: PredictedFingerprint::new(&"7".repeat(60)).unwrap(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = create_test_store();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 100);

        let outcome = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap();
        assert!(outcome.is_inserted());

        let row = store.get(outcome.id()).unwrap().unwrap();
        assert_eq!(row.state, IntroductionState::Pending);
        assert_eq!(row.introducee_name, "Bob");
        assert_eq!(row.timestamp, 100);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_refreshes_timestamp_only() {
        let (_dir, store) = create_test_store();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 100);

        let first = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap();
        store
            .update_state(first.id(), IntroductionState::Pending, IntroductionState::Accepted)
            .unwrap();

        let mut again = intro.clone();
        again.timestamp = 200;
        let second = store
            .insert_or_refresh(&again, IntroductionState::PendingConflicting)
            .unwrap();

        assert_eq!(second, InsertOutcome::Refreshed(first.id()));
        assert_eq!(store.len(), 1);
        let row = store.get(first.id()).unwrap().unwrap();
        assert_eq!(row.timestamp, 200);
        assert_eq!(row.state, IntroductionState::Accepted);
        assert_eq!(store.find_duplicate(&again).unwrap(), Some(first.id()));
    }

    #[test]
    fn test_different_key_is_new_row() {
        let (_dir, store) = create_test_store();
        let introducer = ServiceId::random_aci();
        let introducee = ServiceId::random_aci();

        let a = store
            .insert_or_refresh(&incoming(introducer, introducee, 1, 1), IntroductionState::Pending)
            .unwrap();
        let b = store
            .insert_or_refresh(&incoming(introducer, introducee, 2, 2), IntroductionState::Pending)
            .unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(store.for_introducee(&introducee).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_rejects_non_initial_state() {
        let (_dir, store) = create_test_store();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 1);
        assert!(matches!(
            store.insert_or_refresh(&intro, IntroductionState::Accepted),
            Err(StoreError::InvalidState { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_state_compare_and_swap() {
        let (_dir, store) = create_test_store();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 1);
        let id = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap().id();

        let row = store
            .update_state(id, IntroductionState::Pending, IntroductionState::Rejected)
            .unwrap();
        assert_eq!(row.state, IntroductionState::Rejected);

        let err = store
            .update_state(id, IntroductionState::Pending, IntroductionState::Accepted)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::StateChanged {
                actual: IntroductionState::Rejected,
                ..
            }
        ));
        assert_eq!(store.get(id).unwrap().unwrap().state, IntroductionState::Rejected);

        assert!(matches!(
            store.update_state(id, IntroductionState::Rejected, IntroductionState::Pending),
            Err(StoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_update_missing_row() {
        let (_dir, store) = create_test_store();
        let id = IntroductionId::new(99).unwrap();
        assert!(matches!(
            store.update_state(id, IntroductionState::Pending, IntroductionState::Accepted),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_forget_introducer() {
        let (_dir, store) = create_test_store();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 1);
        let id = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap().id();

        let row = store.forget_introducer(id).unwrap();
        assert_eq!(row.introducer, Introducer::Forgotten);
        assert_eq!(store.forget_introducer(id).unwrap().introducer, Introducer::Forgotten);

        // The link to the introducer is gone, so redelivery makes a new row.
        assert_eq!(store.find_duplicate(&intro).unwrap(), None);
        let again = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap();
        assert!(again.is_inserted());
        assert_eq!(store.all_displayable().count(), 2);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = create_test_store();
        let introducee = ServiceId::random_aci();
        let intro = incoming(ServiceId::random_aci(), introducee, 1, 1);
        let id = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap().id();

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
        assert!(store.for_introducee(&introducee).unwrap().is_empty());
        assert_eq!(store.find_duplicate(&intro).unwrap(), None);
    }

    #[test]
    fn test_mark_stale_preserves_sub_state() {
        let (_dir, store) = create_test_store();
        let introducee = ServiceId::random_aci();
        let a = store
            .insert_or_refresh(&incoming(ServiceId::random_aci(), introducee, 1, 1), IntroductionState::Pending)
            .unwrap()
            .id();
        let b = store
            .insert_or_refresh(
                &incoming(ServiceId::random_aci(), introducee, 2, 2),
                IntroductionState::PendingConflicting,
            )
            .unwrap()
            .id();
        store
            .update_state(b, IntroductionState::PendingConflicting, IntroductionState::AcceptedConflicting)
            .unwrap();

        let updated = store.mark_stale(&[a, b]).unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(store.get(a).unwrap().unwrap().state, IntroductionState::StalePending);
        assert_eq!(
            store.get(b).unwrap().unwrap().state,
            IntroductionState::StaleAcceptedConflicting
        );

        // Already stale rows are skipped.
        assert!(store.mark_stale(&[a]).unwrap().is_empty());
    }

    #[test]
    fn test_mark_stale_is_all_or_nothing() {
        let (_dir, store) = create_test_store();
        let introducee = ServiceId::random_aci();
        let a = store
            .insert_or_refresh(&incoming(ServiceId::random_aci(), introducee, 1, 1), IntroductionState::Pending)
            .unwrap()
            .id();
        let missing = IntroductionId::new(a.get() + 1000).unwrap();

        assert!(matches!(
            store.mark_stale(&[a, missing]),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.get(a).unwrap().unwrap().state, IntroductionState::Pending);
    }

    #[test]
    fn test_revert_states_restores_pending() {
        let (_dir, store) = create_test_store();
        let introducee = ServiceId::random_aci();
        let a = store
            .insert_or_refresh(&incoming(ServiceId::random_aci(), introducee, 1, 1), IntroductionState::Pending)
            .unwrap()
            .id();
        let b = store
            .insert_or_refresh(&incoming(ServiceId::random_aci(), introducee, 1, 2), IntroductionState::Pending)
            .unwrap()
            .id();
        store
            .update_state(a, IntroductionState::Pending, IntroductionState::Accepted)
            .unwrap();

        store
            .revert_states(&[(a, IntroductionState::Accepted, IntroductionState::Pending)])
            .unwrap();
        assert_eq!(store.get(a).unwrap().unwrap().state, IntroductionState::Pending);

        // b never moved, so the whole batch is refused.
        store.mark_stale(&[a]).unwrap();
        assert!(matches!(
            store.revert_states(&[
                (a, IntroductionState::StalePending, IntroductionState::Pending),
                (b, IntroductionState::StalePending, IntroductionState::Pending),
            ]),
            Err(StoreError::StateChanged { id, .. }) if id == b
        ));
        assert_eq!(store.get(a).unwrap().unwrap().state, IntroductionState::StalePending);
    }

    #[test]
    fn test_any_in_state() {
        let (_dir, store) = create_test_store();
        let introducee = ServiceId::random_aci();
        let id = store
            .insert_or_refresh(&incoming(ServiceId::random_aci(), introducee, 1, 1), IntroductionState::Pending)
            .unwrap()
            .id();
        assert!(!store.any_in_state(&introducee, IntroductionState::Accepted).unwrap());
        store
            .update_state(id, IntroductionState::Pending, IntroductionState::Accepted)
            .unwrap();
        assert!(store.any_in_state(&introducee, IntroductionState::Accepted).unwrap());
        assert!(!store
            .any_in_state(&ServiceId::random_aci(), IntroductionState::Accepted)
            .unwrap());
    }

    #[test]
    fn test_iteration_order_and_restart() {
        let (_dir, store) = create_test_store();
        let mut ids = Vec::new();
        for i in 0..5 {
            let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), i, i as i64);
            ids.push(store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap().id());
        }

        let listed: Vec<_> = store.iter().map(|r| r.unwrap().id).collect();
        assert_eq!(listed, ids);

        // Deleting mid-iteration does not break the pass.
        let mut iter = store.all_displayable();
        let first = iter.next().unwrap().unwrap();
        store.delete(ids[4]).unwrap();
        let rest: Vec<_> = iter.map(|r| r.unwrap().id).collect();
        assert_eq!(first.id, ids[0]);
        assert!(!rest.contains(&ids[0]));
        assert_eq!(store.iter().count(), 4);
    }

    #[test]
    fn test_reopen_persists() {
        let dir = TempDir::new().unwrap();
        let intro = incoming(ServiceId::random_aci(), ServiceId::random_aci(), 1, 1);
        let id = {
            let store = IntroductionStore::open(dir.path()).unwrap();
            let id = store.insert_or_refresh(&intro, IntroductionState::Pending).unwrap().id();
            store.flush().unwrap();
            id
        };
        let store = IntroductionStore::open(dir.path()).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().introducee_name, "Bob");
    }

    #[test]
    fn test_temporary_store() {
        let store = IntroductionStore::temporary().unwrap();
        assert!(store.is_empty());
    }
}
