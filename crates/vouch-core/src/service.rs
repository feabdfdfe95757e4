//! The introduction service.
//!
//! [`IntroductionService`] ties the store, the identity directory and the
//! trust rules together. Every mutation runs on the worker pool while
//! holding the introducee's lock, so two changes to introductions of the
//! same contact never interleave and always apply in arrival order. Reads
//! go straight to the store.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vouch_core::{InMemoryDirectory, IntroductionService, LocalIdentity, TrustConfig};
//!
//! let directory = Arc::new(InMemoryDirectory::new());
//! let service = IntroductionService::open(TrustConfig::in_memory(), directory, local)?;
//!
//! // Store the introductions carried by a message from `alice`
//! service.receive_message(alice, &body, timestamp).await?;
//!
//! for row in service.all_displayable() {
//!     let row = row?;
//!     println!("{} {} {}", row.formatted_date(), row.introducee_name, row.state);
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use vouch_identity::{IdentityKey, IdentityRecord, IdentityRecordList, ServiceId};
use vouch_protocol::{IntroductionState, PredictedFingerprint, TransitionError};
use vouch_store::{
    ImportSummary, IncomingIntroduction, InsertOutcome, Introduction, IntroductionBackup,
    IntroductionId, IntroductionStore, StoreError,
};

use crate::batch::ReceiveBatch;
use crate::config::TrustConfig;
use crate::directory::IdentityDirectory;
use crate::error::{CoreError, Result};
use crate::internal::{IntroduceeLocks, WorkerPool};
use crate::outbound::{self, OutboundContact, OutboundIntroduction};
use crate::safety::SafetyNumber;
use crate::trust::{self, Remaining};

/// The account running the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    /// Our service id.
    pub service_id: ServiceId,
    /// Our identity key.
    pub identity_key: IdentityKey,
}

/// Result of checking an introduction's predicted safety number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FingerprintCheck {
    /// The prediction equals the number computed from our directory.
    Match,
    /// The prediction differs.
    Mismatch {
        /// What the introducer predicted.
        predicted: PredictedFingerprint,
        /// What we computed, as 60 digits.
        computed: String,
    },
    /// We hold no key for the introducee yet.
    IntroduceeUnknown,
}

/// Result of handing a message body to the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The body is ordinary text.
    NotIntroduction,
    /// The body was marked as an introduction but could not be decoded.
    Dropped,
    /// Every introducee was stored.
    Stored(Vec<InsertOutcome>),
}

/// A requested state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StateChange {
    Accept,
    Reject,
    To(IntroductionState),
}

impl StateChange {
    fn apply(self, from: IntroductionState) -> std::result::Result<IntroductionState, TransitionError> {
        match self {
            Self::Accept => from.accept(),
            Self::Reject => from.reject(),
            Self::To(target) => from.transition_to(target),
        }
    }
}

/// Shared state behind the service handle.
struct ServiceInner {
    config: TrustConfig,
    store: IntroductionStore,
    directory: Arc<dyn IdentityDirectory>,
    locks: IntroduceeLocks,
    local: LocalIdentity,
}

/// Receives, stores and acts on introductions.
///
/// Cloning is cheap; clones share the store, directory, locks and pool.
#[derive(Clone)]
pub struct IntroductionService {
    inner: Arc<ServiceInner>,
    pool: WorkerPool,
}

impl IntroductionService {
    /// Create a service over an open store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if `config` is invalid.
    pub fn new(
        config: TrustConfig,
        store: IntroductionStore,
        directory: Arc<dyn IdentityDirectory>,
        local: LocalIdentity,
    ) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers.max_concurrent_tasks);

        info!(
            local = %local.service_id,
            workers = pool.size(),
            introductions = store.len(),
            "Introduction service started"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                store,
                directory,
                locks: IntroduceeLocks::new(),
                local,
            }),
            pool,
        })
    }

    /// Open the store named by `config` and create a service over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store
    /// cannot be opened.
    pub fn open(
        config: TrustConfig,
        directory: Arc<dyn IdentityDirectory>,
        local: LocalIdentity,
    ) -> Result<Self> {
        config.validate()?;
        let store = if config.storage.in_memory {
            IntroductionStore::temporary()?
        } else {
            IntroductionStore::open(&config.storage.data_dir)?
        };
        Self::new(config, store, directory, local)
    }

    /// The service configuration.
    pub fn config(&self) -> &TrustConfig {
        &self.inner.config
    }

    /// The underlying store.
    pub fn store(&self) -> &IntroductionStore {
        &self.inner.store
    }

    // ===== Inbound =====

    /// Store the introductions carried by a message body.
    ///
    /// Ordinary text is ignored. A marked body that fails to decode is
    /// logged and dropped; retrying it cannot succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if storing an introducee fails. Retrying the whole
    /// message is safe: introducees that already landed are only refreshed.
    pub async fn receive_message(
        &self,
        introducer: ServiceId,
        body: &str,
        received_at: i64,
    ) -> Result<ReceiveOutcome> {
        let mut batch = match ReceiveBatch::from_message(introducer, body, received_at) {
            Ok(Some(batch)) => batch,
            Ok(None) => return Ok(ReceiveOutcome::NotIntroduction),
            Err(e) => {
                warn!(introducer = %introducer, error = %e, "Dropping malformed introduction message");
                return Ok(ReceiveOutcome::Dropped);
            }
        };

        let outcomes = self.process_batch(&mut batch).await?;
        Ok(ReceiveOutcome::Stored(outcomes))
    }

    /// Land the remaining payloads of a batch, one at a time.
    ///
    /// On failure the batch keeps every payload that did not land, so the
    /// next attempt resumes where this one stopped. Returns the outcomes of
    /// this attempt.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BatchAbandoned`] if the batch is out of attempts or
    ///   older than the configured lifespan
    /// - Any error from storing a payload
    pub async fn process_batch(&self, batch: &mut ReceiveBatch) -> Result<Vec<InsertOutcome>> {
        let jobs = &self.inner.config.jobs;
        if batch.is_exhausted(jobs.max_attempts)
            || batch.is_expired(jobs.lifespan, Utc::now().timestamp_millis())
        {
            warn!(
                introducer = %batch.introducer,
                attempts = batch.attempts,
                remaining = batch.remaining.len(),
                "Abandoning introduction batch"
            );
            return Err(CoreError::BatchAbandoned {
                attempts: batch.attempts,
            });
        }

        batch.attempts += 1;
        let mut outcomes = Vec::with_capacity(batch.remaining.len());
        while let Some(incoming) = batch.next_incoming() {
            outcomes.push(self.insert_or_refresh(incoming).await?);
            batch.mark_landed();
        }

        debug!(
            introducer = %batch.introducer,
            completed = batch.completed,
            attempts = batch.attempts,
            "Introduction batch landed"
        );
        Ok(outcomes)
    }

    /// Store one introduction, or refresh its duplicate.
    ///
    /// A new row starts `PENDING`, or `PENDING_CONFLICTING` when the
    /// directory holds a different key for the introducee. A duplicate only
    /// gets the new timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the store fails.
    pub async fn insert_or_refresh(&self, incoming: IncomingIntroduction) -> Result<InsertOutcome> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { inner.insert_or_refresh(incoming).await })
            .await
    }

    // ===== Decisions =====

    /// Accept an introduction.
    ///
    /// # Errors
    ///
    /// - [`CoreError::IntroductionNotFound`] for an unknown id
    /// - [`CoreError::InvalidTransition`] if the introduction is stale or
    ///   already accepted; the row is untouched
    /// - [`CoreError::CascadeInconsistency`] if the introducee's
    ///   verification status could not follow; the row is put back to its
    ///   previous state so the call can be retried
    pub async fn accept(&self, id: IntroductionId) -> Result<Introduction> {
        self.apply(id, StateChange::Accept).await
    }

    /// Reject an introduction.
    ///
    /// # Errors
    ///
    /// As [`accept`](Self::accept).
    pub async fn reject(&self, id: IntroductionId) -> Result<Introduction> {
        self.apply(id, StateChange::Reject).await
    }

    /// Move an introduction to `new_state`.
    ///
    /// Only the transitions [`IntroductionState::transition_to`] allows are
    /// applied; anything else leaves the row untouched.
    ///
    /// # Errors
    ///
    /// As [`accept`](Self::accept).
    pub async fn change_state(
        &self,
        id: IntroductionId,
        new_state: IntroductionState,
    ) -> Result<Introduction> {
        self.apply(id, StateChange::To(new_state)).await
    }

    async fn apply(&self, id: IntroductionId, change: StateChange) -> Result<Introduction> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { inner.change_state(id, change).await })
            .await
    }

    /// Drop the introducer of an introduction. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IntroductionNotFound`] for an unknown id.
    pub async fn forget_introducer(&self, id: IntroductionId) -> Result<Introduction> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { inner.forget_introducer(id).await })
            .await
    }

    /// Delete an introduction. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub async fn delete(&self, id: IntroductionId) -> Result<bool> {
        let inner = self.inner.clone();
        self.pool.run(async move { inner.delete(id).await }).await
    }

    // ===== Key changes =====

    /// Turn every fresh introduction of `introducee` stale.
    ///
    /// Called when the introducee's identity key changed. The rows change
    /// in one batch; afterwards the introducee's status becomes
    /// `UNVERIFIED`. Returns the rows that turned stale.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CascadeInconsistency`] if the batch or the
    /// status change failed. Either way the rows keep their previous
    /// states and the call can be retried.
    pub async fn turn_stale(&self, introducee: ServiceId) -> Result<Vec<Introduction>> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { inner.turn_stale(introducee, None).await })
            .await
    }

    /// Turn stale the fresh introductions of `introducee` that vouch for a
    /// key other than `resolved`.
    ///
    /// Called when a key for the introducee becomes known. Matching
    /// introductions are untouched. Returns the rows that turned stale.
    ///
    /// The directory must already hold `resolved` for the introducee:
    /// the status change reads the key from there and is skipped, with a
    /// warning, when it is missing.
    ///
    /// # Errors
    ///
    /// As [`turn_stale`](Self::turn_stale).
    pub async fn handle_dangling(
        &self,
        introducee: ServiceId,
        resolved: IdentityKey,
    ) -> Result<Vec<Introduction>> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { inner.turn_stale(introducee, Some(resolved)).await })
            .await
    }

    // ===== Reads =====

    /// Look up one introduction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IntroductionNotFound`] for an unknown id.
    pub fn get(&self, id: IntroductionId) -> Result<Introduction> {
        self.inner.load(id)
    }

    /// Every introduction, oldest first, forgotten introducers included.
    pub fn all_displayable(&self) -> impl Iterator<Item = Result<Introduction>> {
        self.inner.store.all_displayable().map(|row| row.map_err(CoreError::from))
    }

    /// Introductions of one introducee, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the scan fails.
    pub fn introductions_for(&self, introducee: &ServiceId) -> Result<Vec<Introduction>> {
        Ok(self.inner.store.for_introducee(introducee)?)
    }

    /// Compare an introduction's predicted safety number with the one we
    /// compute from our own key and the directory's key for the introducee.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a failed directory lookup.
    pub async fn verify_introduction(&self, id: IntroductionId) -> Result<FingerprintCheck> {
        let row = self.inner.load(id)?;
        let Some(key) = self
            .inner
            .directory
            .resolve_identity_key(&row.introducee_service_id)
            .await?
        else {
            return Ok(FingerprintCheck::IntroduceeUnknown);
        };

        let local = &self.inner.local;
        let computed = SafetyNumber::for_services(
            local.service_id,
            local.identity_key,
            row.introducee_service_id,
            key,
        );

        if computed.matches(&row.predicted_fingerprint) {
            Ok(FingerprintCheck::Match)
        } else {
            Ok(FingerprintCheck::Mismatch {
                predicted: row.predicted_fingerprint,
                computed: computed.display_digits(),
            })
        }
    }

    /// Identity records of the given contacts. Unknown contacts are left
    /// out.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory lookup fails.
    pub async fn identity_records(&self, ids: &[ServiceId]) -> Result<IdentityRecordList> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.inner.directory.identity_record(id).await? {
                records.push(record);
            }
        }
        Ok(IdentityRecordList::new(records))
    }

    /// Contacts among `ids` whose key changed within the configured
    /// untrusted window and was not approved.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory lookup fails.
    pub async fn untrusted_contacts(&self, ids: &[ServiceId]) -> Result<Vec<IdentityRecord>> {
        let window = self.inner.config.verification.untrusted_window;
        let list = self.identity_records(ids).await?;
        Ok(list.untrusted_records(window).into_iter().cloned().collect())
    }

    // ===== Outbound =====

    /// Prepare an introduction of `contacts` to `recipient`.
    ///
    /// The recipient must be [`recipient_unlocked`] and every contact
    /// [`forward_unlocked`]; each payload carries the safety number the
    /// recipient will compute with that contact.
    ///
    /// [`recipient_unlocked`]: vouch_identity::VerifiedStatus::recipient_unlocked
    /// [`forward_unlocked`]: vouch_identity::VerifiedStatus::forward_unlocked
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidIntroduction`] for no contacts, repeated
    ///   contacts, or introducing the recipient to themselves
    /// - [`CoreError::NotUnlocked`] if a status forbids the introduction
    /// - [`CoreError::UnknownContact`] if a key is missing
    pub async fn prepare_introduction(
        &self,
        recipient: ServiceId,
        contacts: &[OutboundContact],
    ) -> Result<OutboundIntroduction> {
        if contacts.is_empty() {
            return Err(CoreError::InvalidIntroduction("no contacts to introduce".into()));
        }

        let directory = &self.inner.directory;
        let status = directory.verification_status(&recipient).await?;
        if !status.recipient_unlocked() {
            return Err(CoreError::NotUnlocked {
                service_id: recipient,
                status,
                purpose: "receiving",
            });
        }
        let recipient_key = directory
            .resolve_identity_key(&recipient)
            .await?
            .ok_or(CoreError::UnknownContact(recipient))?;

        let mut payloads = Vec::with_capacity(contacts.len());
        for (i, contact) in contacts.iter().enumerate() {
            if contact.service_id == recipient {
                return Err(CoreError::InvalidIntroduction(format!(
                    "cannot introduce {} to themselves",
                    recipient
                )));
            }
            if contacts[..i].iter().any(|c| c.service_id == contact.service_id) {
                return Err(CoreError::InvalidIntroduction(format!(
                    "{} listed twice",
                    contact.service_id
                )));
            }

            let status = directory.verification_status(&contact.service_id).await?;
            if !status.forward_unlocked() {
                return Err(CoreError::NotUnlocked {
                    service_id: contact.service_id,
                    status,
                    purpose: "forwarding",
                });
            }
            let key = directory
                .resolve_identity_key(&contact.service_id)
                .await?
                .ok_or(CoreError::UnknownContact(contact.service_id))?;

            payloads.push(outbound::introduce(recipient, recipient_key, contact, key)?);
        }

        info!(recipient = %recipient, introducees = payloads.len(), "Prepared introduction");
        Ok(OutboundIntroduction {
            recipient,
            payloads,
        })
    }

    // ===== Backup =====

    /// Export every introduction.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be read.
    pub fn export(&self) -> Result<IntroductionBackup> {
        Ok(self.inner.store.export()?)
    }

    /// Import a backup. Existing rows keep their state.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported backup or a failed write.
    pub async fn import(&self, backup: IntroductionBackup) -> Result<ImportSummary> {
        let inner = self.inner.clone();
        self.pool
            .run(async move { Ok(inner.store.import(&backup)?) })
            .await
    }

    /// Flush pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the flush fails.
    pub fn flush(&self) -> Result<()> {
        Ok(self.inner.store.flush()?)
    }
}

impl fmt::Debug for IntroductionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntroductionService")
            .field("local", &self.inner.local.service_id)
            .field("store", &self.inner.store)
            .field("directory", &"[IdentityDirectory]")
            .field("pool", &self.pool)
            .finish()
    }
}

impl ServiceInner {
    fn load(&self, id: IntroductionId) -> Result<Introduction> {
        self.store
            .get(id)?
            .ok_or(CoreError::IntroductionNotFound(id))
    }

    async fn insert_or_refresh(&self, incoming: IncomingIntroduction) -> Result<InsertOutcome> {
        let introducee = incoming.introducee_service_id;
        let _guard = self.locks.acquire(&introducee).await;

        if self.store.find_duplicate(&incoming)?.is_some() {
            let outcome = self
                .store
                .insert_or_refresh(&incoming, IntroductionState::Pending)?;
            debug!(id = %outcome.id(), introducee = %introducee, "Refreshed duplicate introduction");
            return Ok(outcome);
        }

        let local_key = self.directory.resolve_identity_key(&introducee).await?;
        let state = trust::classify(local_key.as_ref(), &incoming.introducee_identity_key);
        let outcome = self.store.insert_or_refresh(&incoming, state)?;

        info!(
            id = %outcome.id(),
            introducer = %incoming.introducer,
            introducee = %introducee,
            state = %state,
            "Stored introduction"
        );
        Ok(outcome)
    }

    async fn change_state(&self, id: IntroductionId, change: StateChange) -> Result<Introduction> {
        let introducee = self.load(id)?.introducee_service_id;
        let _guard = self.locks.acquire(&introducee).await;

        // Re-read under the lock.
        let row = self.load(id)?;
        let target = match change.apply(row.state) {
            Ok(target) => target,
            Err(e) => {
                warn!(id = %id, from = %e.from, to = %e.to, "Refused introduction state change");
                return Err(e.into());
            }
        };

        let updated = self
            .store
            .update_state(id, row.state, target)
            .map_err(|e| match e {
                StoreError::NotFound(id) => CoreError::IntroductionNotFound(id),
                other => other.into(),
            })?;
        info!(id = %id, from = %row.state, to = %target, "Introduction state changed");

        if let Err(e) = self.cascade(&introducee, target).await {
            self.revert(&introducee, &[(id, target, row.state)]);
            return Err(e);
        }
        Ok(updated)
    }

    async fn forget_introducer(&self, id: IntroductionId) -> Result<Introduction> {
        let introducee = self.load(id)?.introducee_service_id;
        let _guard = self.locks.acquire(&introducee).await;

        let row = self.store.forget_introducer(id).map_err(|e| match e {
            StoreError::NotFound(id) => CoreError::IntroductionNotFound(id),
            other => other.into(),
        })?;
        info!(id = %id, "Forgot introducer");
        Ok(row)
    }

    async fn delete(&self, id: IntroductionId) -> Result<bool> {
        let Some(row) = self.store.get(id)? else {
            return Ok(false);
        };
        let _guard = self.locks.acquire(&row.introducee_service_id).await;

        let deleted = self.store.delete(id)?;
        if deleted {
            info!(id = %id, introducee = %row.introducee_service_id, "Deleted introduction");
        }
        Ok(deleted)
    }

    /// Turn fresh rows stale; with `keep`, rows vouching for that key stay.
    async fn turn_stale(
        &self,
        introducee: ServiceId,
        keep: Option<IdentityKey>,
    ) -> Result<Vec<Introduction>> {
        let _guard = self.locks.acquire(&introducee).await;

        let fresh: Vec<_> = self
            .store
            .for_introducee(&introducee)?
            .into_iter()
            .filter(|row| !row.state.is_stale())
            .filter(|row| keep.map_or(true, |key| row.introducee_identity_key != key))
            .collect();
        if fresh.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<_> = fresh.iter().map(|row| row.id).collect();

        let staled = self.store.mark_stale(&ids).map_err(|e| {
            error!(introducee = %introducee, error = %e, "Stale batch failed");
            CoreError::CascadeInconsistency {
                introducee,
                reason: format!("stale batch failed: {}", e),
            }
        })?;
        info!(introducee = %introducee, count = staled.len(), "Introductions turned stale");

        if let Some(row) = staled.first() {
            if let Err(e) = self.cascade(&introducee, row.state).await {
                let reverts: Vec<_> = staled
                    .iter()
                    .filter_map(|row| {
                        let before = fresh.iter().find(|old| old.id == row.id)?;
                        Some((row.id, row.state, before.state))
                    })
                    .collect();
                self.revert(&introducee, &reverts);
                return Err(e);
            }
        }
        Ok(staled)
    }

    /// Undo row changes whose cascade failed, so a retry starts over.
    fn revert(
        &self,
        introducee: &ServiceId,
        reverts: &[(IntroductionId, IntroductionState, IntroductionState)],
    ) {
        match self.store.revert_states(reverts) {
            Ok(()) => warn!(
                introducee = %introducee,
                count = reverts.len(),
                "Reverted introductions after failed cascade"
            ),
            Err(e) => error!(
                introducee = %introducee,
                error = %e,
                "Failed to revert introductions after failed cascade"
            ),
        }
    }

    /// Re-derive the introducee's verification status after a change to
    /// `new_state`. Contacts without a local key are left alone.
    async fn cascade(&self, introducee: &ServiceId, new_state: IntroductionState) -> Result<()> {
        let fail = |reason: String| {
            error!(introducee = %introducee, reason = %reason, "Verification cascade failed");
            CoreError::CascadeInconsistency {
                introducee: *introducee,
                reason,
            }
        };

        let known = self
            .directory
            .resolve_identity_key(introducee)
            .await
            .map_err(|e| fail(e.to_string()))?;
        if known.is_none() {
            // Stale rows only follow a key change, so the key should be known.
            if new_state.is_stale() {
                warn!(introducee = %introducee, "Introducee has no identity key, stale rows left without cascade");
            } else {
                debug!(introducee = %introducee, "Introducee unknown, skipping verification cascade");
            }
            return Ok(());
        }

        let remaining = Remaining {
            accepted: self
                .store
                .any_in_state(introducee, IntroductionState::Accepted)
                .map_err(|e| fail(e.to_string()))?,
            accepted_conflicting: self
                .store
                .any_in_state(introducee, IntroductionState::AcceptedConflicting)
                .map_err(|e| fail(e.to_string()))?,
        };
        let current = self
            .directory
            .verification_status(introducee)
            .await
            .map_err(|e| fail(e.to_string()))?;
        let next = trust::next_verification_status(current, new_state, remaining);
        if next == current {
            return Ok(());
        }

        let reason = format!("introduction {}", new_state);
        self.directory
            .set_verification_status(introducee, next, &reason)
            .await
            .map_err(|e| fail(e.to_string()))?;
        info!(introducee = %introducee, from = %current, to = %next, "Verification status cascaded");
        Ok(())
    }
}
