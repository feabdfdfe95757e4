//! Resumable receive batches.
//!
//! A decoded introduction message becomes a [`ReceiveBatch`]: the payloads
//! still to land, how many already landed, and how many attempts were
//! made. The job layer persists the batch between attempts and hands it
//! back to [`IntroductionService::process_batch`], which resumes from the
//! first payload that has not landed.
//!
//! [`IntroductionService::process_batch`]: crate::IntroductionService::process_batch

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use vouch_identity::ServiceId;
use vouch_protocol::{message, Introducer, IntroduceePayload, ProtocolError};
use vouch_store::IncomingIntroduction;

use crate::error::{CoreError, Result};

/// Pending work for one received introduction message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveBatch {
    /// Sender of the message.
    pub introducer: ServiceId,
    /// When the message was received, in milliseconds since the epoch.
    pub received_at: i64,
    /// Payloads not yet stored, in message order.
    pub remaining: VecDeque<IntroduceePayload>,
    /// Payloads stored so far.
    pub completed: usize,
    /// Processing attempts started.
    pub attempts: u32,
    /// When the batch was created, in milliseconds since the epoch.
    pub created_at: i64,
}

impl ReceiveBatch {
    /// Create a batch for `payloads` received from `introducer`.
    pub fn new(introducer: ServiceId, payloads: Vec<IntroduceePayload>, received_at: i64) -> Self {
        Self {
            introducer,
            received_at,
            remaining: payloads.into(),
            completed: 0,
            attempts: 0,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Decode a message body into a batch.
    ///
    /// Returns `Ok(None)` when the body is not an introduction.
    ///
    /// # Errors
    ///
    /// Returns the decode error for a marked but malformed body.
    pub fn from_message(
        introducer: ServiceId,
        body: &str,
        received_at: i64,
    ) -> std::result::Result<Option<Self>, ProtocolError> {
        Ok(message::decode(body)?.map(|payloads| Self::new(introducer, payloads, received_at)))
    }

    /// Check if every payload has landed.
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Check if the batch has used up its attempts.
    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    /// Check if the batch outlived `lifespan` at `now_millis`.
    pub fn is_expired(&self, lifespan: Duration, now_millis: i64) -> bool {
        let lifespan_millis = i64::try_from(lifespan.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_sub(self.created_at) >= lifespan_millis
    }

    /// Serialize for the job queue.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::TaskFailed(format!("Failed to serialize batch: {}", e)))
    }

    /// Restore from the job queue.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::TaskFailed(format!("Failed to parse batch: {}", e)))
    }

    /// The next payload as an introduction to store.
    pub(crate) fn next_incoming(&self) -> Option<IncomingIntroduction> {
        self.remaining.front().map(|payload| {
            IncomingIntroduction::from_payload(
                Introducer::Known(self.introducer),
                payload.clone(),
                self.received_at,
            )
        })
    }

    /// Record that the front payload landed.
    pub(crate) fn mark_landed(&mut self) {
        if self.remaining.pop_front().is_some() {
            self.completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_identity::IdentityKey;
    use vouch_protocol::PredictedFingerprint;

    fn payload(name: &str) -> IntroduceePayload {
        IntroduceePayload {
            name: name.into(),
            number: None,
            service_id: ServiceId::random_aci(),
            identity_key: IdentityKey::from_public_bytes([4; 32]),
            predicted_fingerprint: PredictedFingerprint::new(&"5".repeat(60)).unwrap(),
        }
    }

    #[test]
    fn test_from_message() {
        let introducer = ServiceId::random_aci();
        let body = message::encode(&[payload("Carol"), payload("Dave")]).unwrap();

        let batch = ReceiveBatch::from_message(introducer, &body, 42).unwrap().unwrap();
        assert_eq!(batch.remaining.len(), 2);
        assert_eq!(batch.received_at, 42);
        assert_eq!(batch.completed, 0);

        assert!(ReceiveBatch::from_message(introducer, "hello", 42).unwrap().is_none());
        let marked_garbage = format!("{}{}not json", vouch_protocol::MARKER, vouch_protocol::SEPARATOR);
        assert!(ReceiveBatch::from_message(introducer, &marked_garbage, 42).is_err());
    }

    #[test]
    fn test_landing_advances() {
        let introducer = ServiceId::random_aci();
        let mut batch = ReceiveBatch::new(introducer, vec![payload("Carol"), payload("Dave")], 7);

        let first = batch.next_incoming().unwrap();
        assert_eq!(first.introducee_name, "Carol");
        assert_eq!(first.introducer, Introducer::Known(introducer));
        assert_eq!(first.timestamp, 7);

        batch.mark_landed();
        assert_eq!(batch.next_incoming().unwrap().introducee_name, "Dave");
        batch.mark_landed();
        batch.mark_landed();

        assert!(batch.is_complete());
        assert_eq!(batch.completed, 2);
        assert!(batch.next_incoming().is_none());
    }

    #[test]
    fn test_limits() {
        let mut batch = ReceiveBatch::new(ServiceId::random_aci(), vec![payload("Carol")], 0);
        batch.created_at = 1_000;

        assert!(!batch.is_exhausted(10));
        batch.attempts = 10;
        assert!(batch.is_exhausted(10));

        let day = Duration::from_secs(86_400);
        assert!(!batch.is_expired(day, 1_000 + 86_399_999));
        assert!(batch.is_expired(day, 1_000 + 86_400_000));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut batch = ReceiveBatch::new(ServiceId::random_aci(), vec![payload("Carol")], 3);
        batch.attempts = 2;

        let restored = ReceiveBatch::from_json(&batch.to_json().unwrap()).unwrap();
        assert_eq!(restored, batch);
        assert!(ReceiveBatch::from_json("[]").is_err());
    }
}
