//! Per-introducee locks.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, OwnedMutexGuard};
use vouch_identity::ServiceId;

/// Lazily created lock per introducee.
///
/// The map holds weak references; a lock disappears once no task holds or
/// waits on it. `tokio::sync::Mutex` wakes waiters in FIFO order.
#[derive(Debug, Default)]
pub struct IntroduceeLocks {
    locks: Mutex<HashMap<ServiceId, Weak<Mutex<()>>>>,
}

impl IntroduceeLocks {
    /// Create an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `introducee`.
    pub async fn acquire(&self, introducee: &ServiceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(introducee).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(*introducee, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Introducees with a live lock.
    pub async fn active(&self) -> usize {
        let locks = self.locks.lock().await;
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
