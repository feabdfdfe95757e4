//! Bounded worker pool.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{CoreError, Result};

/// Runs futures as tokio tasks, at most `size` at a time.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool of `size` workers.
    pub fn new(size: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers currently idle.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `task` on a worker and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or [`CoreError::TaskFailed`] if the
    /// task panicked or the pool was closed.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::TaskFailed(format!("Worker pool closed: {}", e)))?;

        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });

        handle
            .await
            .map_err(|e| CoreError::TaskFailed(format!("Worker task failed: {}", e)))?
    }
}
