//! Bounded concurrent dispatch with a per-batch barrier

use crate::error::{SyncError, SyncResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs batches of write operations under a fixed concurrency budget
#[derive(Debug, Clone)]
pub struct BoundedDispatcher {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl BoundedDispatcher {
    /// Dispatcher allowing `max_concurrency` operations in flight
    pub fn new(max_concurrency: usize) -> SyncResult<Self> {
        if max_concurrency == 0 {
            return Err(SyncError::Config(
                "max concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        })
    }

    /// Default budget: one operation per available CPU
    #[must_use]
    pub fn default_concurrency() -> usize {
        num_cpus::get().max(1)
    }

    /// Configured budget
    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every task with at most `max_concurrency` in flight
    ///
    /// Acts as a full barrier: it only returns once every started task has
    /// finished. After the first failure no further task is started, the
    /// in-flight ones are drained, and that first error is returned.
    /// Results come back in completion order.
    pub async fn run_bounded<F, T>(&self, tasks: Vec<F>) -> SyncResult<Vec<T>>
    where
        F: Future<Output = SyncResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let task_count = tasks.len();
        let failed = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();

        for task in tasks {
            let semaphore = Arc::clone(&self.semaphore);
            let failed = Arc::clone(&failed);
            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SyncError::Dispatch(format!("semaphore closed: {e}")))?;
                if failed.load(Ordering::Acquire) {
                    return Ok(None);
                }
                match task.await {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        failed.store(true, Ordering::Release);
                        Err(e)
                    }
                }
            });
        }

        let mut results = Vec::with_capacity(task_count);
        let mut first_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(Some(value))) => results.push(value),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(join_error) => {
                    failed.store(true, Ordering::Release);
                    first_error.get_or_insert(SyncError::Dispatch(join_error.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => {
                tracing::error!(
                    error = %e,
                    completed = results.len(),
                    dispatched = task_count,
                    "Batch aborted"
                );
                Err(e)
            }
            None => Ok(results),
        }
    }
}
