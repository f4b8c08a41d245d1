//! Fixed-width worker pool for blocking fetch tasks
//!
//! Every id gets exactly one outcome. A task that panics is reported as a
//! failure for its own id and never takes the batch down.

use crate::entries::EntryId;
use crate::fetch::FetchOutcome;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const DEFAULT_CONCURRENCY: usize = 15;

/// Runs fetch tasks with bounded parallelism and joins all of them
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// A width of zero is treated as one.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` once per id, at most `concurrency` at a time
    ///
    /// Results arrive in completion order. Returns after every task finished.
    pub async fn run<F>(&self, ids: Vec<EntryId>, task: F) -> Vec<(EntryId, FetchOutcome)>
    where
        F: Fn(&EntryId) -> FetchOutcome + Send + Sync + 'static,
    {
        let total = ids.len();
        let task = Arc::new(task);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<(EntryId, FetchOutcome)> = JoinSet::new();

        for id in ids {
            let task = Arc::clone(&task);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let outcome =
                            FetchOutcome::TransientFailure("worker pool closed".to_string());
                        return (id, outcome);
                    }
                };

                let worker_id = id.clone();
                let outcome = match tokio::task::spawn_blocking(move || task(&worker_id)).await {
                    Ok(outcome) => outcome,
                    Err(join_error) => {
                        warn!("{}: fetch task aborted: {}", id, join_error);
                        FetchOutcome::TransientFailure(format!("fetch task aborted: {}", join_error))
                    }
                };
                (id, outcome)
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, outcome)) => {
                    debug!("[{}/{}] {}: {}", results.len() + 1, total, id, outcome);
                    results.push((id, outcome));
                }
                Err(join_error) => warn!("Worker join error: {}", join_error),
            }
        }

        results
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
