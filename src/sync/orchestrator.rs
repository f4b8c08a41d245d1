//! End-to-end sync run: lock, enumerate, fan out, report, unlock

use super::lock::SyncLock;
use super::pool::WorkerPool;
use crate::entries::{EntryId, EntrySource};
use crate::error::VaultIconResult;
use crate::fetch::{FetchOutcome, IconFetcher, IconSource};
use crate::notify::{messages, Notifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<EntryOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    pub id: EntryId,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl SyncReport {
    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::CachedHit))
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Saved))
    }

    pub fn failed(&self) -> usize {
        self.count(FetchOutcome::is_failure)
    }

    pub fn outcome_for(&self, id: &EntryId) -> Option<&FetchOutcome> {
        self.outcomes
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| &entry.outcome)
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Drives one sync run under the cross-process lock
pub struct SyncOrchestrator<S> {
    lock: SyncLock,
    pool: WorkerPool,
    fetcher: Arc<IconFetcher<S>>,
    notifier: Arc<dyn Notifier>,
}

impl<S: IconSource + 'static> SyncOrchestrator<S> {
    pub fn new(
        lock: SyncLock,
        pool: WorkerPool,
        fetcher: IconFetcher<S>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            lock,
            pool,
            fetcher: Arc::new(fetcher),
            notifier,
        }
    }

    pub fn lock(&self) -> &SyncLock {
        &self.lock
    }

    /// Sync icons for every entry the source lists
    ///
    /// Callers check `lock().try_is_held()` first. The lock is released on
    /// every exit path, including enumeration errors and panics.
    pub async fn sync(&self, entries: &dyn EntrySource) -> VaultIconResult<SyncReport> {
        let guard = self.lock.acquire()?;
        let result = self.run_locked(entries).await;
        let released = guard.release();

        let report = result?;
        released?;
        Ok(report)
    }

    async fn run_locked(&self, entries: &dyn EntrySource) -> VaultIconResult<SyncReport> {
        let started_at = Utc::now();
        let ids = entries.entries().await?;
        info!(
            "Syncing icons for {} entries ({} workers)",
            ids.len(),
            self.pool.concurrency()
        );

        let fetcher = Arc::clone(&self.fetcher);
        let results = self.pool.run(ids, move |id| fetcher.fetch(id)).await;

        for (id, outcome) in results.iter().filter(|(_, o)| o.is_failure()) {
            warn!("Failed to fetch icon for {}: {}", id, outcome);
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            outcomes: results
                .into_iter()
                .map(|(id, outcome)| EntryOutcome { id, outcome })
                .collect(),
        };
        info!(
            "Icon sync finished: {} saved, {} cached, {} failed",
            report.saved(),
            report.cached(),
            report.failed()
        );

        let (summary, body) = messages::SYNC_COMPLETE;
        self.notifier.notify(summary, body);
        Ok(report)
    }
}
