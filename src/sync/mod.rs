//! Icon synchronization
//!
//! A sync run takes the cross-process lock, enumerates vault entries, and
//! fetches icons through a bounded worker pool. Per-entry failures are
//! collected in the report; only lock and enumeration problems fail a run.

pub mod lock;
pub mod orchestrator;
pub mod pool;

pub use lock::{LockInfo, SyncLock, SyncLockGuard};
pub use orchestrator::{EntryOutcome, SyncOrchestrator, SyncReport};
pub use pool::{WorkerPool, DEFAULT_CONCURRENCY};

use crate::cache::IconCache;
use crate::config::Config;
use crate::error::VaultIconResult;
use crate::fetch::{HttpIconSource, IconFetcher, RetryPolicy};
use crate::notify::Notifier;
use std::sync::Arc;

/// Build the production orchestrator from configuration
///
/// Creates the cache directory; failing to do so aborts before any lock
/// is taken.
pub fn from_config(
    config: &Config,
    notifier: Arc<dyn Notifier>,
) -> VaultIconResult<SyncOrchestrator<HttpIconSource>> {
    let cache = IconCache::open(&config.icons.cache_dir, &config.icons.default_icon)?;
    let source = HttpIconSource::new(&config.icons.base_url, config.sync.timeout())?;
    let policy = RetryPolicy::new(config.sync.max_retries, config.sync.retry_delay())
        .with_max_wait(config.sync.max_retry_after());

    Ok(SyncOrchestrator::new(
        SyncLock::new(&config.sync.lock_path),
        WorkerPool::new(config.sync.concurrency),
        IconFetcher::new(source, cache, policy),
        notifier,
    ))
}
