//! Single-entry icon fetch with bounded retries
//!
//! Each attempt resolves to either a terminal outcome or a retry cause.
//! Only timeouts and 429 responses are retried; every other failure is
//! final for that entry in this run.

pub mod retry;
pub mod source;

pub use retry::{parse_retry_after, RetryCause, RetryPolicy};
pub use source::{HttpIconSource, IconResponse, IconSource, TransportError};

use crate::cache::IconCache;
use crate::entries::EntryId;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of syncing one entry's icon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Icon already cached, no request made
    CachedHit,
    /// Icon downloaded and stored
    Saved,
    /// Non-200, non-429 status
    ClientError(u16),
    /// 200 without an image content type
    InvalidContent(String),
    /// Transport failure that is not a timeout
    TransientFailure(String),
    /// Retry budget spent on timeouts/rate limits
    ExhaustedRetries(#[serde(serialize_with = "serialize_display")] RetryCause),
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::CachedHit | Self::Saved)
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CachedHit => f.write_str("already cached"),
            Self::Saved => f.write_str("saved"),
            Self::ClientError(status) => write!(f, "status {}", status),
            Self::InvalidContent(ct) => write!(f, "invalid content-type {:?}", ct),
            Self::TransientFailure(reason) => write!(f, "request failed: {}", reason),
            Self::ExhaustedRetries(last) => write!(f, "gave up after retries, last error: {}", last),
        }
    }
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// What a single attempt decided
enum Attempt {
    Done(FetchOutcome),
    Retry(RetryCause),
}

/// Blocking wait between attempts
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Fetches one icon per call, consulting the cache first
pub struct IconFetcher<S> {
    source: S,
    cache: IconCache,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl<S: IconSource> IconFetcher<S> {
    pub fn new(source: S, cache: IconCache, policy: RetryPolicy) -> Self {
        Self {
            source,
            cache,
            policy,
            sleep: Arc::new(std::thread::sleep),
        }
    }

    /// Replace the rate-limit wait (tests record instead of sleeping)
    pub fn with_sleeper(mut self, sleep: Sleeper) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn cache(&self) -> &IconCache {
        &self.cache
    }

    /// Ensure `id` has a cached icon
    ///
    /// Blocks the calling thread for rate-limit waits and network I/O.
    pub fn fetch(&self, id: &EntryId) -> FetchOutcome {
        if self.cache.has(id) {
            debug!("{}: cached", id);
            return FetchOutcome::CachedHit;
        }

        let mut attempts = 0;
        let mut last = None;
        while attempts < self.policy.max_retries {
            attempts += 1;
            match self.attempt(id) {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(cause) => {
                    debug!("{}: attempt {} retryable, {}", id, attempts, cause);
                    last = Some(cause);
                }
            }
        }

        let last = last.unwrap_or_else(|| RetryCause::Timeout("no attempt made".to_string()));
        FetchOutcome::ExhaustedRetries(last)
    }

    fn attempt(&self, id: &EntryId) -> Attempt {
        let response = match self.source.get(id) {
            Ok(response) => response,
            Err(TransportError::Timeout(reason)) => return Attempt::Retry(RetryCause::Timeout(reason)),
            Err(TransportError::Failed(reason)) => {
                return Attempt::Done(FetchOutcome::TransientFailure(reason))
            }
        };

        match response.status {
            429 => {
                let wait = self.policy.rate_limit_wait(response.retry_after.as_deref());
                debug!("{}: rate limited, waiting {:?}", id, wait);
                (self.sleep)(wait);
                Attempt::Retry(RetryCause::RateLimited(wait))
            }
            200 if !response.is_image() => Attempt::Done(FetchOutcome::InvalidContent(
                response.content_type.unwrap_or_default(),
            )),
            200 => match self.cache.save(id, &response.body) {
                Ok(_) => Attempt::Done(FetchOutcome::Saved),
                Err(e) => {
                    warn!("{}: {}", id, e);
                    Attempt::Done(FetchOutcome::TransientFailure(e.to_string()))
                }
            },
            status => Attempt::Done(FetchOutcome::ClientError(status)),
        }
    }
}
