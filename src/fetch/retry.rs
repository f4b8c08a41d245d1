//! Retry budget and rate-limit wait handling

use std::fmt;
use std::time::{Duration, SystemTime};

/// Per-task retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per entry; every try counts, including the first
    pub max_retries: u32,
    /// Wait after a 429 without a usable Retry-After header
    pub rate_limit_delay: Duration,
    /// Upper bound on any rate-limit wait, whatever the server asks for
    pub max_rate_limit_wait: Duration,
}

/// Default cap on a single rate-limit wait
pub const DEFAULT_MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_retries: u32, rate_limit_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            rate_limit_delay,
            max_rate_limit_wait: DEFAULT_MAX_RATE_LIMIT_WAIT,
        }
    }

    /// Cap rate-limit waits at `max`
    pub fn with_max_wait(mut self, max: Duration) -> Self {
        self.max_rate_limit_wait = max;
        self
    }

    /// Wait to honour for a 429 response, never longer than the cap
    pub fn rate_limit_wait(&self, retry_after: Option<&str>) -> Duration {
        retry_after
            .and_then(|value| parse_retry_after(value, SystemTime::now()))
            .unwrap_or(self.rate_limit_delay)
            .min(self.max_rate_limit_wait)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(3))
    }
}

/// Why an attempt was retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    /// Request did not finish within the timeout
    Timeout(String),
    /// Server answered 429; we waited this long
    RateLimited(Duration),
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(reason) => write!(f, "timed out: {}", reason),
            Self::RateLimited(wait) => {
                write!(f, "rate limited (waited {}s)", wait.as_secs_f32())
            }
        }
    }
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP-date
///
/// Dates in the past mean "retry now".
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(now).unwrap_or(Duration::ZERO))
}
