//! Retry and politeness delays
//!
//! All delays are pure functions of the attempt number and a jitter
//! fraction in `[0, 1)`, so callers decide where randomness comes from.

use crate::config::FetcherConfig;
use std::time::Duration;

/// Wait applied after a timed-out request
const TIMEOUT_DELAY: Duration = Duration::from_secs(10);

/// Wait applied after TLS, connection or other transport failures
const TRANSPORT_DELAY: Duration = Duration::from_secs(5);

/// Kind of network failure, for choosing the extra delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Tls,
    Connect,
    Other,
}

/// Retry policy of the fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Fixed wait after 403/429
    pub rate_limit_cooldown: Duration,
    /// Cap on the exponential part
    pub max_backoff: Duration,
    /// Upper bound of the random addition
    pub jitter: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            rate_limit_cooldown: Duration::from_secs(config.rate_limit_cooldown_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            jitter: Duration::from_secs(config.backoff_jitter_secs),
        }
    }

    /// `min(max_backoff, 2^attempt s + jitter * fraction)`, attempt 0-based
    pub fn backoff_delay(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        let exponential = 2f64.powi(attempt.min(62) as i32);
        let jitter = self.jitter.as_secs_f64() * jitter_fraction.clamp(0.0, 1.0);
        let capped = (exponential + jitter).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Extra wait before the backoff, by failure kind
    pub fn failure_delay(&self, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::Timeout => TIMEOUT_DELAY,
            FailureKind::Tls | FailureKind::Connect | FailureKind::Other => TRANSPORT_DELAY,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

/// Delay between two page fetches of a site crawl
pub fn politeness_delay(base: Duration, jitter: Duration, jitter_fraction: f64) -> Duration {
    base + jitter.mul_f64(jitter_fraction.clamp(0.0, 1.0))
}
