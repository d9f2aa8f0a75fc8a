//! Retry policy with capped exponential backoff.

use std::time::Duration;

use rand::Rng;
use reqwest::Method;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_MS: u64 = 250;
pub const DEFAULT_RETRY_MAX_MS: u64 = 8_000;

/// Fraction of the computed delay added as random jitter.
const JITTER_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Also retry POST/PATCH. Off by default since those may not be idempotent.
    pub retry_non_idempotent: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_MS),
            retry_non_idempotent: false,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self { retries: 0, ..Self::default() }
    }

    /// Total attempts a request may make, including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.retry_non_idempotent || is_idempotent(method)
    }

    /// Backoff before retry number `retry` (zero-based), without jitter.
    #[must_use]
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff with up to 10% random jitter, still capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff(retry);
        let jitter = base.mul_f64(rand::rng().random_range(0.0..=JITTER_RATIO));
        (base + jitter).min(self.max_delay)
    }
}

fn is_idempotent(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::PUT, Method::DELETE, Method::TRACE].contains(method)
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
