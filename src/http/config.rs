//! HTTP client configuration parsed from environment variables.

use std::time::Duration;

use super::retry::{DEFAULT_RETRIES, DEFAULT_RETRY_BASE_MS, DEFAULT_RETRY_MAX_MS, RetryPolicy};
use crate::config::{env_parse, env_string};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// API root without a trailing slash, e.g. `https://tms.example.com/api/v1`.
    pub base_url: String,
    pub timeouts: HttpTimeouts,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }
}

impl HttpConfig {
    /// Default timeouts and retry policy against `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeouts: HttpTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            retry: RetryPolicy::default(),
        }
    }

    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `TRENOVA_API_URL`: default `http://127.0.0.1:8000/api/v1`
    /// - `TRENOVA_HTTP_TIMEOUT_SECS`: default 30
    /// - `TRENOVA_HTTP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TRENOVA_HTTP_RETRIES`: default 3
    /// - `TRENOVA_HTTP_RETRY_BASE_MS`: default 250
    /// - `TRENOVA_HTTP_RETRY_MAX_MS`: default 8000
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env_string("TRENOVA_API_URL", DEFAULT_API_URL);
        let mut config = Self::with_base_url(&base_url);

        config.timeouts = HttpTimeouts {
            request_secs: env_parse("TRENOVA_HTTP_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("TRENOVA_HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        config.retry = RetryPolicy {
            retries: env_parse("TRENOVA_HTTP_RETRIES", DEFAULT_RETRIES),
            base_delay: Duration::from_millis(env_parse("TRENOVA_HTTP_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)),
            max_delay: Duration::from_millis(env_parse("TRENOVA_HTTP_RETRY_MAX_MS", DEFAULT_RETRY_MAX_MS)),
            retry_non_idempotent: false,
        };
        config
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
