//! Shared error classification.

/// Grepable error code and retryable flag, used by callers to pick a toast
/// message and by the HTTP client to decide whether to retry.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
