use super::*;

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_http_env() {
    unsafe {
        std::env::remove_var("TRENOVA_API_URL");
        std::env::remove_var("TRENOVA_HTTP_TIMEOUT_SECS");
        std::env::remove_var("TRENOVA_HTTP_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("TRENOVA_HTTP_RETRIES");
        std::env::remove_var("TRENOVA_HTTP_RETRY_BASE_MS");
        std::env::remove_var("TRENOVA_HTTP_RETRY_MAX_MS");
    }
}

#[test]
fn from_env_defaults_and_overrides() {
    unsafe { clear_http_env() };

    let cfg = HttpConfig::from_env();
    assert_eq!(cfg, HttpConfig::default());
    assert_eq!(cfg.base_url, DEFAULT_API_URL);
    assert_eq!(cfg.retry.retries, DEFAULT_RETRIES);

    unsafe {
        std::env::set_var("TRENOVA_API_URL", "https://tms.example.test/api/v1/");
        std::env::set_var("TRENOVA_HTTP_TIMEOUT_SECS", "5");
        std::env::set_var("TRENOVA_HTTP_CONNECT_TIMEOUT_SECS", "2");
        std::env::set_var("TRENOVA_HTTP_RETRIES", "1");
        std::env::set_var("TRENOVA_HTTP_RETRY_BASE_MS", "10");
        std::env::set_var("TRENOVA_HTTP_RETRY_MAX_MS", "nope");
    }

    let cfg = HttpConfig::from_env();
    assert_eq!(cfg.base_url, "https://tms.example.test/api/v1");
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.retry.retries, 1);
    assert_eq!(cfg.retry.base_delay, Duration::from_millis(10));
    assert_eq!(cfg.retry.max_delay, Duration::from_millis(DEFAULT_RETRY_MAX_MS));

    unsafe { clear_http_env() };
}

#[test]
fn with_base_url_strips_trailing_slashes() {
    let cfg = HttpConfig::with_base_url("http://localhost:8000//");
    assert_eq!(cfg.base_url, "http://localhost:8000");
}
