use super::*;

fn policy(base_ms: u64, max_ms: u64) -> RetryPolicy {
    RetryPolicy {
        retries: 5,
        base_delay: Duration::from_millis(base_ms),
        max_delay: Duration::from_millis(max_ms),
        retry_non_idempotent: false,
    }
}

#[test]
fn backoff_doubles_per_retry() {
    let p = policy(100, 10_000);
    assert_eq!(p.base_backoff(0), Duration::from_millis(100));
    assert_eq!(p.base_backoff(1), Duration::from_millis(200));
    assert_eq!(p.base_backoff(2), Duration::from_millis(400));
    assert_eq!(p.base_backoff(3), Duration::from_millis(800));
}

#[test]
fn backoff_is_capped() {
    let p = policy(100, 500);
    assert_eq!(p.base_backoff(10), Duration::from_millis(500));
    assert_eq!(p.base_backoff(u32::MAX), Duration::from_millis(500));
}

#[test]
fn jitter_stays_within_ten_percent_and_cap() {
    let p = policy(1_000, 60_000);
    for retry in 0..4 {
        let base = p.base_backoff(retry);
        let delay = p.backoff(retry);
        assert!(delay >= base);
        assert!(delay <= base + base / 10);
    }
    let capped = policy(1_000, 1_000);
    assert_eq!(capped.backoff(3), Duration::from_millis(1_000));
}

#[test]
fn max_attempts_counts_first_try() {
    assert_eq!(RetryPolicy::default().max_attempts(), DEFAULT_RETRIES + 1);
    assert_eq!(RetryPolicy::none().max_attempts(), 1);
}

#[test]
fn only_idempotent_methods_retry_by_default() {
    let p = RetryPolicy::default();
    assert!(p.allows_method(&Method::GET));
    assert!(p.allows_method(&Method::PUT));
    assert!(p.allows_method(&Method::DELETE));
    assert!(!p.allows_method(&Method::POST));
    assert!(!p.allows_method(&Method::PATCH));

    let eager = RetryPolicy { retry_non_idempotent: true, ..RetryPolicy::default() };
    assert!(eager.allows_method(&Method::POST));
}
