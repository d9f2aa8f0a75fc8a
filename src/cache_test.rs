use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::*;

const LONG: Duration = Duration::from_secs(60);

async fn counted_fetch(calls: &AtomicUsize, value: Value) -> Result<Value, String> {
    calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;
    Ok(value)
}

#[tokio::test]
async fn fresh_entries_skip_the_fetch() {
    let cache = QueryCache::new();
    let calls = AtomicUsize::new(0);

    let a = cache.get_or_fetch("trailer/list/", LONG, || counted_fetch(&calls, json!([1]))).await.unwrap();
    let b = cache.get_or_fetch("trailer/list/", LONG, || counted_fetch(&calls, json!([2]))).await.unwrap();

    assert_eq!(a, json!([1]));
    assert_eq!(b, json!([1]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_entries_are_refetched() {
    let cache = QueryCache::new();
    let calls = AtomicUsize::new(0);

    cache.get_or_fetch("k", Duration::ZERO, || counted_fetch(&calls, json!(1))).await.unwrap();
    let v = cache.get_or_fetch("k", Duration::ZERO, || counted_fetch(&calls, json!(2))).await.unwrap();

    assert_eq!(v, json!(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_requests_for_one_key_fetch_once() {
    let cache = QueryCache::new();
    let calls = AtomicUsize::new(0);

    let (a, b) = tokio::join!(
        cache.get_or_fetch("rate/detail/1", LONG, || counted_fetch(&calls, json!({ "id": "1" }))),
        cache.get_or_fetch("rate/detail/1", LONG, || counted_fetch(&calls, json!({ "id": "other" }))),
    );

    assert_eq!(a.unwrap(), json!({ "id": "1" }));
    assert_eq!(b.unwrap(), json!({ "id": "1" }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn errors_are_not_cached() {
    let cache = QueryCache::new();
    let err = cache
        .get_or_fetch("k", LONG, || async { Err::<Value, _>("boom".to_owned()) })
        .await
        .unwrap_err();
    assert_eq!(err, "boom");
    assert!(cache.peek("k").is_none());
}

#[test]
fn prefix_invalidation_only_touches_matching_keys() {
    let cache = QueryCache::new();
    cache.set("trailer/list/limit=10", json!([]));
    cache.set("trailer/detail/1", json!({}));
    cache.set("tractor/list/limit=10", json!([]));

    assert_eq!(cache.invalidate_prefix("trailer/"), 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.peek("tractor/list/limit=10").is_some());

    cache.invalidate("tractor/list/limit=10");
    assert!(cache.is_empty());
}

#[test]
fn clear_drops_everything() {
    let cache = QueryCache::new();
    cache.set("a", json!(1));
    cache.set("b", json!(2));
    cache.clear();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn invalidation_during_fetch_discards_the_result() {
    let cache = Arc::new(QueryCache::new());
    let (release, wait) = tokio::sync::oneshot::channel::<()>();

    let pending = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move {
            cache
                .get_or_fetch("trailer/list/", LONG, move || async move {
                    wait.await.ok();
                    Ok::<_, String>(json!("before-mutation"))
                })
                .await
        }
    });
    while cache.pending() == 0 {
        tokio::task::yield_now().await;
    }

    cache.invalidate_prefix("trailer/");
    release.send(()).unwrap();
    assert_eq!(pending.await.unwrap().unwrap(), json!("before-mutation"));
    assert!(cache.peek("trailer/list/").is_none());

    let calls = AtomicUsize::new(0);
    let v = cache
        .get_or_fetch("trailer/list/", LONG, || counted_fetch(&calls, json!("after-mutation")))
        .await
        .unwrap();
    assert_eq!(v, json!("after-mutation"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gates_are_released_after_each_fetch() {
    let cache = QueryCache::new();
    for page in 0..50 {
        let key = format!("trailer/list/offset={page}");
        cache.get_or_fetch(&key, LONG, || async { Ok::<_, String>(json!([])) }).await.unwrap();
    }
    cache
        .get_or_fetch("trailer/detail/x", LONG, || async { Err::<Value, _>("boom".to_owned()) })
        .await
        .unwrap_err();

    assert_eq!(cache.pending(), 0);
    assert_eq!(cache.len(), 50);
    cache.invalidate_prefix("trailer/");
    assert!(cache.is_empty());
    assert_eq!(cache.pending(), 0);
}
