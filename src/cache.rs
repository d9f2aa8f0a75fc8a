//! Query cache with stale-time freshness and per-key request de-duplication.
//!
//! DESIGN
//! ======
//! Entries are JSON values keyed by `/`-joined segments (`trailer/list/...`,
//! `trailer/detail/{id}`), so a mutation can drop everything under its
//! resource with one prefix invalidation.
//!
//! Concurrent `get_or_fetch` calls for the same key queue on a per-key async
//! lock; the first caller fetches, the rest find the fresh entry when they
//! get the lock. The entry map itself sits behind a std mutex that is never
//! held across an await. A gate is dropped once no caller holds it.
//!
//! Every invalidation bumps a generation counter. A fetch that started before
//! the bump still returns its value to the caller but does not store it, so a
//! mutation or logout cannot be undone by a response that was already in
//! flight.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

struct Entry {
    value: Value,
    fetched_at: Instant,
}

#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<String, Entry>>,
    inflight: Mutex<HashMap<String, Gate>>,
    generation: AtomicU64,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value if younger than `stale`, otherwise run `fetch`
    /// and store its result. Errors are returned without being cached.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, stale: Duration, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.fresh(key, stale, Instant::now()) {
            debug!(key, "cache hit");
            return Ok(value);
        }

        let gate = self.gate(key);
        let result = {
            let _guard = gate.lock().await;
            self.fetch_locked(key, stale, fetch).await
        };
        self.release_gate(key, &gate);
        result
    }

    async fn fetch_locked<F, Fut, E>(&self, key: &str, stale: Duration, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        // Another caller may have filled the entry while we waited.
        if let Some(value) = self.fresh(key, stale, Instant::now()) {
            debug!(key, "cache hit after wait");
            return Ok(value);
        }

        debug!(key, "cache miss");
        let generation = self.generation.load(Ordering::SeqCst);
        let value = fetch().await?;
        // Hold the entry lock across the check so an invalidation cannot slip
        // in between it and the insert.
        let mut entries = self.lock_entries();
        if self.generation.load(Ordering::SeqCst) == generation {
            entries.insert(key.to_owned(), Entry { value: value.clone(), fetched_at: Instant::now() });
        } else {
            debug!(key, "cache invalidated during fetch; result not stored");
        }
        Ok(value)
    }

    /// Cached value regardless of age.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.lock_entries().get(key).map(|e| e.value.clone())
    }

    pub fn set(&self, key: &str, value: Value) {
        self.lock_entries()
            .insert(key.to_owned(), Entry { value, fetched_at: Instant::now() });
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = self.lock_entries();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.remove(key);
        drop(entries);
        self.drop_idle_gates(|k| k == key);
    }

    /// Drop every entry whose key starts with `prefix`. Returns the count.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock_entries();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();
        drop(entries);
        self.drop_idle_gates(|k| k.starts_with(prefix));
        debug!(prefix, removed, "cache invalidated");
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.lock_entries();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
        drop(entries);
        self.drop_idle_gates(|_| true);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self, key: &str, stale: Duration, now: Instant) -> Option<Value> {
        self.lock_entries()
            .get(key)
            .filter(|e| now.duration_since(e.fetched_at) < stale)
            .map(|e| e.value.clone())
    }

    /// Number of keys with a fetch in progress or queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock_inflight().len()
    }

    fn gate(&self, key: &str) -> Gate {
        Arc::clone(self.lock_inflight().entry(key.to_owned()).or_default())
    }

    /// Remove the gate for `key` unless another caller still holds a clone.
    fn release_gate(&self, key: &str, gate: &Gate) {
        let mut inflight = self.lock_inflight();
        // One reference in the map plus ours.
        if inflight.get(key).is_some_and(|g| Arc::ptr_eq(g, gate) && Arc::strong_count(g) <= 2) {
            inflight.remove(key);
        }
    }

    fn drop_idle_gates(&self, matches: impl Fn(&str) -> bool) {
        self.lock_inflight()
            .retain(|k, g| !(matches(k) && Arc::strong_count(g) == 1));
    }

    fn lock_inflight(&self) -> std::sync::MutexGuard<'_, HashMap<String, Gate>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
