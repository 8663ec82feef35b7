//! Query result cache with explicit invalidation.
//!
//! Entries are JSON-encoded results keyed by [`QueryKey`]. Invalidation marks
//! entries stale; the next read through [`QueryCache::get_or_fetch`] fetches
//! again. No lock is held while a fetch runs.
//!
//! The cache holds at most `capacity` entries. Inserting past that evicts a
//! stale entry if there is one, otherwise the least recently fetched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use domain::models::QueryKey;

const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stale: bool,
    fetched_at: DateTime<Utc>,
}

/// Fetches running for one key. Only tracked while at least one is
/// outstanding.
#[derive(Debug, Default)]
struct InflightFetches {
    /// Bumped by invalidation; a fetch that started under an older
    /// generation is returned but not stored.
    generation: u64,
    running: usize,
}

type InflightMap = HashMap<QueryKey, InflightFetches>;

fn lock_inflight(inflight: &Mutex<InflightMap>) -> MutexGuard<'_, InflightMap> {
    inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deregisters a fetch when it finishes, fails or is dropped.
struct FetchGuard<'a> {
    inflight: &'a Mutex<InflightMap>,
    key: QueryKey,
    generation: u64,
}

impl<'a> FetchGuard<'a> {
    fn register(inflight: &'a Mutex<InflightMap>, key: &QueryKey) -> Self {
        let mut map = lock_inflight(inflight);
        let fetches = map.entry(key.clone()).or_default();
        fetches.running += 1;
        Self {
            inflight,
            key: key.clone(),
            generation: fetches.generation,
        }
    }

    fn is_current(&self) -> bool {
        lock_inflight(self.inflight)
            .get(&self.key)
            .map(|fetches| fetches.generation == self.generation)
            .unwrap_or(false)
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut map = lock_inflight(self.inflight);
        if let Some(fetches) = map.get_mut(&self.key) {
            fetches.running = fetches.running.saturating_sub(1);
            if fetches.running == 0 {
                map.remove(&self.key);
            }
        }
    }
}

#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    inflight: Mutex<InflightMap>,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Stores a fresh value for `key`.
    pub async fn put(&self, key: QueryKey, value: Value) {
        let mut entries = self.entries.write().await;
        self.insert_bounded(&mut entries, key, value);
    }

    /// Marks exactly the given keys stale. Other entries are untouched.
    pub async fn invalidate(&self, keys: &[QueryKey]) {
        let mut entries = self.entries.write().await;
        let mut inflight = lock_inflight(&self.inflight);
        for key in keys {
            if let Some(fetches) = inflight.get_mut(key) {
                fetches.generation += 1;
            }
            if let Some(entry) = entries.get_mut(key) {
                entry.stale = true;
            }
        }
        tracing::debug!(keys = ?keys, "Invalidated cached queries");
    }

    /// `Some(true)` if `key` is cached but stale, `Some(false)` if fresh,
    /// `None` if never cached.
    pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| entry.stale)
    }

    /// Reads through the cache: returns the fresh entry for `key`, or runs
    /// `fetch` and caches its result.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let guard = {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key).filter(|e| !e.stale) {
                if let Ok(value) = serde_json::from_value(entry.value.clone()) {
                    return Ok(value);
                }
            }
            // Registered under the read lock so no invalidation slips in
            // between the freshness check and the fetch.
            FetchGuard::register(&self.inflight, &key)
        };

        let fetched = fetch().await?;

        match serde_json::to_value(&fetched) {
            Ok(value) => {
                let mut entries = self.entries.write().await;
                if guard.is_current() {
                    self.insert_bounded(&mut entries, key, value);
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Query result not cacheable"),
        }

        Ok(fetched)
    }

    fn insert_bounded(
        &self,
        entries: &mut HashMap<QueryKey, CacheEntry>,
        key: QueryKey,
        value: Value,
    ) {
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let victim = entries
                .iter()
                .min_by_key(|(_, entry)| (!entry.stale, entry.fetched_at))
                .map(|(victim, _)| victim.clone());
            if let Some(victim) = victim {
                entries.remove(&victim);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                stale: false,
                fetched_at: Utc::now(),
            },
        );
    }
}
