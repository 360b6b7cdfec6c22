use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::FetchResult;

/// Default cache TTL (Time To Live) - 5 minutes
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cached fetch result with its expiry
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub result: Arc<FetchResult>,
    /// `None` when the TTL reaches past what `Instant` can represent
    pub expires: Option<Instant>,
}

impl CachedResult {
    /// Check if the cached result is expired
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| Instant::now() >= expires)
    }

    /// Time left before expiry
    pub fn remaining(&self) -> Duration {
        self.expires
            .map_or(Duration::MAX, |expires| expires.saturating_duration_since(Instant::now()))
    }
}

/// In-memory TTL cache of successful fetch results
#[derive(Clone, Default)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CachedResult>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cached result for `key`; expired entries are evicted
    pub async fn get(&self, key: &str) -> Option<Arc<FetchResult>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired() => {
                    trace!("Cache hit for key: {}", key);
                    return Some(entry.result.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // Another writer may have refreshed the entry between the two locks
        if entries.get(key).is_some_and(CachedResult::is_expired) {
            entries.remove(key);
            trace!("Evicted expired entry: {}", key);
        }
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.result.clone())
    }

    /// Store `result` under `key` for `ttl`
    ///
    /// Returns false without storing when the result is a failure or the TTL
    /// is zero.
    pub async fn put(&self, key: impl Into<String>, result: Arc<FetchResult>, ttl: Duration) -> bool {
        let key = key.into();
        if !result.ok {
            debug!("Not caching non-success result (status {}): {}", result.status, key);
            return false;
        }
        if ttl.is_zero() {
            return false;
        }

        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CachedResult {
                result,
                expires: Instant::now().checked_add(ttl),
            },
        );
        true
    }

    /// Remove a cached entry
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Remove every entry whose key starts with `prefix`
    pub async fn remove_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Get the number of cached entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    include!("cache.test.rs");
}
