//! Dashboard card contract and cache policy
//!
//! A card fetches its data through the shared [`FetchClient`] and declares
//! how long a successful result may be reused. [`load_card`] honors that
//! policy against a [`ResultCache`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::networking::cache::DEFAULT_CACHE_TTL;
use crate::networking::{FetchClient, FetchResult, RequestInit, ResultCache};

/// Lifetime of a cached card result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Shared across sessions
    Global,
    /// Dropped when the session ends
    Session,
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Global => write!(f, "global"),
            CacheScope::Session => write!(f, "session"),
        }
    }
}

/// How a card's results may be cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(with = "ttl_secs")]
    pub ttl: Duration,
    pub scope: CacheScope,
    /// Whether collaborators may persist the result beyond the process
    pub persist: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            scope: CacheScope::Global,
            persist: false,
        }
    }
}

impl CachePolicy {
    /// Never cache
    pub fn no_cache() -> Self {
        Self {
            ttl: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn session(ttl: Duration) -> Self {
        Self {
            ttl,
            scope: CacheScope::Session,
            persist: false,
        }
    }

    pub fn global(ttl: Duration) -> Self {
        Self {
            ttl,
            scope: CacheScope::Global,
            persist: false,
        }
    }
}

mod ttl_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// A dashboard card backed by the API
pub trait Card: Send + Sync {
    /// Stable identifier, unique per dashboard
    fn id(&self) -> &str;

    /// Cache policy for successful results
    fn cache_policy(&self) -> CachePolicy;

    /// Fetch fresh data
    fn fetch(&self, client: &FetchClient) -> impl Future<Output = Arc<FetchResult>> + Send;
}

/// Card that GETs a fixed API path
#[derive(Debug, Clone)]
pub struct EndpointCard {
    id: String,
    path: String,
    policy: CachePolicy,
}

impl EndpointCard {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            policy: CachePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Card for EndpointCard {
    fn id(&self) -> &str {
        &self.id
    }

    fn cache_policy(&self) -> CachePolicy {
        self.policy
    }

    async fn fetch(&self, client: &FetchClient) -> Arc<FetchResult> {
        client.fetch(&self.path, RequestInit::get()).await
    }
}

/// Cache key for a card under its policy
pub fn cache_key(scope: CacheScope, card_id: &str) -> String {
    format!("{scope}:{card_id}")
}

/// Return a fresh cached result for `card`, or fetch and cache it
pub async fn load_card<C: Card>(card: &C, client: &FetchClient, cache: &ResultCache) -> Arc<FetchResult> {
    let policy = card.cache_policy();
    let key = cache_key(policy.scope, card.id());

    if !policy.ttl.is_zero()
        && let Some(hit) = cache.get(&key).await
    {
        trace!(card = card.id(), "Serving card from cache");
        return hit;
    }

    let result = card.fetch(client).await;
    if cache.put(key, result.clone(), policy.ttl).await {
        debug!(card = card.id(), ttl = ?policy.ttl, "Cached card result");
    }
    result
}

/// Drop every session-scoped card result
pub async fn end_session(cache: &ResultCache) -> usize {
    let removed = cache.remove_prefix(&format!("{}:", CacheScope::Session)).await;
    debug!("Cleared {} session card results", removed);
    removed
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
