//! Smart Resolver for the explorer search box
//!
//! Combines an instant local pass over static pools with a remote suggest
//! race, then merges both into one ranked list with conflict detection.
//!
//! # Delivery
//!
//! - [`SmartResolver::resolve_search`] waits for the remote phase and returns
//!   one final result.
//! - [`SmartResolver::resolve_search_progressive`] delivers the local result
//!   immediately and the merged result later, and can be cancelled in
//!   between.
//!
//! Remote failures never surface as errors: the resolver degrades to the
//! local result.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub mod catalog;
pub mod fuzzy;
pub mod merge;
pub mod suggest;

pub use catalog::Catalog;
pub use merge::{Merged, detect_conflict, entities_to_matches, merge_and_score};
pub use suggest::{ApiSuggestSource, ProxySuggestSource, SuggestEntity, SuggestSource, fetch_suggest};

use crate::networking::NetworkingError;

/// Queries shorter than this (after trimming) skip resolution entirely
pub const MIN_QUERY_CHARS: usize = 2;

/// Resolver errors, raised by suggest transports
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Suggest request failed: {source}")]
    Remote {
        #[from]
        source: NetworkingError,
    },

    #[error("Suggest request timed out")]
    TimedOut,

    #[error("Suggest request cancelled")]
    Cancelled,
}

/// What a match points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Country,
    Entity,
    Dataset,
    Category,
    Vocabulary,
}

impl MatchKind {
    /// Icon name shown next to the match
    pub fn icon(self) -> &'static str {
        match self {
            MatchKind::Country => "globe",
            MatchKind::Entity => "building",
            MatchKind::Dataset => "database",
            MatchKind::Category => "folder",
            MatchKind::Vocabulary => "book",
        }
    }

    /// Accent color for the match
    pub fn color(self) -> &'static str {
        match self {
            MatchKind::Country => "#22c55e",
            MatchKind::Entity => "#3b82f6",
            MatchKind::Dataset => "#f59e0b",
            MatchKind::Category => "#a855f7",
            MatchKind::Vocabulary => "#64748b",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchKind::Country => "country",
            MatchKind::Entity => "entity",
            MatchKind::Dataset => "dataset",
            MatchKind::Category => "category",
            MatchKind::Vocabulary => "vocabulary",
        };
        f.write_str(name)
    }
}

/// A scored candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMatch {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub label: String,
    pub description: String,
    pub href: String,
    pub icon: String,
    pub color: String,
    /// 0-100, higher is stronger
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cik: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso3: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_types: Vec<String>,
}

impl ResolvedMatch {
    /// Match with the kind's icon and color and no identifiers
    pub fn new(kind: MatchKind, label: &str, description: String, href: String, score: f64) -> Self {
        Self {
            kind,
            label: label.to_string(),
            description,
            href,
            icon: kind.icon().to_string(),
            color: kind.color().to_string(),
            score,
            cik: None,
            symbol: None,
            iso3: None,
            sub_types: Vec::new(),
        }
    }
}

/// Ranked resolution outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveResult {
    pub query: String,
    pub matches: Vec<ResolvedMatch>,
    pub best: Option<ResolvedMatch>,
    pub has_conflict: bool,
    pub elapsed_ms: u64,
    /// No remote entities contributed
    pub local_only: bool,
}

impl ResolveResult {
    /// Empty result for a query too short to resolve
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            matches: Vec::new(),
            best: None,
            has_conflict: false,
            elapsed_ms: 0,
            local_only: true,
        }
    }

    fn from_merged(query: &str, merged: Merged, started: Instant, local_only: bool) -> Self {
        Self {
            query: query.to_string(),
            matches: merged.matches,
            best: merged.best,
            has_conflict: merged.has_conflict,
            elapsed_ms: started.elapsed().as_millis() as u64,
            local_only,
        }
    }
}

fn is_short_query(query: &str) -> bool {
    query.trim().chars().count() < MIN_QUERY_CHARS
}

/// Progressive delivery state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    LocalDelivered,
    FullDelivered,
    Cancelled,
}

/// Handle on a progressive resolution
pub struct ProgressiveHandle {
    state: Arc<Mutex<ProgressState>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressiveHandle {
    /// Stop the remote phase; the full callback will not run afterwards
    ///
    /// No effect once the full result has been delivered.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, ProgressState::Idle | ProgressState::LocalDelivered) {
            *state = ProgressState::Cancelled;
            self.cancel.cancel();
            debug!("Progressive resolution cancelled");
        }
    }

    pub fn state(&self) -> ProgressState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the remote phase to finish or observe its cancellation
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Progressive resolution task failed: {}", e);
        }
    }
}

/// Resolver over a local catalog and two suggest transports
///
/// # Examples
///
/// ```no_run
/// use finterm_lib::networking::{FetchClient, MemoryConfigStore, NetworkingConfig};
/// use finterm_lib::resolver::{ApiSuggestSource, Catalog, ProxySuggestSource, SmartResolver};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryConfigStore::default());
/// let client = FetchClient::new(store, NetworkingConfig::default())?;
/// let resolver = SmartResolver::new(
///     Arc::new(ProxySuggestSource::new(client.clone(), "https://terminal.finuties.com")),
///     Arc::new(ApiSuggestSource::new(client)),
///     Arc::new(Catalog::builtin()),
/// );
///
/// let result = resolver.resolve_search("apple").await;
/// println!("{} matches", result.matches.len());
/// # Ok(())
/// # }
/// ```
pub struct SmartResolver<P, A>
where
    P: SuggestSource,
    A: SuggestSource,
{
    proxy: Arc<P>,
    api: Arc<A>,
    catalog: Arc<Catalog>,
}

impl<P, A> Clone for SmartResolver<P, A>
where
    P: SuggestSource,
    A: SuggestSource,
{
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            api: self.api.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<P, A> SmartResolver<P, A>
where
    P: SuggestSource + 'static,
    A: SuggestSource + 'static,
{
    pub fn new(proxy: Arc<P>, api: Arc<A>, catalog: Arc<Catalog>) -> Self {
        Self { proxy, api, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Local matches only, no network
    pub fn resolve_local(&self, query: &str) -> Vec<ResolvedMatch> {
        self.catalog.resolve_local(query)
    }

    /// Run the remote race and merge it with `local`
    async fn remote_result(
        proxy: &P,
        api: &A,
        query: &str,
        local: Vec<ResolvedMatch>,
        started: Instant,
        cancel: &CancellationToken,
    ) -> ResolveResult {
        match fetch_suggest(proxy, api, query.trim(), cancel).await {
            Ok(entities) => {
                let local_only = entities.is_empty();
                let merged = merge_and_score(entities_to_matches(query, &entities), local);
                ResolveResult::from_merged(query, merged, started, local_only)
            }
            Err(e) => {
                warn!(query, "Remote suggestions unavailable, using local matches: {}", e);
                ResolveResult::from_merged(query, merge_and_score(Vec::new(), local), started, true)
            }
        }
    }

    /// Resolve `query` and wait for the remote phase
    pub async fn resolve_search(&self, query: &str) -> ResolveResult {
        if is_short_query(query) {
            return ResolveResult::empty(query);
        }

        let started = Instant::now();
        let local = self.resolve_local(query);
        Self::remote_result(
            &self.proxy,
            &self.api,
            query,
            local,
            started,
            &CancellationToken::new(),
        )
        .await
    }

    /// Resolve `query` in two deliveries
    ///
    /// `on_local` runs before this returns, with `local_only` set. The remote
    /// race runs on a spawned task and `on_full` receives the merged result
    /// unless the handle is cancelled first. Must be called inside a tokio
    /// runtime.
    pub fn resolve_search_progressive<L, F>(&self, query: &str, on_local: L, on_full: F) -> ProgressiveHandle
    where
        L: FnOnce(ResolveResult),
        F: FnOnce(ResolveResult) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(ProgressState::Idle));
        let cancel = CancellationToken::new();

        if is_short_query(query) {
            on_local(ResolveResult::empty(query));
            on_full(ResolveResult::empty(query));
            *state.lock().unwrap_or_else(PoisonError::into_inner) = ProgressState::FullDelivered;
            return ProgressiveHandle {
                state,
                cancel,
                task: None,
            };
        }

        let started = Instant::now();
        let local = self.resolve_local(query);
        on_local(ResolveResult::from_merged(
            query,
            merge_and_score(Vec::new(), local.clone()),
            started,
            true,
        ));
        *state.lock().unwrap_or_else(PoisonError::into_inner) = ProgressState::LocalDelivered;

        let proxy = self.proxy.clone();
        let api = self.api.clone();
        let query = query.to_string();
        let task_state = state.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let result = Self::remote_result(&proxy, &api, &query, local, started, &task_cancel).await;

            {
                let mut state = task_state.lock().unwrap_or_else(PoisonError::into_inner);
                if *state != ProgressState::LocalDelivered || task_cancel.is_cancelled() {
                    debug!(query = %query, "Dropping full result after cancellation");
                    return;
                }
                *state = ProgressState::FullDelivered;
            }

            on_full(result);
        });

        ProgressiveHandle {
            state,
            cancel,
            task: Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
