//! Remote entity suggestions raced over two transports
//!
//! The same suggest request is issued through the dashboard's own origin
//! and directly against the API. Whichever produces a non-empty list first
//! wins; when both come back empty or failed, the same-origin outcome is
//! preferred.

use futures::future::{Either, select};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::ResolverError;
use crate::networking::{FetchClient, FetchResult, RequestInit};

/// Bound on each suggest transport
pub const SUGGEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Suggestions requested per query
pub const SUGGEST_LIMIT: u32 = 8;

/// Entity returned by the suggest endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestEntity {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

/// Suggest endpoint response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<SuggestEntity>,
}

/// Relative path of the suggest endpoint for `query`
pub fn suggest_path(query: &str, limit: u32) -> String {
    format!(
        "/api/v1/search/suggest?q={}&limit={}",
        utf8_percent_encode(query, NON_ALPHANUMERIC),
        limit
    )
}

/// A transport able to answer suggest queries
pub trait SuggestSource: Send + Sync {
    /// Fetch up to `limit` suggestions, giving up when `cancel` fires
    fn suggest(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<SuggestEntity>, ResolverError>> + Send;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

fn suggest_init(cancel: &CancellationToken) -> RequestInit {
    RequestInit::get()
        .with_retry_count(0)
        .with_timeout(SUGGEST_TIMEOUT)
        .with_cancel(cancel.clone())
}

fn into_suggestions(result: &FetchResult) -> Result<Vec<SuggestEntity>, ResolverError> {
    if result.is_timeout() {
        return Err(ResolverError::TimedOut);
    }
    let response: SuggestResponse = result.json()?;
    Ok(response.suggestions)
}

/// Same-origin transport through the dashboard's proxy
pub struct ProxySuggestSource {
    client: FetchClient,
    origin: String,
}

impl ProxySuggestSource {
    pub fn new(client: FetchClient, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl SuggestSource for ProxySuggestSource {
    async fn suggest(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestEntity>, ResolverError> {
        let url = format!("{}{}", self.origin, suggest_path(query, limit));
        trace!(url = %url, "Requesting suggestions via proxy");
        let result = self.client.request_once(&url, &suggest_init(cancel)).await;
        into_suggestions(&result)
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}

/// Cross-origin transport through the fetch client
pub struct ApiSuggestSource {
    client: FetchClient,
}

impl ApiSuggestSource {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

impl SuggestSource for ApiSuggestSource {
    async fn suggest(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestEntity>, ResolverError> {
        let result = self
            .client
            .fetch(&suggest_path(query, limit), suggest_init(cancel))
            .await;
        into_suggestions(&result)
    }

    fn name(&self) -> &'static str {
        "api"
    }
}

fn has_entities(result: &Result<Vec<SuggestEntity>, ResolverError>) -> bool {
    result.as_ref().is_ok_and(|entities| !entities.is_empty())
}

/// Race both transports for `query`
///
/// Returns the first non-empty list. When neither yields entities, the
/// same-origin result is returned if it succeeded, otherwise the
/// cross-origin one.
pub async fn fetch_suggest<P, A>(
    proxy: &P,
    api: &A,
    query: &str,
    cancel: &CancellationToken,
) -> Result<Vec<SuggestEntity>, ResolverError>
where
    P: SuggestSource,
    A: SuggestSource,
{
    if cancel.is_cancelled() {
        return Err(ResolverError::Cancelled);
    }

    let same_origin = pin!(proxy.suggest(query, SUGGEST_LIMIT, cancel));
    let cross_origin = pin!(api.suggest(query, SUGGEST_LIMIT, cancel));

    let (same, cross) = match select(same_origin, cross_origin).await {
        Either::Left((same, cross_origin)) => {
            if has_entities(&same) {
                debug!(source = proxy.name(), "Suggest race won");
                return same;
            }
            (same, cross_origin.await)
        }
        Either::Right((cross, same_origin)) => {
            if has_entities(&cross) {
                debug!(source = api.name(), "Suggest race won");
                return cross;
            }
            (same_origin.await, cross)
        }
    };

    if has_entities(&same) {
        return same;
    }
    if has_entities(&cross) {
        return cross;
    }
    if cancel.is_cancelled() {
        return Err(ResolverError::Cancelled);
    }
    same.or(cross)
}

/// Scripted suggest source for tests
#[cfg(any(test, feature = "test-utils"))]
pub struct MockSuggestSource {
    name: &'static str,
    response: Result<Vec<SuggestEntity>, String>,
    delay: Duration,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockSuggestSource {
    /// Source answering every query with `entities`
    pub fn with_entities(name: &'static str, entities: Vec<SuggestEntity>) -> Self {
        Self {
            name,
            response: Ok(entities),
            delay: Duration::ZERO,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Source answering every query with an empty list
    pub fn empty(name: &'static str) -> Self {
        Self::with_entities(name, Vec::new())
    }

    /// Source failing every query with `message`
    pub fn failing(name: &'static str, message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            ..Self::empty(name)
        }
    }

    /// Answer only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of queries received
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl SuggestSource for MockSuggestSource {
    async fn suggest(
        &self,
        _query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestEntity>, ResolverError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        tokio::select! {
            _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }

        match &self.response {
            Ok(entities) => Ok(entities.iter().take(limit as usize).cloned().collect()),
            Err(message) => Err(ResolverError::Remote {
                source: crate::networking::NetworkingError::RequestFailed {
                    status: 503,
                    message: message.clone(),
                },
            }),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    include!("suggest.test.rs");
}
