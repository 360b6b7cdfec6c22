//! Resilient fetch client for the finuties API
//!
//! Wraps outbound HTTP with configuration checks, GET deduplication, bounded
//! retry with exponential backoff, per-request timeout and cancellation, and
//! metering/error extraction. [`FetchClient::fetch`] never fails: every
//! outcome is encoded in the returned [`FetchResult`].

use futures::FutureExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

pub mod cache;
pub mod config;
pub mod inflight;
pub mod response;
pub mod retry;

pub use cache::ResultCache;
pub use config::{ApiConfig, ConfigStore, HostPolicy, MemoryConfigStore, validate_config};
pub use inflight::InflightRegistry;
pub use response::{ItemsEnvelope, Metering};
pub use retry::BackoffConfig;

use response::error_message;
use retry::{clamp_retry_count, is_retryable_status};

/// Error text for timeouts and cancellations
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Error text when no valid API configuration is stored
pub const NOT_CONFIGURED_MESSAGE: &str = "API not configured: set a base URL and token";

/// Networking errors raised while building the client or decoding results
#[derive(Debug, Error)]
pub enum NetworkingError {
    #[error("HTTP client construction failed: {source}")]
    ClientBuild {
        #[from]
        source: reqwest::Error,
    },

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Response has no body")]
    EmptyBody,

    #[error("Response decoding failed: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },
}

/// Fetch client tuning
#[derive(Debug, Clone)]
pub struct NetworkingConfig {
    /// Per-attempt timeout when the caller does not set one
    pub timeout: Duration,
    /// Delay schedule between retries
    pub backoff: BackoffConfig,
    /// User-Agent header value
    pub user_agent: String,
    /// Log every attempt at trace level
    pub trace_requests: bool,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
            user_agent: format!("finterm/{}", env!("CARGO_PKG_VERSION")),
            trace_requests: false,
        }
    }
}

/// Outcome of a logical request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    /// Transport succeeded and the status was 2xx
    pub ok: bool,
    /// HTTP status, or 0 for transport, timeout, and pre-flight failures
    pub status: u16,
    /// Decoded body of a successful response
    pub data: Option<Value>,
    /// Human-readable failure description
    pub error: Option<String>,
    pub token_cost: i64,
    pub credits_remaining: Option<i64>,
}

impl FetchResult {
    /// Failed result with no metering
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            data: None,
            error: Some(error.into()),
            token_cost: 0,
            credits_remaining: None,
        }
    }

    /// Failure caused by timeout or cancellation
    pub fn timed_out() -> Self {
        Self::failure(0, TIMEOUT_MESSAGE)
    }

    /// Whether this failure came from a timeout or cancellation
    pub fn is_timeout(&self) -> bool {
        self.status == 0 && self.error.as_deref() == Some(TIMEOUT_MESSAGE)
    }

    /// Decode the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkingError> {
        if !self.ok {
            return Err(NetworkingError::RequestFailed {
                status: self.status,
                message: self.error.clone().unwrap_or_default(),
            });
        }
        let data = self.data.clone().ok_or(NetworkingError::EmptyBody)?;
        Ok(serde_json::from_value(data)?)
    }

    /// Decode a list body given as `[..]`, `{items: [..]}`, or `{data: [..]}`
    pub fn items<T: DeserializeOwned>(&self) -> Result<Vec<T>, NetworkingError> {
        self.json::<ItemsEnvelope<T>>().map(ItemsEnvelope::into_items)
    }
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// Defaults to GET
    pub method: Method,
    pub headers: HeaderMap,
    /// JSON body
    pub body: Option<Value>,
    /// Retries for transient GET failures, clamped to `[0, 4]`; default 2
    pub retry_count: Option<u32>,
    /// Per-attempt timeout; defaults to the client's
    pub timeout: Option<Duration>,
    /// Caller cancellation, merged with the timeout
    pub cancel: Option<CancellationToken>,
}

impl RequestInit {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Resolves when `token` is cancelled; never resolves for `None`
async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

struct ClientInner {
    http: Client,
    store: Arc<dyn ConfigStore>,
    config: NetworkingConfig,
    inflight: InflightRegistry<Arc<FetchResult>>,
}

/// Fetch client; clones share the HTTP pool and the in-flight registry
#[derive(Clone)]
pub struct FetchClient {
    inner: Arc<ClientInner>,
}

impl FetchClient {
    /// Build a client reading its API configuration from `store`
    pub fn new(store: Arc<dyn ConfigStore>, config: NetworkingConfig) -> Result<Self, NetworkingError> {
        trace!("Initializing fetch client");

        let http = Client::builder().user_agent(config.user_agent.clone()).build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                store,
                config,
                inflight: InflightRegistry::new(),
            }),
        })
    }

    /// Current API configuration, validated
    pub fn api_config(&self) -> Option<ApiConfig> {
        self.inner.store.get_config()
    }

    /// Registry of pending GET requests
    pub fn inflight(&self) -> &InflightRegistry<Arc<FetchResult>> {
        &self.inner.inflight
    }

    /// Perform a logical request against the configured origin
    ///
    /// `path` must start with `/`. Identical pending GETs share one result:
    /// a GET joining a pending one runs under the first caller's options, so
    /// its timeout and cancellation token apply to every joiner.
    pub async fn fetch(&self, path: &str, init: RequestInit) -> Arc<FetchResult> {
        let Some(api) = self.inner.store.get_config() else {
            debug!(path, "Fetch refused: no API configuration");
            return Arc::new(FetchResult::failure(0, NOT_CONFIGURED_MESSAGE));
        };

        if !path.starts_with('/') {
            return Arc::new(FetchResult::failure(
                0,
                format!("Invalid path: {path} (must start with '/')"),
            ));
        }

        let url = api.url_for(path);
        let retries = clamp_retry_count(init.retry_count);

        if init.method != Method::GET {
            return Arc::new(self.inner.run_with_retries(&api, &url, &init, retries).await);
        }

        let key = format!("{}:{}", init.method, url);
        let inner = self.inner.clone();
        self.inner
            .inflight
            .run(key, move || {
                async move { Arc::new(inner.run_with_retries(&api, &url, &init, retries).await) }.boxed()
            })
            .await
    }

    /// GET `path` with default options
    pub async fn get(&self, path: &str) -> Arc<FetchResult> {
        self.fetch(path, RequestInit::get()).await
    }

    /// GET `path` and decode the body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkingError> {
        self.get(path).await.json()
    }

    /// Single physical attempt against an absolute URL
    ///
    /// No dedupe or retry. The bearer token is attached only when `url` shares
    /// the configured API origin and the caller has not set `authorization`.
    pub async fn request_once(&self, url: &str, init: &RequestInit) -> FetchResult {
        let api = self.inner.store.get_config();
        let token = api
            .as_ref()
            .filter(|api| same_origin(url, api.base()))
            .map(ApiConfig::token);
        if token.is_none() && api.is_some() {
            trace!(url, "Credential withheld from foreign origin");
        }
        self.inner.attempt(token, url, init).await
    }
}

fn same_origin(url: &str, origin: &str) -> bool {
    url::Url::parse(url).is_ok_and(|parsed| parsed.origin().ascii_serialization() == origin)
}

impl ClientInner {
    async fn run_with_retries(&self, api: &ApiConfig, url: &str, init: &RequestInit, retries: u32) -> FetchResult {
        let may_retry = init.method == Method::GET;
        let mut attempt = 0;

        loop {
            let result = self.attempt(Some(api.token()), url, init).await;

            let retry = may_retry
                && attempt < retries
                && is_retryable_status(result.status)
                && !init.is_cancelled();
            if !retry {
                if !result.ok {
                    debug!(url, status = result.status, attempts = attempt + 1, "Request failed");
                }
                return result;
            }

            let delay = self.config.backoff.delay(attempt);
            debug!(
                url,
                status = result.status,
                "Transient failure, retrying in {:?} (retry {}/{})",
                delay,
                attempt + 1,
                retries
            );

            tokio::select! {
                _ = cancelled(init.cancel.as_ref()) => return FetchResult::timed_out(),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, token: Option<&str>, url: &str, init: &RequestInit) -> FetchResult {
        let mut headers = init.headers.clone();
        if let Some(token) = token
            && !headers.contains_key(AUTHORIZATION)
        {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => return FetchResult::failure(0, "API token contains invalid header characters"),
            }
        }

        let mut request = self.http.request(init.method.clone(), url).headers(headers);
        if let Some(body) = &init.body {
            request = request.json(body);
        }

        if self.config.trace_requests {
            trace!(method = %init.method, url, "Dispatching request");
        }

        let timeout = init.timeout.unwrap_or(self.config.timeout);
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, headers, text))
        };

        let outcome = tokio::select! {
            _ = cancelled(init.cancel.as_ref()) => None,
            timed = tokio::time::timeout(timeout, exchange) => timed.ok(),
        };

        let (status, headers, text) = match outcome {
            None => {
                debug!(url, "Request timed out or was cancelled");
                return FetchResult::timed_out();
            }
            Some(Err(e)) if e.is_timeout() => return FetchResult::timed_out(),
            Some(Err(e)) => {
                warn!(url, "Network error: {}", e);
                return FetchResult::failure(0, format!("Network error: {e}"));
            }
            Some(Ok(parts)) => parts,
        };

        let metering = Metering::from_headers(&headers);
        let body = parse_body(&text);
        let ok = (200..300).contains(&status);

        if self.config.trace_requests {
            trace!(url, status, token_cost = metering.token_cost, "Response received");
        }

        FetchResult {
            ok,
            status,
            error: (!ok).then(|| error_message(status, body.as_ref())),
            data: if ok { body } else { None },
            token_cost: metering.token_cost,
            credits_remaining: metering.credits_remaining,
        }
    }
}

/// JSON when the body parses, the raw text otherwise, `None` when blank
fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}
