//! Hermetic test environment for E2E testing
//!
//! [`TestApi`] runs a mockito server standing in for the Finuties API and
//! hands out clients, configs, and resolvers wired to it.

use crate::fixtures::mount_cassette;
use anyhow::Result;
use finterm_lib::application::config::AppConfig;
use finterm_lib::networking::retry::BackoffConfig;
use finterm_lib::networking::{FetchClient, HostPolicy, MemoryConfigStore, NetworkingConfig};
use finterm_lib::resolver::{ApiSuggestSource, Catalog, ProxySuggestSource, SmartResolver};
use mockito::{Mock, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

/// Token every test client sends
pub const TEST_TOKEN: &str = "fin_sk_e2e";

/// Resolver type built against live transports
pub type LiveResolver = SmartResolver<ProxySuggestSource, ApiSuggestSource>;

/// Mock API server plus the client settings tests use against it
pub struct TestApi {
    pub server: ServerGuard,
    networking: NetworkingConfig,
}

impl TestApi {
    /// Start a mock API with fast, jitter-free backoff
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
            networking: NetworkingConfig {
                backoff: BackoffConfig::fixed_jitterless(Duration::from_millis(10), Duration::from_millis(40)),
                timeout: Duration::from_secs(5),
                ..NetworkingConfig::default()
            },
        }
    }

    /// Override the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.networking.timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Mount a recorded interaction
    pub async fn mount(&mut self, cassette: &str, hits: usize) -> Result<Mock> {
        mount_cassette(&mut self.server, cassette, hits).await
    }

    /// Client configured for this server
    pub fn client(&self) -> Result<FetchClient> {
        let store = MemoryConfigStore::with_config(HostPolicy::permissive(), &self.url(), TEST_TOKEN)?;
        Ok(FetchClient::new(Arc::new(store), self.networking.clone())?)
    }

    /// Application config pointing at this server
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            api_base: Some(self.url()),
            api_token: Some(TEST_TOKEN.to_string()),
            allow_any_host: true,
            retries: 0,
            ..AppConfig::default()
        }
    }

    /// Resolver whose proxy transport targets `proxy_origin` and whose API
    /// transport targets this server
    pub fn resolver_with_proxy(&self, proxy_origin: &str) -> Result<LiveResolver> {
        let client = self.client()?;
        Ok(SmartResolver::new(
            Arc::new(ProxySuggestSource::new(client.clone(), proxy_origin)),
            Arc::new(ApiSuggestSource::new(client)),
            Arc::new(Catalog::builtin()),
        ))
    }

    /// Resolver with both transports on this server
    pub fn resolver(&self) -> Result<LiveResolver> {
        self.resolver_with_proxy(&self.url())
    }
}

/// Client for an API that is configured but never reached
pub fn unreachable_client() -> Result<FetchClient> {
    let store = MemoryConfigStore::with_config(HostPolicy::permissive(), "http://127.0.0.1:9", TEST_TOKEN)?;
    Ok(FetchClient::new(Arc::new(store), NetworkingConfig::default())?)
}
