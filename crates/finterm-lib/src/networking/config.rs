//! API origin configuration, host allow-list policy, and config storage
//!
//! Every read and write of stored configuration passes through
//! [`validate_config`]; a stored value that stops validating is discarded
//! rather than handed to the fetch client.

use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};
use url::Url;

use crate::primitives::ConfigError;

/// Domain whose subdomains are trusted API origins
pub const TRUSTED_DOMAIN: &str = "finuties.com";

/// Host allow-list applied to configured API origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    /// Trusted registrable domain; the domain itself and any subdomain pass
    pub trusted_domain: String,
    /// Additional hosts accepted by exact match
    pub allowed_hosts: Vec<String>,
    /// Accept any host (development override)
    pub allow_any_host: bool,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self {
            trusted_domain: TRUSTED_DOMAIN.to_string(),
            allowed_hosts: Vec::new(),
            allow_any_host: false,
        }
    }
}

impl HostPolicy {
    /// Policy that accepts every host
    pub fn permissive() -> Self {
        Self {
            allow_any_host: true,
            ..Self::default()
        }
    }

    /// Add an exact-match host to the allow-list
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into().to_ascii_lowercase());
        self
    }

    /// Check a lowercase host against the policy
    pub fn allows(&self, host: &str) -> bool {
        if self.allow_any_host {
            return true;
        }

        let host = host.to_ascii_lowercase();
        if self.allowed_hosts.iter().any(|allowed| *allowed == host) {
            return true;
        }

        let domain = self.trusted_domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

/// Validated API configuration: an origin and a bearer token
///
/// Construct through [`validate_config`]. `Debug` output redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base: String,
    token: String,
}

impl ApiConfig {
    /// Origin (`scheme://host[:port]`) without a trailing slash
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Bearer token, trimmed
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute URL for an API path beginning with `/`
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base", &self.base)
            .field("token", &"***REDACTED***")
            .finish()
    }
}

/// Validate and normalize an API base URL and token
///
/// The base is reduced to its origin; the token is trimmed. Fails when the
/// URL does not parse, is not http(s), has no host, when the token is blank,
/// or when the host is rejected by `policy`.
pub fn validate_config(base: &str, token: &str, policy: &HostPolicy) -> Result<ApiConfig, ConfigError> {
    let parsed = Url::parse(base.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        value: base.to_string(),
        source,
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::UnsupportedScheme {
                scheme: other.to_string(),
            });
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ConfigError::MissingHost {
            value: base.to_string(),
        })?
        .to_ascii_lowercase();

    let token = token.trim();
    if token.is_empty() {
        return Err(ConfigError::EmptyToken);
    }

    if !policy.allows(&host) {
        return Err(ConfigError::HostNotAllowed { host });
    }

    Ok(ApiConfig {
        base: parsed.origin().ascii_serialization(),
        token: token.to_string(),
    })
}

/// Storage for the active API configuration
pub trait ConfigStore: Send + Sync {
    /// Current configuration, or `None` when unset or no longer valid
    fn get_config(&self) -> Option<ApiConfig>;

    /// Store a configuration; returns `false` when it fails validation
    fn set_config(&self, config: ApiConfig) -> bool;

    /// Remove any stored configuration
    fn clear_config(&self);
}

#[derive(Debug, Clone)]
struct StoredConfig {
    base: String,
    token: String,
}

/// In-process config store that re-validates on every read and write
#[derive(Debug)]
pub struct MemoryConfigStore {
    policy: HostPolicy,
    slot: RwLock<Option<StoredConfig>>,
}

impl MemoryConfigStore {
    /// Create an empty store governed by `policy`
    pub fn new(policy: HostPolicy) -> Self {
        Self {
            policy,
            slot: RwLock::new(None),
        }
    }

    /// Create a store holding `base`/`token` if they validate
    pub fn with_config(policy: HostPolicy, base: &str, token: &str) -> Result<Self, ConfigError> {
        let config = validate_config(base, token, &policy)?;
        let store = Self::new(policy);
        store.set_config(config);
        Ok(store)
    }

    /// Policy applied by this store
    pub fn policy(&self) -> &HostPolicy {
        &self.policy
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new(HostPolicy::default())
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_config(&self) -> Option<ApiConfig> {
        let stored = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;

        match validate_config(&stored.base, &stored.token, &self.policy) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Discarding stored API config: {}", e);
                self.clear_config();
                None
            }
        }
    }

    fn set_config(&self, config: ApiConfig) -> bool {
        match validate_config(config.base(), config.token(), &self.policy) {
            Ok(valid) => {
                debug!(base = %valid.base(), "Storing API config");
                *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(StoredConfig {
                    base: valid.base,
                    token: valid.token,
                });
                true
            }
            Err(e) => {
                warn!("Rejected API config: {}", e);
                false
            }
        }
    }

    fn clear_config(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
