//! Application configuration management
//!
//! Handles config loading, validation, and environment variable processing
//! following the precedence: defaults -> .env -> env vars -> CLI args.

use crate::networking::retry::MAX_RETRY_COUNT;
use crate::networking::{HostPolicy, MemoryConfigStore, NetworkingConfig, validate_config};
use crate::primitives::*;
use clap::Parser;
use serde::Deserialize;
use std::io::IsTerminal;
use std::time::Duration;

/// Default configuration values
pub mod defaults {
    pub const LOG_LEVEL: &str = "0"; // Error-only logging by default
    pub const LOG_FORMAT: &str = "text";
    pub const LOG_OUTPUT: &str = "stderr";
    pub const NET_TIMEOUT: &str = "30";
    pub const RETRIES: &str = "2";
    pub const COLOR: &str = "auto";
}

/// Default value functions for configuration fields
mod default_fns {
    use crate::primitives::{ColorIntent, LogFormat, LogOutput};

    pub fn log_level() -> u8 {
        0
    }

    pub fn log_format() -> LogFormat {
        LogFormat::Text
    }

    pub fn log_output() -> LogOutput {
        LogOutput::Stderr
    }

    pub fn net_timeout() -> u64 {
        30
    }

    pub fn retries() -> u32 {
        2
    }

    pub fn color() -> ColorIntent {
        ColorIntent::Auto
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Parser, Deserialize)]
pub struct AppConfig {
    /// API origin, e.g. https://data.finuties.com
    #[arg(long, env = "FINTERM_API_BASE")]
    #[serde(default)]
    pub api_base: Option<String>,

    /// API bearer token
    #[arg(long, env = "FINTERM_API_TOKEN", hide_env_values = true)]
    #[serde(default)]
    pub api_token: Option<String>,

    /// Accept API hosts outside the trusted domain (development only)
    #[arg(long, env = "FINTERM_ALLOW_ANY_HOST")]
    #[serde(default)]
    pub allow_any_host: bool,

    /// Extra API hosts accepted by exact match
    #[arg(long, env = "FINTERM_ALLOWED_HOSTS", value_delimiter = ',')]
    #[serde(default)]
    pub allowed_hosts: Vec<String>,

    /// Same-origin proxy used by the resolver's suggest race (defaults to the API base)
    #[arg(long, env = "FINTERM_PROXY_ORIGIN")]
    #[serde(default)]
    pub proxy_origin: Option<String>,

    /// Per-attempt request timeout in seconds
    #[arg(short = 'n', long, env = "FINTERM_NET_TIMEOUT", default_value = defaults::NET_TIMEOUT)]
    #[serde(default = "default_fns::net_timeout")]
    pub net_timeout: u64,

    /// Retries for transient GET failures (0-4)
    #[arg(long, env = "FINTERM_RETRIES", default_value = defaults::RETRIES)]
    #[serde(default = "default_fns::retries")]
    pub retries: u32,

    /// Verbosity level (0=error, 1=warn, 2=info, 3=debug, 4=trace)
    #[arg(long, env = "FINTERM_LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: u8,

    /// Log format (text, json, yaml)
    #[arg(long, env = "FINTERM_LOG_FORMAT", default_value = defaults::LOG_FORMAT)]
    #[serde(default = "default_fns::log_format")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, env = "FINTERM_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT)]
    #[serde(default = "default_fns::log_output")]
    pub log_output: LogOutput,

    /// Color output control (auto, always, never)
    #[arg(short, long, env = "FINTERM_COLOR", default_value = defaults::COLOR)]
    #[serde(default = "default_fns::color")]
    pub color: ColorIntent,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            api_token: None,
            allow_any_host: false,
            allowed_hosts: Vec::new(),
            proxy_origin: None,
            net_timeout: default_fns::net_timeout(),
            retries: default_fns::retries(),
            log_level: default_fns::log_level(),
            log_format: default_fns::log_format(),
            log_output: default_fns::log_output(),
            color: default_fns::color(),
        }
    }
}

impl AppConfig {
    /// Create LoggerConfig, resolving the color intent against the log stream
    pub fn to_logger_config(&self) -> LoggerConfig {
        let ansi = match self.color {
            ColorIntent::Always => true,
            ColorIntent::Never => false,
            ColorIntent::Auto => match self.log_output {
                LogOutput::Stderr => std::io::stderr().is_terminal(),
                LogOutput::Stdout => std::io::stdout().is_terminal(),
            },
        };

        LoggerConfig {
            level: LogLevel::from_verbosity(self.log_level),
            format: self.log_format,
            output: self.log_output,
            ansi,
        }
    }

    /// Host allow-list derived from the override flag and extra hosts
    pub fn host_policy(&self) -> HostPolicy {
        let policy = if self.allow_any_host {
            HostPolicy::permissive()
        } else {
            HostPolicy::default()
        };
        self.allowed_hosts
            .iter()
            .map(|host| host.trim())
            .filter(|host| !host.is_empty())
            .fold(policy, |policy, host| policy.with_host(host))
    }

    /// Fetch client tuning
    pub fn networking_config(&self) -> NetworkingConfig {
        NetworkingConfig {
            timeout: Duration::from_secs(self.net_timeout),
            ..NetworkingConfig::default()
        }
    }

    /// Config store seeded with the API base and token when both are set
    pub fn config_store(&self) -> Result<MemoryConfigStore, ConfigError> {
        match (&self.api_base, &self.api_token) {
            (Some(base), Some(token)) => MemoryConfigStore::with_config(self.host_policy(), base, token),
            _ => Ok(MemoryConfigStore::new(self.host_policy())),
        }
    }

    /// Origin for same-origin suggest requests, reduced to scheme, host and port
    pub fn proxy_origin(&self) -> Option<String> {
        let raw = self.proxy_origin.as_deref().or(self.api_base.as_deref())?;
        let parsed = url::Url::parse(raw.trim()).ok()?;
        matches!(parsed.scheme(), "http" | "https").then(|| parsed.origin().ascii_serialization())
    }

    /// Validate the final configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.net_timeout == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "net timeout must be at least 1 second".to_string(),
            });
        }

        if self.retries > MAX_RETRY_COUNT {
            return Err(ConfigError::ValidationFailed {
                reason: format!("retries must be between 0 and {MAX_RETRY_COUNT}"),
            });
        }

        match (&self.api_base, &self.api_token) {
            (Some(base), Some(token)) => {
                validate_config(base, token, &self.host_policy())?;
            }
            (Some(_), None) => {
                return Err(ConfigError::ValidationFailed {
                    reason: "API base is set but no API token was given".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::ValidationFailed {
                    reason: "API token is set but no API base was given".to_string(),
                });
            }
            (None, None) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
