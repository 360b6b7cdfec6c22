//! Configuration loading and global state management
//!
//! Coordinates loading configuration from various sources and provides
//! global application configuration access.

use crate::primitives::{ColorIntent, ConfigError};
use clap::Parser;
use std::sync::OnceLock;
use tracing::debug;

use super::{
    cli::{Cli, CliConfig},
    config::AppConfig,
    env::EnvironmentConfig,
};

// Global configuration available throughout the application
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Env files read before parsing, first match wins per variable
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Load `.env.local` then `.env` into the process environment
///
/// Missing files are skipped; unreadable or malformed files are errors.
pub fn load_env_files() -> Result<(), ConfigError> {
    for env_file in ENV_FILES {
        match dotenvy::from_filename(env_file) {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::EnvFileError {
                    file: env_file.to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(())
}

impl CliConfig {
    /// Load config: defaults -> .env -> env vars -> CLI
    pub fn load() -> Result<Self, ConfigError> {
        load_env_files()?;
        let env_config = EnvironmentConfig::load()?;
        Self::from_cli(Cli::parse(), &env_config)
    }

    /// Resolve a parsed CLI against the standard environment variables
    ///
    /// NO_COLOR and friends only apply while the color intent is still
    /// `auto`; an explicit `--color`/`FINTERM_COLOR` wins.
    pub fn from_cli(cli: Cli, env_config: &EnvironmentConfig) -> Result<Self, ConfigError> {
        let mut app_config = cli.config;
        if app_config.color == ColorIntent::Auto {
            app_config.color = env_config.apply_color_config(app_config.color);
        }

        app_config.validate()?;

        Ok(Self {
            app_config,
            command: cli.command,
        })
    }
}

impl AppConfig {
    /// Initialize global configuration (call once in main)
    pub fn init_global(config: AppConfig) -> Result<(), ConfigError> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)
    }

    /// Get global configuration reference, if initialized
    pub fn global() -> Option<&'static AppConfig> {
        GLOBAL_CONFIG.get()
    }
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
