//! # finterm Library
//!
//! Client core for the Finuties financial data API.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types and errors
//! - [`logger`] - Structured logging
//! - [`networking`] - Resilient fetch client with retry, dedupe, and metering
//! - [`cards`] - Dashboard card contract and cache policy
//! - [`resolver`] - Smart search resolver over local pools and remote suggestions
//! - [`application`] - CLI interface and configuration management
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! // Parse configuration and run the requested command
//! finterm_lib::main().await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cards;
pub mod logger;
pub mod networking;
pub mod primitives;
pub mod resolver;

// Re-export commonly used types for convenience
pub use application::{AppConfig, Cli, Commands, execute_command};
pub use cards::{CachePolicy, CacheScope, Card, EndpointCard, load_card};
pub use logger::Logger;
pub use networking::{FetchClient, FetchResult, NetworkingConfig, NetworkingError, RequestInit, ResultCache};
pub use primitives::{ColorIntent, ConfigError, LogFormat, LogLevel, LogOutput, LoggerError};
pub use resolver::{ResolveResult, ResolvedMatch, SmartResolver};

// Private imports for the main function
use anyhow::Result;
use application::CliConfig;

pub async fn main() -> Result<()> {
    // Load CLI configuration
    let config = CliConfig::load()?;

    Logger::init(config.app_config.to_logger_config())?;
    AppConfig::init_global(config.app_config.clone())?;

    // Execute the command
    execute_command(config).await
}
