use clap::{Parser, Subcommand};

use super::config::AppConfig;

/// finterm CLI - financial data terminal client
#[derive(Debug, Clone, Parser)]
#[command(name = "finterm")]
#[command(about = "Resilient API client and search resolver for the Finuties data API")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// finterm commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Option<Commands>,
}

/// Available finterm commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Fetch an API path and print the result envelope
    Fetch {
        /// API path, starting with '/'
        #[arg(help = "API path, e.g. /api/v1/countries")]
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET", help = "HTTP method to use")]
        method: String,

        /// Retry count override (0-4)
        #[arg(short, long, help = "Retries for transient GET failures")]
        retries: Option<u32>,

        /// JSON request body
        #[arg(short, long, help = "JSON body sent with the request")]
        body: Option<String>,
    },

    /// Resolve a search query against local pools and remote suggestions
    Resolve {
        /// Search query
        #[arg(help = "Query text, e.g. 'apple' or 'gdp'")]
        query: String,

        /// Print the local result before the merged one
        #[arg(short, long, help = "Deliver local matches first, then the merged result")]
        progressive: bool,

        /// Skip the network entirely
        #[arg(short, long, conflicts_with = "progressive", help = "Only match local pools")]
        local: bool,
    },

    /// Load a dashboard card through the result cache
    Card {
        /// Card identifier
        #[arg(help = "Card identifier used as the cache key")]
        id: String,

        /// API path backing the card
        #[arg(help = "API path the card loads")]
        path: String,

        /// Cache lifetime in seconds (0 disables caching)
        #[arg(long, default_value = "300", help = "Cache TTL in seconds")]
        ttl: u64,

        /// Scope the cached result to the current session
        #[arg(long, help = "Cache in session scope instead of global scope")]
        session: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Validate the API configuration and print its status
    Check,
}

impl Commands {
    /// Check if command needs a configured API base and token
    pub fn requires_api(&self) -> bool {
        match self {
            Commands::Version => false,
            Commands::Config { .. } => false,
            Commands::Resolve { local, .. } => !local,
            Commands::Fetch { .. } => true,
            Commands::Card { .. } => true,
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
