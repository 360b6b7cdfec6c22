//! Command execution handlers
//!
//! Each handler builds what it needs from the [`AppConfig`] and writes its
//! report to the provided output, so tests can capture it.

use crate::application::config::AppConfig;
use crate::application::{CliConfig, Commands, ConfigAction};
use crate::cards::{CachePolicy, EndpointCard, cache_key, load_card};
use crate::networking::{ConfigStore, FetchClient, RequestInit, ResultCache};
use crate::resolver::{ApiSuggestSource, Catalog, ProxySuggestSource, ResolveResult, ResolvedMatch, SmartResolver};
use anyhow::{Context, Result, bail};
use reqwest::Method;
use serde_json::{Value, json};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Execute CLI commands against stdout
pub async fn execute_command(config: CliConfig) -> Result<()> {
    let mut stdout = std::io::stdout();

    let command = match config.command {
        Some(cmd) => cmd,
        None => {
            writeln!(stdout, "finterm - financial data terminal client")?;
            writeln!(stdout, "Run 'finterm --help' for usage information")?;
            return Ok(());
        }
    };

    execute_command_with_output(command, &config.app_config, &mut stdout).await
}

/// Execute a specific command, writing its report to `out` (for testing)
pub async fn execute_command_with_output(
    command: Commands,
    config: &AppConfig,
    out: &mut (dyn Write + Send),
) -> Result<()> {
    if command.requires_api() && config.config_store()?.get_config().is_none() {
        warn!("API is not configured; set FINTERM_API_BASE and FINTERM_API_TOKEN");
    }

    match command {
        Commands::Version => handle_version(out),
        Commands::Fetch {
            path,
            method,
            retries,
            body,
        } => handle_fetch(config, out, &path, &method, retries, body.as_deref()).await,
        Commands::Resolve {
            query,
            progressive,
            local,
        } => handle_resolve(config, out, &query, progressive, local).await,
        Commands::Card { id, path, ttl, session } => handle_card(config, out, id, path, ttl, session).await,
        Commands::Config {
            action: ConfigAction::Check,
        } => handle_config_check(config, out),
    }
}

fn build_client(config: &AppConfig) -> Result<FetchClient> {
    let store = config.config_store()?;
    FetchClient::new(Arc::new(store), config.networking_config()).context("Failed to build HTTP client")
}

fn handle_version(out: &mut (dyn Write + Send)) -> Result<()> {
    writeln!(out, "finterm {}", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}

async fn handle_fetch(
    config: &AppConfig,
    out: &mut (dyn Write + Send),
    path: &str,
    method: &str,
    retries: Option<u32>,
    body: Option<&str>,
) -> Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", method))?;
    let body = body
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("Request body is not valid JSON")?;

    let init = RequestInit {
        method,
        body,
        retry_count: Some(retries.unwrap_or(config.retries)),
        ..RequestInit::default()
    };

    let client = build_client(config)?;
    let result = client.fetch(path, init).await;

    writeln!(out, "{}", serde_json::to_string_pretty(result.as_ref())?)?;

    if !result.ok {
        bail!(
            "Request failed ({}): {}",
            result.status,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn handle_resolve(
    config: &AppConfig,
    out: &mut (dyn Write + Send),
    query: &str,
    progressive: bool,
    local: bool,
) -> Result<()> {
    if local {
        let matches = Catalog::builtin().resolve_local(query);
        if matches.is_empty() {
            writeln!(out, "No local matches for '{}'", query)?;
        }
        for m in &matches {
            render_match(out, m)?;
        }
        return Ok(());
    }

    let client = build_client(config)?;
    let resolver = SmartResolver::new(
        Arc::new(ProxySuggestSource::new(
            client.clone(),
            config.proxy_origin().unwrap_or_default(),
        )),
        Arc::new(ApiSuggestSource::new(client)),
        Arc::new(Catalog::builtin()),
    );

    if !progressive {
        let result = resolver.resolve_search(query).await;
        return render_result(out, &result);
    }

    let mut local_result = None;
    let (full_tx, full_rx) = oneshot::channel();
    let handle = resolver.resolve_search_progressive(
        query,
        |result| local_result = Some(result),
        move |result| {
            let _ = full_tx.send(result);
        },
    );

    if let Some(result) = &local_result {
        writeln!(out, "-- local --")?;
        render_result(out, result)?;
    }

    let full = full_rx.await.context("Resolution ended without a full result")?;
    handle.finished().await;

    writeln!(out, "-- full --")?;
    render_result(out, &full)
}

fn render_match(out: &mut (dyn Write + Send), m: &ResolvedMatch) -> Result<()> {
    writeln!(
        out,
        "{:>5.1}  {:<10}  {}  ({})  {}",
        m.score, m.kind, m.label, m.description, m.href
    )?;
    Ok(())
}

fn render_result(out: &mut (dyn Write + Send), result: &ResolveResult) -> Result<()> {
    if result.matches.is_empty() {
        writeln!(out, "No matches for '{}'", result.query)?;
        return Ok(());
    }

    for m in &result.matches {
        render_match(out, m)?;
    }

    if let Some(best) = &result.best {
        writeln!(out, "best: {} [{}]", best.label, best.kind)?;
    }
    if result.has_conflict {
        writeln!(out, "note: ambiguous query, more than one strong candidate")?;
    }
    if result.local_only {
        writeln!(out, "note: local matches only")?;
    }
    writeln!(out, "resolved in {}ms", result.elapsed_ms)?;
    Ok(())
}

async fn handle_card(
    config: &AppConfig,
    out: &mut (dyn Write + Send),
    id: String,
    path: String,
    ttl: u64,
    session: bool,
) -> Result<()> {
    let ttl = Duration::from_secs(ttl);
    let policy = if session {
        CachePolicy::session(ttl)
    } else {
        CachePolicy::global(ttl)
    };
    let key = cache_key(policy.scope, &id);
    let card = EndpointCard::new(id, path).with_policy(policy);

    let client = build_client(config)?;
    let cache = ResultCache::new();
    let result = load_card(&card, &client, &cache).await;

    if cache.get(&key).await.is_some() {
        info!("Cached card result as {} for {}s", key, ttl.as_secs());
    }

    writeln!(out, "{}", serde_json::to_string_pretty(result.as_ref())?)?;

    if !result.ok {
        bail!(
            "Card {} failed to load: {}",
            key,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn handle_config_check(config: &AppConfig, out: &mut (dyn Write + Send)) -> Result<()> {
    let api = config.config_store()?.get_config();

    let status = json!({
        "configured": api.is_some(),
        "api_base": api.as_ref().map(|api| api.base()),
        "proxy_origin": config.proxy_origin(),
        "allow_any_host": config.allow_any_host,
        "allowed_hosts": config.allowed_hosts,
        "retries": config.retries,
        "timeout_secs": config.net_timeout,
    });

    writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
