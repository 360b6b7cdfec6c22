use super::*;
use mockito::{Matcher, Server};

fn config_for(base: &str) -> AppConfig {
    AppConfig {
        api_base: Some(base.to_string()),
        api_token: Some("fin_sk_test".to_string()),
        allow_any_host: true,
        retries: 0,
        ..AppConfig::default()
    }
}

async fn run(command: Commands, config: &AppConfig) -> (Result<()>, String) {
    let mut out = Vec::new();
    let result = execute_command_with_output(command, config, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_version_prints_package_version() {
    let (result, out) = run(Commands::Version, &AppConfig::default()).await;
    assert!(result.is_ok());
    assert!(out.contains(env!("CARGO_PKG_VERSION")));
}

// ===== FETCH =====

#[tokio::test]
async fn test_fetch_prints_envelope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/countries")
        .match_header("authorization", "Bearer fin_sk_test")
        .with_status(200)
        .with_header("x-token-cost", "2")
        .with_body(r#"[{"iso3":"FRA"}]"#)
        .expect(1)
        .create_async()
        .await;

    let command = Commands::Fetch {
        path: "/api/v1/countries".to_string(),
        method: "get".to_string(),
        retries: None,
        body: None,
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    assert!(result.is_ok());
    let envelope: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["token_cost"], 2);
    assert_eq!(envelope["data"][0]["iso3"], "FRA");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_posts_json_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/watchlists")
        .match_body(Matcher::Json(json!({"name": "tech"})))
        .with_status(201)
        .with_body(r#"{"id":7}"#)
        .create_async()
        .await;

    let command = Commands::Fetch {
        path: "/api/v1/watchlists".to_string(),
        method: "POST".to_string(),
        retries: None,
        body: Some(r#"{"name":"tech"}"#.to_string()),
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    assert!(result.is_ok());
    assert!(out.contains("\"id\": 7"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_failure_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/company/zzz")
        .with_status(404)
        .with_body(r#"{"detail":"Company not found"}"#)
        .create_async()
        .await;

    let command = Commands::Fetch {
        path: "/api/v1/company/zzz".to_string(),
        method: "GET".to_string(),
        retries: None,
        body: None,
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("404"));
    assert!(err.contains("Company not found"));
    assert!(out.contains("\"ok\": false"));
}

#[tokio::test]
async fn test_fetch_rejects_invalid_body() {
    let command = Commands::Fetch {
        path: "/api/v1/watchlists".to_string(),
        method: "POST".to_string(),
        retries: None,
        body: Some("{not json".to_string()),
    };
    let (result, out) = run(command, &config_for("http://127.0.0.1:9")).await;

    assert!(result.unwrap_err().to_string().contains("not valid JSON"));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_fetch_without_configuration() {
    let command = Commands::Fetch {
        path: "/api/v1/countries".to_string(),
        method: "GET".to_string(),
        retries: None,
        body: None,
    };
    let (result, out) = run(command, &AppConfig::default()).await;

    assert!(result.is_err());
    assert!(out.contains("API not configured"));
}

// ===== RESOLVE =====

#[tokio::test]
async fn test_resolve_local_needs_no_network() {
    let command = Commands::Resolve {
        query: "franc".to_string(),
        progressive: false,
        local: true,
    };
    let (result, out) = run(command, &AppConfig::default()).await;

    assert!(result.is_ok());
    assert!(out.contains("France"));
    assert!(out.contains("/explorer/country/fra"));
}

#[tokio::test]
async fn test_resolve_merges_remote_suggestions() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::UrlEncoded("q".into(), "apple".into()))
        .with_status(200)
        .with_body(r#"{"suggestions":[{"name":"Apple Inc.","types":["company"],"symbol":"AAPL"}]}"#)
        .create_async()
        .await;

    let command = Commands::Resolve {
        query: "apple".to_string(),
        progressive: false,
        local: false,
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    assert!(result.is_ok());
    assert!(out.contains("Apple Inc."));
    assert!(out.contains("best: Apple Inc. [entity]"));
    assert!(!out.contains("local matches only"));
}

#[tokio::test]
async fn test_resolve_progressive_prints_both_phases() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let command = Commands::Resolve {
        query: "germany".to_string(),
        progressive: true,
        local: false,
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    assert!(result.is_ok());
    let local_at = out.find("-- local --").unwrap();
    let full_at = out.find("-- full --").unwrap();
    assert!(local_at < full_at);
    assert_eq!(out.matches("Germany").count(), 4);
}

// ===== CARD =====

#[tokio::test]
async fn test_card_loads_through_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/gdp")
        .with_status(200)
        .with_body(r#"{"items":[1,2,3]}"#)
        .expect(1)
        .create_async()
        .await;

    let command = Commands::Card {
        id: "gdp-chart".to_string(),
        path: "/api/v1/gdp".to_string(),
        ttl: 60,
        session: true,
    };
    let (result, out) = run(command, &config_for(&server.url())).await;

    assert!(result.is_ok());
    assert!(out.contains("\"ok\": true"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_card_failure_names_cache_key() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/gdp")
        .with_status(500)
        .create_async()
        .await;

    let command = Commands::Card {
        id: "gdp-chart".to_string(),
        path: "/api/v1/gdp".to_string(),
        ttl: 60,
        session: false,
    };
    let (result, _) = run(command, &config_for(&server.url())).await;

    assert!(result.unwrap_err().to_string().contains("global:gdp-chart"));
}

// ===== CONFIG =====

#[tokio::test]
async fn test_config_check_hides_token() {
    let command = Commands::Config {
        action: ConfigAction::Check,
    };
    let (result, out) = run(command, &config_for("http://127.0.0.1:8080/ignored/path")).await;

    assert!(result.is_ok());
    let status: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["configured"], true);
    assert_eq!(status["api_base"], "http://127.0.0.1:8080");
    assert_eq!(status["retries"], 0);
    assert!(!out.contains("fin_sk_test"));
}

#[tokio::test]
async fn test_config_check_unconfigured() {
    let command = Commands::Config {
        action: ConfigAction::Check,
    };
    let (result, out) = run(command, &AppConfig::default()).await;

    assert!(result.is_ok());
    let status: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["configured"], false);
    assert!(status["api_base"].is_null());
}
