use super::*;
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Instant;

const TOKEN: &str = "fin_sk_test";

fn fast_config() -> NetworkingConfig {
    NetworkingConfig {
        timeout: Duration::from_secs(5),
        backoff: BackoffConfig::fixed_jitterless(Duration::from_millis(10), Duration::from_millis(40)),
        ..NetworkingConfig::default()
    }
}

fn client_for(base: &str) -> FetchClient {
    let store = MemoryConfigStore::with_config(HostPolicy::permissive(), base, TOKEN).unwrap();
    FetchClient::new(Arc::new(store), fast_config()).unwrap()
}

/// Listener that completes the TCP handshake but never answers
async fn silent_origin() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

#[test]
fn test_networking_config_defaults() {
    let config = NetworkingConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.backoff.initial, Duration::from_millis(250));
    assert!(config.user_agent.starts_with("finterm/"));
}

#[tokio::test]
async fn test_unconfigured_client_makes_no_request() {
    let client = FetchClient::new(Arc::new(MemoryConfigStore::default()), fast_config()).unwrap();

    let result = client.get("/api/v1/fx").await;

    assert!(!result.ok);
    assert_eq!(result.status, 0);
    assert_eq!(result.error.as_deref(), Some(NOT_CONFIGURED_MESSAGE));
}

#[tokio::test]
async fn test_path_must_start_with_slash() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;
    let client = client_for(&server.url());

    let result = client.get("api/v1/fx").await;

    assert_eq!(result.status, 0);
    assert!(result.error.as_deref().unwrap().starts_with("Invalid path"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_success_parses_json_and_metering() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/fx/latest")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("x-token-cost", "2")
        .with_header("x-credits-remaining", "498")
        .with_body(r#"{"pair":"EURUSD","rate":1.08}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client.get("/api/v1/fx/latest").await;

    assert!(result.ok);
    assert_eq!(result.status, 200);
    assert_eq!(result.data, Some(json!({ "pair": "EURUSD", "rate": 1.08 })));
    assert_eq!(result.error, None);
    assert_eq!(result.token_cost, 2);
    assert_eq!(result.credits_remaining, Some(498));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_caller_authorization_is_preserved() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/me")
        .match_header("authorization", "Bearer override")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let init = RequestInit::get().with_header(AUTHORIZATION, HeaderValue::from_static("Bearer override"));
    let result = client.fetch("/api/v1/me", init).await;

    assert!(result.ok);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_gets_are_deduplicated() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/filings")
        .with_status(200)
        .with_body(r#"[{"form":"10-K"}]"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let (a, b) = tokio::join!(client.get("/api/v1/filings"), client.get("/api/v1/filings"));

    assert!(a.ok);
    assert!(Arc::ptr_eq(&a, &b), "deduplicated callers share one result");
    assert!(client.inflight().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_sequential_gets_are_not_deduplicated() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/filings")
        .with_status(200)
        .with_body("[]")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let a = client.get("/api/v1/filings").await;
    let b = client.get("/api/v1/filings").await;

    assert!(!Arc::ptr_eq(&a, &b));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_retries_transient_status_then_succeeds() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/api/v1/crypto")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;
    let recovered = server
        .mock("GET", "/api/v1/crypto")
        .with_status(200)
        .with_body(r#"{"btc":64000}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let start = Instant::now();
    let result = client
        .fetch("/api/v1/crypto", RequestInit::get().with_retry_count(3))
        .await;

    assert!(result.ok, "should succeed after three retries: {:?}", result.error);
    // 10ms + 20ms + 40ms of backoff
    assert!(start.elapsed() >= Duration::from_millis(70));
    unavailable.assert_async().await;
    recovered.assert_async().await;
}

#[tokio::test]
async fn test_retry_count_is_clamped() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/busy")
        .with_status(429)
        .expect(5)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client
        .fetch("/api/v1/busy", RequestInit::get().with_retry_count(50))
        .await;

    assert_eq!(result.status, 429);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_is_never_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/watchlist")
        .match_body(Matcher::Json(json!({ "symbol": "AAPL" })))
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client
        .fetch(
            "/api/v1/watchlist",
            RequestInit::post(json!({ "symbol": "AAPL" })).with_retry_count(4),
        )
        .await;

    assert!(!result.ok);
    assert_eq!(result.status, 503);
    assert_eq!(result.error.as_deref(), Some("Service Unavailable"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_permanent_error_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/company/0000")
        .with_status(404)
        .with_body(r#"{"detail":"Company not found"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client.get("/api/v1/company/0000").await;

    assert_eq!(result.status, 404);
    assert_eq!(result.error.as_deref(), Some("Company not found"));
    assert_eq!(result.data, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_success_body_is_kept_as_text() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/health")
        .with_status(200)
        .with_body("pong")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client.get("/api/v1/health").await;

    assert!(result.ok);
    assert_eq!(result.data, Some(Value::String("pong".to_string())));
}

#[tokio::test]
async fn test_timeout_is_reported_distinctly() {
    let (_listener, base) = silent_origin().await;
    let client = client_for(&base);

    let init = RequestInit::get()
        .with_retry_count(0)
        .with_timeout(Duration::from_millis(50));
    let result = client.fetch("/api/v1/slow", init).await;

    assert!(result.is_timeout());
    assert_eq!(result.error.as_deref(), Some(TIMEOUT_MESSAGE));
}

#[tokio::test]
async fn test_caller_cancellation_ends_request() {
    let (_listener, base) = silent_origin().await;
    let client = client_for(&base);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = client
        .fetch("/api/v1/slow", RequestInit::get().with_cancel(cancel))
        .await;

    assert!(result.is_timeout());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_joined_get_shares_first_callers_cancellation() {
    let (_listener, base) = silent_origin().await;
    let client = client_for(&base);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let (first, joined) = tokio::join!(
        client.fetch("/api/v1/slow", RequestInit::get().with_cancel(cancel)),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            client.get("/api/v1/slow").await
        }
    );

    assert!(first.is_timeout());
    assert!(Arc::ptr_eq(&first, &joined));
}

#[tokio::test]
async fn test_request_once_sends_token_to_configured_origin() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/ping")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let result = client
        .request_once(&format!("{}/api/v1/ping", server.url()), &RequestInit::get())
        .await;

    assert!(result.ok);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_once_withholds_token_from_other_origin() {
    let api_server = Server::new_async().await;
    let mut other = Server::new_async().await;
    let mock = other
        .mock("GET", "/api/v1/ping")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&api_server.url());
    let result = client
        .request_once(&format!("{}/api/v1/ping", other.url()), &RequestInit::get())
        .await;

    assert!(result.ok);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(&base);
    let result = client
        .fetch("/api/v1/fx", RequestInit::get().with_retry_count(0))
        .await;

    assert_eq!(result.status, 0);
    assert!(!result.is_timeout());
    assert!(result.error.as_deref().unwrap().starts_with("Network error"));
}

#[tokio::test]
async fn test_get_json_decodes_items_envelope() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Quote {
        symbol: String,
    }

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/quotes")
        .with_status(200)
        .with_body(r#"{"items":[{"symbol":"AAPL"},{"symbol":"MSFT"}]}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let quotes: Vec<Quote> = client.get("/api/v1/quotes").await.items().unwrap();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[1].symbol, "MSFT");

    let failed = FetchResult::failure(500, "boom");
    assert!(matches!(
        failed.json::<Value>(),
        Err(NetworkingError::RequestFailed { status: 500, .. })
    ));
}
