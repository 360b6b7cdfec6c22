use super::*;
use crate::networking::{HostPolicy, MemoryConfigStore, NetworkingConfig};
use mockito::Server;
use serde_json::json;

fn client_for(server: &Server) -> FetchClient {
    let store = MemoryConfigStore::with_config(HostPolicy::permissive(), &server.url(), "fin_sk_test").unwrap();
    FetchClient::new(Arc::new(store), NetworkingConfig::default()).unwrap()
}

#[test]
fn test_cache_key_includes_scope() {
    assert_eq!(cache_key(CacheScope::Global, "fx-rates"), "global:fx-rates");
    assert_eq!(cache_key(CacheScope::Session, "watchlist"), "session:watchlist");
}

#[test]
fn test_cache_policy_serializes_ttl_in_seconds() {
    let policy = CachePolicy::session(Duration::from_secs(90));
    let value = serde_json::to_value(policy).unwrap();
    assert_eq!(value, json!({ "ttl": 90, "scope": "session", "persist": false }));

    let parsed: CachePolicy = serde_json::from_value(json!({ "ttl": 5, "scope": "global", "persist": true })).unwrap();
    assert_eq!(parsed.ttl, Duration::from_secs(5));
    assert_eq!(parsed.scope, CacheScope::Global);
    assert!(parsed.persist);
}

#[tokio::test]
async fn test_load_card_serves_second_call_from_cache() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/fx/latest")
        .with_status(200)
        .with_body(r#"{"EURUSD":1.08}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let cache = ResultCache::new();
    let card = EndpointCard::new("fx-rates", "/api/v1/fx/latest");

    let first = load_card(&card, &client, &cache).await;
    let second = load_card(&card, &client, &cache).await;

    assert!(first.ok);
    assert!(Arc::ptr_eq(&first, &second));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_load_card_does_not_cache_failures() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/filings")
        .with_status(404)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let cache = ResultCache::new();
    let card = EndpointCard::new("filings", "/api/v1/filings");

    assert!(!load_card(&card, &client, &cache).await.ok);
    assert!(!load_card(&card, &client, &cache).await.ok);
    assert!(cache.is_empty().await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_cache_policy_always_fetches() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/crypto")
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let cache = ResultCache::new();
    let card = EndpointCard::new("crypto", "/api/v1/crypto").with_policy(CachePolicy::no_cache());

    load_card(&card, &client, &cache).await;
    load_card(&card, &client, &cache).await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_end_session_keeps_global_results() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", mockito::Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    let cache = ResultCache::new();
    let global = EndpointCard::new("fx", "/api/v1/fx");
    let session = EndpointCard::new("watchlist", "/api/v1/watchlist")
        .with_policy(CachePolicy::session(Duration::from_secs(60)));

    load_card(&global, &client, &cache).await;
    load_card(&session, &client, &cache).await;
    assert_eq!(cache.len().await, 2);

    assert_eq!(end_session(&cache).await, 1);
    assert!(cache.get("global:fx").await.is_some());
    assert!(cache.get("session:watchlist").await.is_none());
}
