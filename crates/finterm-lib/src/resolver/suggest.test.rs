use super::*;
use crate::networking::{HostPolicy, MemoryConfigStore, NetworkingConfig, NetworkingError};
use mockito::{Matcher, Server};
use std::sync::Arc;

fn apple() -> SuggestEntity {
    SuggestEntity {
        name: "Apple Inc.".to_string(),
        types: vec!["company".to_string()],
        symbol: Some("AAPL".to_string()),
        cik: Some("0000320193".to_string()),
        exchange: Some("NASDAQ".to_string()),
    }
}

fn microsoft() -> SuggestEntity {
    SuggestEntity {
        name: "Microsoft Corp".to_string(),
        types: vec!["company".to_string()],
        symbol: Some("MSFT".to_string()),
        cik: None,
        exchange: None,
    }
}

fn client_for(base: &str) -> FetchClient {
    let store = MemoryConfigStore::with_config(HostPolicy::permissive(), base, "fin_sk_test").unwrap();
    FetchClient::new(Arc::new(store), NetworkingConfig::default()).unwrap()
}

#[test]
fn test_suggest_path_encodes_query() {
    assert_eq!(suggest_path("apple", 8), "/api/v1/search/suggest?q=apple&limit=8");
    assert_eq!(
        suggest_path("s&p 500", 8),
        "/api/v1/search/suggest?q=s%26p%20500&limit=8"
    );
}

#[test]
fn test_suggest_response_tolerates_missing_fields() {
    let response: SuggestResponse =
        serde_json::from_str(r#"{"suggestions":[{"name":"Apple Inc."}]}"#).unwrap();
    assert_eq!(response.suggestions[0].name, "Apple Inc.");
    assert!(response.suggestions[0].types.is_empty());
    assert_eq!(response.suggestions[0].symbol, None);

    let empty: SuggestResponse = serde_json::from_str("{}").unwrap();
    assert!(empty.suggestions.is_empty());
}

// ============================================================================
// Race Tests
// ============================================================================

#[tokio::test]
async fn test_race_returns_first_non_empty() {
    let proxy = MockSuggestSource::with_entities("proxy", vec![apple()]).with_delay(Duration::from_millis(200));
    let api = MockSuggestSource::with_entities("api", vec![microsoft()]);

    let entities = fetch_suggest(&proxy, &api, "corp", &CancellationToken::new()).await.unwrap();
    assert_eq!(entities, vec![microsoft()]);
}

#[tokio::test]
async fn test_race_waits_past_empty_winner() {
    let proxy = MockSuggestSource::empty("proxy");
    let api = MockSuggestSource::with_entities("api", vec![apple()]).with_delay(Duration::from_millis(30));

    let entities = fetch_suggest(&proxy, &api, "apple", &CancellationToken::new()).await.unwrap();
    assert_eq!(entities, vec![apple()]);
}

#[tokio::test]
async fn test_race_waits_past_failed_winner() {
    let proxy = MockSuggestSource::with_entities("proxy", vec![apple()]).with_delay(Duration::from_millis(30));
    let api = MockSuggestSource::failing("api", "unavailable");

    let entities = fetch_suggest(&proxy, &api, "apple", &CancellationToken::new()).await.unwrap();
    assert_eq!(entities, vec![apple()]);
}

#[tokio::test]
async fn test_race_prefers_same_origin_when_both_empty() {
    let proxy = MockSuggestSource::empty("proxy").with_delay(Duration::from_millis(30));
    let api = MockSuggestSource::failing("api", "unavailable");

    let entities = fetch_suggest(&proxy, &api, "zzz", &CancellationToken::new()).await.unwrap();
    assert!(entities.is_empty());
}

#[tokio::test]
async fn test_race_falls_back_to_cross_origin() {
    let proxy = MockSuggestSource::failing("proxy", "not found");
    let api = MockSuggestSource::empty("api").with_delay(Duration::from_millis(30));

    let entities = fetch_suggest(&proxy, &api, "zzz", &CancellationToken::new()).await.unwrap();
    assert!(entities.is_empty());
}

#[tokio::test]
async fn test_race_fails_when_both_fail() {
    let proxy = MockSuggestSource::failing("proxy", "down");
    let api = MockSuggestSource::failing("api", "down");

    let result = fetch_suggest(&proxy, &api, "apple", &CancellationToken::new()).await;
    assert!(matches!(result, Err(ResolverError::Remote { .. })));
}

#[tokio::test]
async fn test_race_skips_work_when_already_cancelled() {
    let proxy = MockSuggestSource::with_entities("proxy", vec![apple()]);
    let api = MockSuggestSource::with_entities("api", vec![apple()]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = fetch_suggest(&proxy, &api, "apple", &cancel).await;

    assert!(matches!(result, Err(ResolverError::Cancelled)));
    assert_eq!(proxy.calls() + api.calls(), 0);
}

#[tokio::test]
async fn test_race_honors_cancellation_in_flight() {
    let proxy = MockSuggestSource::with_entities("proxy", vec![apple()]).with_delay(Duration::from_secs(30));
    let api = MockSuggestSource::with_entities("api", vec![apple()]).with_delay(Duration::from_secs(30));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = fetch_suggest(&proxy, &api, "apple", &cancel).await;
    assert!(matches!(result, Err(ResolverError::Cancelled)));
}

// ============================================================================
// Transport Tests
// ============================================================================

#[tokio::test]
async fn test_api_source_requests_suggest_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "s&p 500".into()),
            Matcher::UrlEncoded("limit".into(), "8".into()),
        ]))
        .match_header("authorization", "Bearer fin_sk_test")
        .with_status(200)
        .with_body(r#"{"suggestions":[{"name":"S&P 500 Index","types":["index"]}]}"#)
        .expect(1)
        .create_async()
        .await;

    let source = ApiSuggestSource::new(client_for(&server.url()));
    let entities = source
        .suggest("s&p 500", SUGGEST_LIMIT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].types, vec!["index".to_string()]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_api_source_does_not_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let source = ApiSuggestSource::new(client_for(&server.url()));
    let result = source.suggest("apple", SUGGEST_LIMIT, &CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(ResolverError::Remote {
            source: NetworkingError::RequestFailed { status: 503, .. }
        })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_proxy_source_uses_its_origin() {
    let mut proxy_server = Server::new_async().await;
    let api_server = Server::new_async().await;

    let mock = proxy_server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::UrlEncoded("q".into(), "apple".into()))
        .with_status(200)
        .with_body(r#"{"suggestions":[{"name":"Apple Inc.","symbol":"AAPL"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&api_server.url());
    let source = ProxySuggestSource::new(client, format!("{}/", proxy_server.url()));
    assert!(!source.origin().ends_with('/'));

    let entities = source
        .suggest("apple", SUGGEST_LIMIT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entities[0].symbol.as_deref(), Some("AAPL"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_proxy_source_on_untrusted_origin_gets_no_credential() {
    let mut proxy_server = Server::new_async().await;
    let mock = proxy_server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"suggestions":[{"name":"Apple Inc.","symbol":"AAPL"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let policy = HostPolicy::default();
    assert!(!policy.allows("127.0.0.1"));
    let store = MemoryConfigStore::with_config(policy, "https://data.finuties.com", "fin_sk_secret").unwrap();
    let client = FetchClient::new(Arc::new(store), NetworkingConfig::default()).unwrap();
    let source = ProxySuggestSource::new(client, proxy_server.url());

    let entities = source
        .suggest("apple", SUGGEST_LIMIT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entities[0].name, "Apple Inc.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_mock_source_honors_limit() {
    let source = MockSuggestSource::with_entities("mock", vec![apple(), microsoft()]);
    let entities = source.suggest("x", 1, &CancellationToken::new()).await.unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(source.calls(), 1);
}
