//! Smart resolver against live suggest transports

use anyhow::Result;
use finterm_lib::resolver::{MatchKind, ProgressState};
use finterm_tests::TestApi;
use mockito::Matcher;
use tokio::sync::oneshot;

#[tokio::test]
async fn remote_entities_merge_with_local_pools() -> Result<()> {
    let mut api = TestApi::start().await;
    api.mount("suggest_apple", 2).await?;

    let result = api.resolver()?.resolve_search("apple").await;

    assert!(!result.local_only);
    let best = result.best.as_ref().expect("best match");
    assert_eq!(best.kind, MatchKind::Entity);
    assert_eq!(best.symbol.as_deref(), Some("AAPL"));
    assert!(best.href.starts_with("/explorer/entity?"));
    assert!(best.href.contains("cik=0000320193"));
    assert!(result.matches.iter().any(|m| m.label == "Applied Materials, Inc."));
    Ok(())
}

#[tokio::test]
async fn failed_proxy_falls_back_to_api() -> Result<()> {
    let mut proxy = TestApi::start().await;
    let mut api = TestApi::start().await;

    proxy
        .server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .with_status(502)
        .expect(1)
        .create_async()
        .await;
    api.mount("suggest_apple", 1).await?;

    let result = api.resolver_with_proxy(&proxy.url())?.resolve_search("apple").await;

    assert!(!result.local_only);
    assert_eq!(result.best.and_then(|m| m.symbol), Some("AAPL".to_string()));
    Ok(())
}

#[tokio::test]
async fn unavailable_suggest_degrades_to_local() -> Result<()> {
    let mut api = TestApi::start().await;
    api.server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let result = api.resolver()?.resolve_search("japan").await;

    assert!(result.local_only);
    assert_eq!(result.matches[0].label, "Japan");
    assert_eq!(result.matches[0].kind, MatchKind::Country);
    Ok(())
}

#[tokio::test]
async fn progressive_resolution_delivers_twice() -> Result<()> {
    let mut api = TestApi::start().await;
    api.mount("suggest_apple", 2).await?;
    let resolver = api.resolver()?;

    let mut local = None;
    let (full_tx, full_rx) = oneshot::channel();
    let handle = resolver.resolve_search_progressive(
        "apple",
        |result| local = Some(result),
        move |result| {
            let _ = full_tx.send(result);
        },
    );

    assert!(local.expect("local delivery").local_only);

    let full = full_rx.await?;
    assert!(!full.local_only);
    assert_eq!(handle.state(), ProgressState::FullDelivered);
    handle.finished().await;
    Ok(())
}

#[tokio::test]
async fn short_queries_never_reach_the_network() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api
        .server
        .mock("GET", "/api/v1/search/suggest")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = api.resolver()?.resolve_search(" a ").await;

    assert!(result.matches.is_empty());
    mock.assert_async().await;
    Ok(())
}
