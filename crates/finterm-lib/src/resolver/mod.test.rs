use super::*;
use crate::resolver::suggest::MockSuggestSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

fn entity(name: &str, symbol: &str) -> SuggestEntity {
    SuggestEntity {
        name: name.to_string(),
        types: vec!["company".to_string()],
        symbol: Some(symbol.to_string()),
        cik: None,
        exchange: None,
    }
}

fn resolver(
    proxy: MockSuggestSource,
    api: MockSuggestSource,
) -> SmartResolver<MockSuggestSource, MockSuggestSource> {
    SmartResolver::new(Arc::new(proxy), Arc::new(api), Arc::new(Catalog::builtin()))
}

// ============================================================================
// Blocking Resolution
// ============================================================================

#[tokio::test]
async fn test_short_query_short_circuits() {
    let resolver = resolver(
        MockSuggestSource::with_entities("proxy", vec![entity("Alcoa", "AA")]),
        MockSuggestSource::empty("api"),
    );

    let result = resolver.resolve_search("a").await;

    assert!(result.matches.is_empty());
    assert!(result.best.is_none());
    assert!(!result.has_conflict);
    assert_eq!(result.elapsed_ms, 0);
    assert_eq!(resolver.proxy.calls() + resolver.api.calls(), 0);

    let padded = resolver.resolve_search("  b  ").await;
    assert!(padded.matches.is_empty());
}

#[tokio::test]
async fn test_resolve_search_merges_entities_and_local() {
    let resolver = resolver(
        MockSuggestSource::with_entities("proxy", vec![entity("France Telecom", "FTE")]),
        MockSuggestSource::empty("api"),
    );

    let result = resolver.resolve_search("france").await;

    assert!(!result.local_only);
    assert_eq!(result.query, "france");
    let labels: Vec<&str> = result.matches.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["France", "France Telecom"]);
    assert_eq!(result.best.as_ref().map(|m| m.kind), Some(MatchKind::Country));
    assert_eq!(result.matches[1].kind, MatchKind::Entity);
}

#[tokio::test]
async fn test_remote_failure_degrades_to_local() {
    let resolver = resolver(
        MockSuggestSource::failing("proxy", "down"),
        MockSuggestSource::failing("api", "down"),
    );

    let result = resolver.resolve_search("germ").await;

    assert!(result.local_only);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].label, "Germany");
}

#[tokio::test]
async fn test_empty_remote_is_local_only() {
    let resolver = resolver(MockSuggestSource::empty("proxy"), MockSuggestSource::empty("api"));

    let result = resolver.resolve_search("cpi").await;

    assert!(result.local_only);
    assert_eq!(result.best.map(|m| m.label), Some("Consumer Price Index".to_string()));
}

#[tokio::test]
async fn test_resolve_local_matches_catalog() {
    let resolver = resolver(MockSuggestSource::empty("proxy"), MockSuggestSource::empty("api"));
    assert_eq!(resolver.resolve_local("franc"), resolver.catalog().resolve_local("franc"));
}

// ============================================================================
// Progressive Resolution
// ============================================================================

#[tokio::test]
async fn test_progressive_delivers_local_then_full() {
    let resolver = resolver(
        MockSuggestSource::with_entities("proxy", vec![entity("Apple Inc.", "AAPL")])
            .with_delay(Duration::from_millis(20)),
        MockSuggestSource::empty("api").with_delay(Duration::from_millis(20)),
    );

    let mut local = None;
    let (full_tx, full_rx) = oneshot::channel();

    let handle = resolver.resolve_search_progressive(
        "apple",
        |result| local = Some(result),
        move |result| {
            let _ = full_tx.send(result);
        },
    );

    let local = local.expect("local result is delivered before returning");
    assert!(local.local_only);
    assert_eq!(handle.state(), ProgressState::LocalDelivered);

    let full = full_rx.await.unwrap();
    assert!(!full.local_only);
    assert_eq!(full.best.map(|m| m.symbol), Some(Some("AAPL".to_string())));
    assert_eq!(handle.state(), ProgressState::FullDelivered);

    handle.finished().await;
}

#[tokio::test]
async fn test_progressive_full_falls_back_to_local_on_failure() {
    let resolver = resolver(
        MockSuggestSource::failing("proxy", "down"),
        MockSuggestSource::failing("api", "down"),
    );

    let (full_tx, full_rx) = oneshot::channel();
    let handle = resolver.resolve_search_progressive(
        "japan",
        |_| {},
        move |result| {
            let _ = full_tx.send(result);
        },
    );

    let full = full_rx.await.unwrap();
    assert!(full.local_only);
    assert_eq!(full.matches[0].label, "Japan");
    handle.finished().await;
}

#[tokio::test]
async fn test_progressive_cancel_suppresses_full() {
    let resolver = resolver(
        MockSuggestSource::with_entities("proxy", vec![entity("Apple Inc.", "AAPL")])
            .with_delay(Duration::from_millis(200)),
        MockSuggestSource::empty("api").with_delay(Duration::from_millis(200)),
    );

    let full_called = Arc::new(AtomicBool::new(false));
    let flag = full_called.clone();

    let handle = resolver.resolve_search_progressive(
        "apple",
        |_| {},
        move |_| flag.store(true, Ordering::SeqCst),
    );

    handle.cancel();
    assert_eq!(handle.state(), ProgressState::Cancelled);

    handle.finished().await;
    assert!(!full_called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_cancel_after_full_is_noop() {
    let resolver = resolver(MockSuggestSource::empty("proxy"), MockSuggestSource::empty("api"));

    let (full_tx, full_rx) = oneshot::channel();
    let handle = resolver.resolve_search_progressive(
        "brazil",
        |_| {},
        move |result| {
            let _ = full_tx.send(result);
        },
    );
    full_rx.await.unwrap();

    handle.cancel();
    assert_eq!(handle.state(), ProgressState::FullDelivered);
}

#[tokio::test]
async fn test_progressive_short_query_delivers_both_synchronously() {
    let resolver = resolver(
        MockSuggestSource::with_entities("proxy", vec![entity("Alcoa", "AA")]),
        MockSuggestSource::empty("api"),
    );

    let mut deliveries = Vec::new();
    let full_called = Arc::new(AtomicBool::new(false));
    let flag = full_called.clone();

    let handle = resolver.resolve_search_progressive(
        "x",
        |result| deliveries.push(result),
        move |result| {
            assert!(result.matches.is_empty());
            flag.store(true, Ordering::SeqCst);
        },
    );

    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].matches.is_empty());
    assert!(full_called.load(Ordering::SeqCst));
    assert_eq!(handle.state(), ProgressState::FullDelivered);
    assert_eq!(resolver.proxy.calls(), 0);
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn test_match_serializes_kind_as_type() {
    let m = ResolvedMatch::new(
        MatchKind::Dataset,
        "Gross Domestic Product",
        "Output".to_string(),
        "/explorer/dataset/gdp".to_string(),
        100.0,
    );
    let value = serde_json::to_value(&m).unwrap();

    assert_eq!(value["type"], "dataset");
    assert_eq!(value["icon"], "database");
    assert!(value.get("cik").is_none());
    assert!(value.get("sub_types").is_none());
    assert_eq!(MatchKind::Vocabulary.to_string(), "vocabulary");
}
