use super::*;
use serde_json::json;

fn success(value: serde_json::Value) -> Arc<FetchResult> {
    Arc::new(FetchResult {
        ok: true,
        status: 200,
        data: Some(value),
        error: None,
        token_cost: 1,
        credits_remaining: Some(99),
    })
}

#[tokio::test]
async fn test_cache_creation() {
    let cache = ResultCache::new();
    assert!(cache.is_empty().await);
    assert_eq!(cache.len().await, 0);
}

#[tokio::test]
async fn test_cache_hit_returns_same_result() {
    let cache = ResultCache::new();
    let result = success(json!({ "rate": 1.08 }));

    assert!(cache.put("global:fx", result.clone(), DEFAULT_CACHE_TTL).await);

    let hit = cache.get("global:fx").await.unwrap();
    assert!(Arc::ptr_eq(&hit, &result));
    assert!(cache.get("global:other").await.is_none());
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let cache = ResultCache::new();
    let failure = Arc::new(FetchResult::failure(503, "Service Unavailable"));

    assert!(!cache.put("global:fx", failure, DEFAULT_CACHE_TTL).await);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_zero_ttl_is_not_cached() {
    let cache = ResultCache::new();
    assert!(!cache.put("global:fx", success(json!(1)), Duration::ZERO).await);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_expired_entry_is_evicted_on_read() {
    let cache = ResultCache::new();
    cache.put("session:filings", success(json!([])), Duration::from_millis(20)).await;

    tokio::time::sleep(Duration::from_millis(40)).await;

    assert!(cache.get("session:filings").await.is_none());
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_purge_expired_keeps_fresh_entries() {
    let cache = ResultCache::new();
    cache.put("a", success(json!(1)), Duration::from_millis(10)).await;
    cache.put("b", success(json!(2)), Duration::from_secs(60)).await;

    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(cache.purge_expired().await, 1);
    assert_eq!(cache.len().await, 1);
    assert!(cache.get("b").await.is_some());
}

#[tokio::test]
async fn test_remove_and_clear() {
    let cache = ResultCache::new();
    cache.put("a", success(json!(1)), DEFAULT_CACHE_TTL).await;
    cache.put("b", success(json!(2)), DEFAULT_CACHE_TTL).await;

    cache.remove("a").await;
    assert!(cache.get("a").await.is_none());
    assert_eq!(cache.len().await, 1);

    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[test]
fn test_cached_result_expiry() {
    let fresh = CachedResult {
        result: success(json!(null)),
        expires: Some(Instant::now() + Duration::from_secs(300)),
    };
    assert!(!fresh.is_expired());
    assert!(fresh.remaining() > Duration::from_secs(200));

    let stale = CachedResult {
        result: success(json!(null)),
        expires: Some(Instant::now()),
    };
    assert!(stale.is_expired());
    assert_eq!(stale.remaining(), Duration::ZERO);
}

#[tokio::test]
async fn test_unbounded_ttl_never_expires() {
    let cache = ResultCache::new();
    let result = success(json!({ "rate": 1.08 }));

    assert!(cache.put("global:fx", result.clone(), Duration::MAX).await);

    let hit = cache.get("global:fx").await.unwrap();
    assert!(Arc::ptr_eq(&hit, &result));
    assert_eq!(cache.purge_expired().await, 0);
}
