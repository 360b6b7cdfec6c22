//! Dashboard card loading through the result cache

use anyhow::Result;
use finterm_lib::cards::{CachePolicy, CacheScope, EndpointCard, cache_key, end_session, load_card};
use finterm_lib::networking::ResultCache;
use finterm_tests::TestApi;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn repeated_loads_hit_the_cache() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("gdp_series", 1).await?;
    let client = api.client()?;
    let cache = ResultCache::new();

    let card = EndpointCard::new("us-gdp", "/api/v1/macro/gdp?country=USA")
        .with_policy(CachePolicy::global(Duration::from_secs(60)));

    let first = load_card(&card, &client, &cache).await;
    let second = load_card(&card, &client, &cache).await;

    assert!(first.ok);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(cache.get(&cache_key(CacheScope::Global, "us-gdp")).await.is_some());

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn failed_loads_are_refetched() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("company_not_found", 2).await?;
    let client = api.client()?;
    let cache = ResultCache::new();

    let card = EndpointCard::new("company", "/api/v1/company/0000000000");

    let first = load_card(&card, &client, &cache).await;
    let second = load_card(&card, &client, &cache).await;

    assert_eq!(first.status, 404);
    assert_eq!(second.status, 404);
    assert!(cache.is_empty().await);

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn ending_a_session_keeps_global_cards() -> Result<()> {
    let mut api = TestApi::start().await;
    let countries = api.mount("countries", 2).await?;
    let gdp = api.mount("gdp_series", 1).await?;
    let client = api.client()?;
    let cache = ResultCache::new();

    let session_card = EndpointCard::new("countries", "/api/v1/countries")
        .with_policy(CachePolicy::session(Duration::from_secs(60)));
    let global_card = EndpointCard::new("us-gdp", "/api/v1/macro/gdp?country=USA")
        .with_policy(CachePolicy::global(Duration::from_secs(60)));

    load_card(&session_card, &client, &cache).await;
    load_card(&global_card, &client, &cache).await;
    assert_eq!(cache.len().await, 2);

    assert_eq!(end_session(&cache).await, 1);

    // Session card is fetched again, global card is still cached
    load_card(&session_card, &client, &cache).await;
    load_card(&global_card, &client, &cache).await;

    countries.assert_async().await;
    gdp.assert_async().await;
    Ok(())
}
