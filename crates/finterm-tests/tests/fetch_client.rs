//! End-to-end fetch client tests against recorded API interactions

use anyhow::Result;
use finterm_lib::networking::{FetchResult, RequestInit};
use finterm_tests::{TEST_TOKEN, TestApi, unreachable_client};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
struct Country {
    iso3: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Observation {
    year: u16,
    value: f64,
}

#[tokio::test]
async fn fetch_decodes_items_and_metering() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("countries", 1).await?;

    let result = api.client()?.get("/api/v1/countries").await;

    assert!(result.ok);
    assert_eq!(result.status, 200);
    assert_eq!(result.token_cost, 1);
    assert_eq!(result.credits_remaining, Some(4999));

    let countries: Vec<Country> = result.items()?;
    assert_eq!(countries.len(), 3);
    assert_eq!(countries[1].iso3, "FRA");
    assert_eq!(countries[1].name, "France");

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn fetch_reads_data_envelope_with_query() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("gdp_series", 1).await?;

    let result = api.client()?.get("/api/v1/macro/gdp?country=USA").await;

    let series: Vec<Observation> = result.items()?;
    assert_eq!(series.len(), 3);
    assert_eq!(series[2].year, 2024);
    assert!(series[2].value > series[0].value);
    assert_eq!(result.token_cost, 3);

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn fetch_surfaces_error_detail() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("company_not_found", 1).await?;

    let result = api.client()?.get("/api/v1/company/0000000000").await;

    assert!(!result.ok);
    assert_eq!(result.status, 404);
    assert_eq!(result.error.as_deref(), Some("Company not found"));
    assert_eq!(result.data, None);
    assert_eq!(result.credits_remaining, Some(4999));

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn concurrent_gets_share_one_request() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("countries", 1).await?;
    let client = api.client()?;

    let (a, b, c) = tokio::join!(
        client.get("/api/v1/countries"),
        client.get("/api/v1/countries"),
        client.get("/api/v1/countries"),
    );

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert!(client.inflight().is_empty());

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn transient_failures_are_retried() -> Result<()> {
    let mut api = TestApi::start().await;
    let failing = api
        .server
        .mock("GET", "/api/v1/quotes/AAPL")
        .with_status(502)
        .expect(3)
        .create_async()
        .await;
    let client = api.client()?;

    let started = Instant::now();
    let result = client
        .fetch("/api/v1/quotes/AAPL", RequestInit::get().with_retry_count(2))
        .await;

    assert!(!result.ok);
    assert_eq!(result.status, 502);
    assert!(started.elapsed() >= Duration::from_millis(30));
    failing.assert_async().await;
    failing.remove_async().await;

    api.server
        .mock("GET", "/api/v1/quotes/AAPL")
        .with_status(200)
        .with_body(r#"{"price":227.5}"#)
        .create_async()
        .await;

    let recovered = client.get("/api/v1/quotes/AAPL").await;
    assert!(recovered.ok);
    assert_eq!(recovered.data.as_ref().unwrap()["price"], 227.5);
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_sent() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api
        .server
        .mock("GET", "/api/v1/me")
        .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
        .with_status(204)
        .create_async()
        .await;

    let result = api.client()?.get("/api/v1/me").await;

    assert!(result.ok);
    assert_eq!(result.data, None);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn cancellation_reports_timeout() -> Result<()> {
    let mut api = TestApi::start().await;
    api.server
        .mock("GET", "/api/v1/slow")
        .with_status(503)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        trigger.cancel();
    });

    let client = api.client()?;
    let result = client
        .fetch(
            "/api/v1/slow",
            RequestInit::get().with_retry_count(4).with_cancel(cancel),
        )
        .await;

    assert_eq!(*result, FetchResult::timed_out());
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() -> Result<()> {
    let result = unreachable_client()?
        .fetch("/api/v1/countries", RequestInit::get().with_retry_count(0))
        .await;

    assert!(!result.ok);
    assert_eq!(result.status, 0);
    assert!(result.error.as_deref().unwrap_or_default().starts_with("Network error"));
    Ok(())
}
