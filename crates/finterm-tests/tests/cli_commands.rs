//! CLI command handlers against a mock API

use anyhow::Result;
use finterm_lib::application::{Commands, ConfigAction, execute_command_with_output};
use finterm_tests::TestApi;
use serde_json::Value;

async fn run(api: &TestApi, command: Commands) -> (Result<()>, String) {
    let mut out = Vec::new();
    let result = execute_command_with_output(command, &api.app_config(), &mut out).await;
    (result, String::from_utf8_lossy(&out).into_owned())
}

#[tokio::test]
async fn fetch_command_prints_metered_envelope() -> Result<()> {
    let mut api = TestApi::start().await;
    let mock = api.mount("countries", 1).await?;

    let (result, out) = run(
        &api,
        Commands::Fetch {
            path: "/api/v1/countries".to_string(),
            method: "GET".to_string(),
            retries: None,
            body: None,
        },
    )
    .await;

    result?;
    let envelope: Value = serde_json::from_str(&out)?;
    assert_eq!(envelope["credits_remaining"], 4999);
    assert_eq!(envelope["data"]["total"], 3);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn resolve_command_ranks_entities() -> Result<()> {
    let mut api = TestApi::start().await;
    api.mount("suggest_apple", 2).await?;

    let (result, out) = run(
        &api,
        Commands::Resolve {
            query: "apple".to_string(),
            progressive: false,
            local: false,
        },
    )
    .await;

    result?;
    let first_line = out.lines().next().unwrap_or_default();
    assert!(first_line.contains("Apple Inc."));
    assert!(out.contains("APLE"));
    Ok(())
}

#[tokio::test]
async fn card_command_reports_failures() -> Result<()> {
    let mut api = TestApi::start().await;
    api.mount("company_not_found", 1).await?;

    let (result, out) = run(
        &api,
        Commands::Card {
            id: "company".to_string(),
            path: "/api/v1/company/0000000000".to_string(),
            ttl: 300,
            session: true,
        },
    )
    .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("session:company"));
    assert!(err.contains("Company not found"));
    assert!(out.contains("\"status\": 404"));
    Ok(())
}

#[tokio::test]
async fn config_check_reports_mock_origin() -> Result<()> {
    let api = TestApi::start().await;

    let (result, out) = run(
        &api,
        Commands::Config {
            action: ConfigAction::Check,
        },
    )
    .await;

    result?;
    let status: Value = serde_json::from_str(&out)?;
    assert_eq!(status["configured"], true);
    assert_eq!(status["api_base"], api.url());
    Ok(())
}
