//! Fixture infrastructure for E2E tests
//!
//! Loads VCR cassettes holding recorded Finuties API interactions and mounts
//! them on a mockito server.

use anyhow::Result;
use mockito::{Matcher, Mock, ServerGuard};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// VCR cassette structure matching our recorded HTTP interactions
#[derive(Debug, Deserialize)]
pub struct VcrCassette {
    pub name: String,
    pub request: VcrRequest,
    pub response: VcrResponse,
}

#[derive(Debug, Deserialize)]
pub struct VcrRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub query: Value,
    #[serde(default)]
    pub headers: Value,
}

#[derive(Debug, Deserialize)]
pub struct VcrResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Value,
    pub body: Value,
}

/// Absolute path of a cassette under `fixtures/cassettes/finuties`
pub fn cassette_path(name: &str) -> String {
    format!(
        "{}/fixtures/cassettes/finuties/{}.json",
        env!("CARGO_MANIFEST_DIR"),
        name
    )
}

/// Load and parse a whole cassette
pub fn load_cassette(cassette_path: &str) -> Result<VcrCassette> {
    let cassette_content = std::fs::read_to_string(cassette_path)
        .map_err(|e| anyhow::anyhow!("Failed to load VCR cassette '{}': {}", cassette_path, e))?;

    serde_json::from_str(&cassette_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse VCR cassette '{}': {}", cassette_path, e))
}

/// Load a VCR cassette and extract the response body as a typed value
pub fn load_vcr_response<T>(cassette_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let vcr = load_cassette(cassette_path)?;
    serde_json::from_value(vcr.response.body)
        .map_err(|e| anyhow::anyhow!("Failed to deserialize response body from '{}': {}", cassette_path, e))
}

/// Load a VCR cassette's response body as raw JSON string (for mockito)
pub fn load_vcr_body_string(cassette_path: &str) -> Result<String> {
    let vcr = load_cassette(cassette_path)?;
    serde_json::to_string(&vcr.response.body)
        .map_err(|e| anyhow::anyhow!("Failed to serialize response body from '{}': {}", cassette_path, e))
}

fn query_matcher(query: &Value) -> Matcher {
    match query.as_object() {
        Some(params) if !params.is_empty() => Matcher::AllOf(
            params
                .iter()
                .map(|(key, value)| {
                    let value = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    Matcher::UrlEncoded(key.clone(), value)
                })
                .collect(),
        ),
        _ => Matcher::Any,
    }
}

/// Mount a cassette on `server`, expecting it to be hit `hits` times
pub async fn mount_cassette(server: &mut ServerGuard, name: &str, hits: usize) -> Result<Mock> {
    let vcr = load_cassette(&cassette_path(name))?;

    let mut mock = server
        .mock(vcr.request.method.as_str(), vcr.request.url.as_str())
        .match_query(query_matcher(&vcr.request.query))
        .with_status(vcr.response.status as usize);

    if let Some(headers) = vcr.response.headers.as_object() {
        for (header, value) in headers {
            if let Some(value) = value.as_str() {
                mock = mock.with_header(header.as_str(), value);
            }
        }
    }

    let body = serde_json::to_string(&vcr.response.body)?;
    Ok(mock.with_body(body).expect(hits).create_async().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_vcr_cassette() {
        let json: Value = load_vcr_response(&cassette_path("suggest_apple")).unwrap();
        let suggestions = json["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0]["symbol"].as_str().unwrap(), "AAPL");
    }

    #[test]
    fn test_load_vcr_body_string() {
        let body_str = load_vcr_body_string(&cassette_path("company_not_found")).unwrap();
        assert!(body_str.contains("Company not found"));
    }

    #[test]
    fn test_query_matcher_from_cassette() {
        let vcr = load_cassette(&cassette_path("countries")).unwrap();
        assert_eq!(vcr.name, "countries");
        assert!(matches!(query_matcher(&vcr.request.query), Matcher::Any));
    }

    #[test]
    fn test_missing_cassette_is_an_error() {
        let err = load_cassette(&cassette_path("does_not_exist")).unwrap_err();
        assert!(err.to_string().contains("Failed to load VCR cassette"));
    }
}
