use super::*;
use reqwest::header::HeaderValue;
use serde_json::json;

#[test]
fn test_metering_defaults_when_headers_absent() {
    let metering = Metering::from_headers(&HeaderMap::new());
    assert_eq!(metering, Metering { token_cost: 0, credits_remaining: None });
}

#[test]
fn test_metering_parses_and_ignores_garbage() {
    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_COST_HEADER, HeaderValue::from_static(" 3 "));
    headers.insert(CREDITS_REMAINING_HEADER, HeaderValue::from_static("997"));
    assert_eq!(
        Metering::from_headers(&headers),
        Metering { token_cost: 3, credits_remaining: Some(997) }
    );

    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_COST_HEADER, HeaderValue::from_static("lots"));
    headers.insert(CREDITS_REMAINING_HEADER, HeaderValue::from_static("n/a"));
    assert_eq!(Metering::from_headers(&headers), Metering::default());
}

#[test]
fn test_error_message_from_string_detail() {
    let body = json!({ "detail": "Symbol not found" });
    assert_eq!(error_message(404, Some(&body)), "Symbol not found");
}

#[test]
fn test_error_message_from_validation_array() {
    let body = json!({
        "detail": [
            { "loc": ["query", "q"], "msg": "field required" },
            { "loc": ["query", "limit"], "msg": "value is not a valid integer" }
        ]
    });
    assert_eq!(
        error_message(422, Some(&body)),
        "field required; value is not a valid integer"
    );
}

#[test]
fn test_error_message_from_object_detail() {
    let body = json!({ "detail": { "code": "quota" } });
    assert_eq!(error_message(402, Some(&body)), r#"{"code":"quota"}"#);
}

#[test]
fn test_error_message_falls_back_to_status() {
    assert_eq!(error_message(503, None), "Service Unavailable");
    assert_eq!(error_message(500, Some(&json!({ "error": "x" }))), "Internal Server Error");
    assert_eq!(error_message(599, Some(&json!({ "detail": null }))), "HTTP 599");
    assert_eq!(error_message(418, Some(&json!({ "detail": "" }))), "I'm a teapot");
}

#[test]
fn test_items_envelope_shapes() {
    let bare: ItemsEnvelope<u32> = serde_json::from_value(json!([1, 2])).unwrap();
    let items: ItemsEnvelope<u32> = serde_json::from_value(json!({ "items": [3] })).unwrap();
    let data: ItemsEnvelope<u32> = serde_json::from_value(json!({ "data": [4, 5] })).unwrap();

    assert_eq!(bare.into_items(), vec![1, 2]);
    assert_eq!(items.into_items(), vec![3]);
    assert_eq!(data.into_items(), vec![4, 5]);

    assert!(serde_json::from_value::<ItemsEnvelope<u32>>(json!({ "rows": [] })).is_err());
}
