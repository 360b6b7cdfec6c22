use super::*;

#[test]
fn test_validate_normalizes_to_origin_and_trims_token() {
    let config = validate_config(
        "https://data.finuties.com/api/",
        "  fin_sk_abc ",
        &HostPolicy::default(),
    )
    .unwrap();

    assert_eq!(config.base(), "https://data.finuties.com");
    assert_eq!(config.token(), "fin_sk_abc");
}

#[test]
fn test_validate_strips_query_and_keeps_port() {
    let config = validate_config(
        "http://api.finuties.com:8443/v1/?debug=1#frag",
        "tok",
        &HostPolicy::default(),
    )
    .unwrap();

    assert_eq!(config.base(), "http://api.finuties.com:8443");
    assert_eq!(config.url_for("/api/v1/fx"), "http://api.finuties.com:8443/api/v1/fx");
}

#[test]
fn test_validate_rejects_unparseable_url() {
    let err = validate_config("not a url", "tok", &HostPolicy::default()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
}

#[test]
fn test_validate_rejects_blank_token() {
    let err = validate_config("https://data.finuties.com", "   ", &HostPolicy::default()).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyToken));
}

#[test]
fn test_validate_rejects_non_http_scheme() {
    let err = validate_config("ftp://data.finuties.com", "tok", &HostPolicy::default()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
}

#[test]
fn test_allow_list_suffix_matching() {
    let policy = HostPolicy::default();

    assert!(policy.allows("finuties.com"));
    assert!(policy.allows("data.finuties.com"));
    assert!(policy.allows("EU.Data.Finuties.com"));
    assert!(!policy.allows("evilfinuties.com"));
    assert!(!policy.allows("finuties.com.evil.net"));
    assert!(!policy.allows("localhost"));
}

#[test]
fn test_allow_list_exact_host_and_override() {
    let policy = HostPolicy::default().with_host("LocalHost");
    assert!(policy.allows("localhost"));
    assert!(!policy.allows("127.0.0.1"));

    let err = validate_config("https://example.com", "tok", &HostPolicy::default()).unwrap_err();
    assert!(matches!(err, ConfigError::HostNotAllowed { ref host } if host == "example.com"));

    let config = validate_config("https://example.com/x", "tok", &HostPolicy::permissive()).unwrap();
    assert_eq!(config.base(), "https://example.com");
}

#[test]
fn test_debug_redacts_token() {
    let config = validate_config("https://data.finuties.com", "fin_sk_secret", &HostPolicy::default()).unwrap();
    let rendered = format!("{config:?}");

    assert!(rendered.contains("data.finuties.com"));
    assert!(!rendered.contains("fin_sk_secret"));
}

#[test]
fn test_memory_store_round_trip_and_clear() {
    let store = MemoryConfigStore::default();
    assert!(store.get_config().is_none());

    let config = validate_config("https://data.finuties.com", "tok", store.policy()).unwrap();
    assert!(store.set_config(config.clone()));
    assert_eq!(store.get_config(), Some(config));

    store.clear_config();
    assert!(store.get_config().is_none());
}

#[test]
fn test_memory_store_rejects_config_outside_its_policy() {
    let permissive = validate_config("https://example.com", "tok", &HostPolicy::permissive()).unwrap();
    let strict_store = MemoryConfigStore::default();

    assert!(!strict_store.set_config(permissive));
    assert!(strict_store.get_config().is_none());
}

#[test]
fn test_memory_store_with_config_validates() {
    assert!(MemoryConfigStore::with_config(HostPolicy::default(), "nope", "tok").is_err());

    let store = MemoryConfigStore::with_config(HostPolicy::default(), "https://data.finuties.com/", "tok").unwrap();
    assert_eq!(store.get_config().unwrap().base(), "https://data.finuties.com");
}
