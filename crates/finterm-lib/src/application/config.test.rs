use super::*;
use crate::networking::ConfigStore;

fn configured(base: &str) -> AppConfig {
    AppConfig {
        api_base: Some(base.to_string()),
        api_token: Some("fin_sk_abc".to_string()),
        ..AppConfig::default()
    }
}

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.net_timeout, 30);
    assert_eq!(config.retries, 2);
    assert_eq!(config.log_level, 0);
    assert_eq!(config.color, ColorIntent::Auto);
    assert!(config.validate().is_ok());
}

#[test]
fn test_clap_defaults_match_serde_defaults() {
    let parsed = AppConfig::try_parse_from(["finterm"]).unwrap();
    let deserialized: AppConfig = serde_json::from_str("{}").unwrap();

    assert_eq!(parsed.net_timeout, deserialized.net_timeout);
    assert_eq!(parsed.retries, deserialized.retries);
    assert_eq!(parsed.log_level, deserialized.log_level);
    assert_eq!(parsed.log_format, deserialized.log_format);
    assert_eq!(parsed.log_output, deserialized.log_output);
    assert_eq!(parsed.color, deserialized.color);
}

#[test]
fn test_allowed_hosts_are_comma_separated() {
    let parsed = AppConfig::try_parse_from([
        "finterm",
        "--allowed-hosts",
        "localhost,api.internal",
    ])
    .unwrap();

    let policy = parsed.host_policy();
    assert!(policy.allows("localhost"));
    assert!(policy.allows("api.internal"));
    assert!(policy.allows("data.finuties.com"));
    assert!(!policy.allows("example.com"));
}

#[test]
fn test_allow_any_host_override() {
    let config = AppConfig {
        allow_any_host: true,
        ..configured("http://127.0.0.1:8080")
    };
    assert!(config.validate().is_ok());
    assert!(config.config_store().unwrap().get_config().is_some());
}

#[test]
fn test_untrusted_host_is_rejected() {
    let config = configured("https://evil.example.com");
    assert!(matches!(config.validate(), Err(ConfigError::HostNotAllowed { .. })));
    assert!(config.config_store().is_err());
}

#[test]
fn test_half_configured_api_is_rejected() {
    let base_only = AppConfig {
        api_base: Some("https://data.finuties.com".to_string()),
        ..AppConfig::default()
    };
    assert!(matches!(base_only.validate(), Err(ConfigError::ValidationFailed { .. })));

    let token_only = AppConfig {
        api_token: Some("fin_sk_abc".to_string()),
        ..AppConfig::default()
    };
    assert!(matches!(token_only.validate(), Err(ConfigError::ValidationFailed { .. })));
}

#[test]
fn test_numeric_bounds() {
    let zero_timeout = AppConfig {
        net_timeout: 0,
        ..AppConfig::default()
    };
    assert!(zero_timeout.validate().is_err());

    let too_many_retries = AppConfig {
        retries: 9,
        ..AppConfig::default()
    };
    assert!(too_many_retries.validate().is_err());
}

#[test]
fn test_config_store_normalizes_base() {
    let store = configured("https://data.finuties.com/api/").config_store().unwrap();
    let api = store.get_config().unwrap();
    assert_eq!(api.base(), "https://data.finuties.com");
}

#[test]
fn test_unconfigured_store_is_empty() {
    let store = AppConfig::default().config_store().unwrap();
    assert!(store.get_config().is_none());
}

#[test]
fn test_proxy_origin_falls_back_to_api_base() {
    let config = configured("https://data.finuties.com");
    assert_eq!(config.proxy_origin().as_deref(), Some("https://data.finuties.com"));

    let with_proxy = AppConfig {
        proxy_origin: Some("https://terminal.finuties.com".to_string()),
        ..config
    };
    assert_eq!(with_proxy.proxy_origin().as_deref(), Some("https://terminal.finuties.com"));
}

#[test]
fn test_proxy_origin_drops_path() {
    let config = configured("https://data.finuties.com/api/");
    assert_eq!(config.proxy_origin().as_deref(), Some("https://data.finuties.com"));

    let with_proxy = AppConfig {
        proxy_origin: Some("http://localhost:3000/terminal/".to_string()),
        ..config
    };
    assert_eq!(with_proxy.proxy_origin().as_deref(), Some("http://localhost:3000"));

    let not_http = AppConfig {
        proxy_origin: Some("ftp://data.finuties.com".to_string()),
        ..AppConfig::default()
    };
    assert_eq!(not_http.proxy_origin(), None);
}

#[test]
fn test_logger_config_from_app_config() {
    let config = AppConfig {
        log_level: 3,
        log_format: LogFormat::Json,
        color: ColorIntent::Never,
        ..AppConfig::default()
    };

    let logger = config.to_logger_config();
    assert_eq!(logger.level, LogLevel::Debug);
    assert_eq!(logger.format, LogFormat::Json);
    assert!(!logger.ansi);

    let forced = AppConfig {
        color: ColorIntent::Always,
        ..AppConfig::default()
    };
    assert!(forced.to_logger_config().ansi);
}

#[test]
fn test_networking_config_uses_timeout() {
    let config = AppConfig {
        net_timeout: 5,
        ..AppConfig::default()
    };
    assert_eq!(config.networking_config().timeout, Duration::from_secs(5));
}
