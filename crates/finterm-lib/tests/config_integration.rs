use finterm_lib::application::config::AppConfig;
use finterm_lib::application::{Cli, CliConfig, EnvironmentConfig};
use finterm_lib::networking::ConfigStore;
use finterm_lib::primitives::{ColorIntent, ConfigError};
use clap::Parser;

#[test]
fn test_config_default_creation() {
    let config = AppConfig::default();

    assert!(config.log_level <= 4);
    assert!(config.net_timeout > 0);
    assert_eq!(config.color, ColorIntent::Auto);
    assert!(config.config_store().unwrap().get_config().is_none());
}

#[test]
fn test_cli_to_store_integration() {
    let cli = Cli::try_parse_from([
        "finterm",
        "--api-base",
        "https://data.finuties.com/v1/",
        "--api-token",
        "  fin_sk_abc  ",
        "--retries",
        "4",
    ])
    .unwrap();

    let config = CliConfig::from_cli(cli, &EnvironmentConfig::default()).unwrap();
    let api = config.app_config.config_store().unwrap().get_config().unwrap();

    assert_eq!(api.base(), "https://data.finuties.com");
    assert_eq!(api.token(), "fin_sk_abc");
    assert_eq!(config.app_config.retries, 4);
    assert_eq!(config.app_config.proxy_origin().as_deref(), Some("https://data.finuties.com"));
}

#[test]
fn test_non_http_scheme_is_rejected() {
    let cli = Cli::try_parse_from([
        "finterm",
        "--allow-any-host",
        "--api-base",
        "ftp://data.finuties.com",
        "--api-token",
        "fin_sk_abc",
    ])
    .unwrap();

    let result = CliConfig::from_cli(cli, &EnvironmentConfig::default());
    assert!(matches!(result, Err(ConfigError::UnsupportedScheme { .. })));
}
