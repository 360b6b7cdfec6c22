use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args.iter().copied()).unwrap()
}

fn env_of(pairs: &[(&str, &str)]) -> EnvironmentConfig {
    EnvironmentConfig::from_pairs(pairs.iter().copied()).unwrap()
}

#[test]
fn test_env_color_applies_when_auto() {
    let config = CliConfig::from_cli(parse(&["finterm"]), &env_of(&[("NO_COLOR", "1")])).unwrap();
    assert_eq!(config.app_config.color, ColorIntent::Never);
}

#[test]
fn test_explicit_color_beats_environment() {
    let config = CliConfig::from_cli(
        parse(&["finterm", "--color", "always"]),
        &env_of(&[("NO_COLOR", "1"), ("CI", "true")]),
    )
    .unwrap();
    assert_eq!(config.app_config.color, ColorIntent::Always);
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = CliConfig::from_cli(
        parse(&["finterm", "--retries", "7"]),
        &EnvironmentConfig::default(),
    );
    assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
}

#[test]
fn test_untrusted_api_host_is_rejected() {
    let result = CliConfig::from_cli(
        parse(&[
            "finterm",
            "--api-base",
            "https://example.com",
            "--api-token",
            "fin_sk_abc",
        ]),
        &EnvironmentConfig::default(),
    );
    assert!(matches!(result, Err(ConfigError::HostNotAllowed { .. })));
}

#[test]
fn test_command_is_carried_through() {
    let config = CliConfig::from_cli(parse(&["finterm", "version"]), &EnvironmentConfig::default()).unwrap();
    assert!(matches!(config.command, Some(crate::application::cli::Commands::Version)));
}

#[test]
fn test_missing_env_files_are_ignored() {
    // The crate directory ships no .env files
    assert!(load_env_files().is_ok());
}
