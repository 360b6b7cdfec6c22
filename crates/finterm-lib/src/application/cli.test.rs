use super::*;
use crate::primitives::ColorIntent;

#[test]
fn test_no_subcommand_is_allowed() {
    let cli = Cli::try_parse_from(["finterm"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.config.retries, 2);
}

#[test]
fn test_fetch_defaults_to_get() {
    let cli = Cli::try_parse_from(["finterm", "fetch", "/api/v1/countries"]).unwrap();
    match cli.command {
        Some(Commands::Fetch {
            path,
            method,
            retries,
            body,
        }) => {
            assert_eq!(path, "/api/v1/countries");
            assert_eq!(method, "GET");
            assert_eq!(retries, None);
            assert_eq!(body, None);
        }
        other => panic!("expected fetch command, got {:?}", other),
    }
}

#[test]
fn test_fetch_with_body_and_method() {
    let cli = Cli::try_parse_from([
        "finterm",
        "fetch",
        "/api/v1/watchlists",
        "-X",
        "POST",
        "--body",
        r#"{"name":"tech"}"#,
        "--retries",
        "0",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Fetch {
            method, retries, body, ..
        }) => {
            assert_eq!(method, "POST");
            assert_eq!(retries, Some(0));
            assert_eq!(body.as_deref(), Some(r#"{"name":"tech"}"#));
        }
        other => panic!("expected fetch command, got {:?}", other),
    }
}

#[test]
fn test_resolve_flags() {
    let cli = Cli::try_parse_from(["finterm", "resolve", "apple", "--progressive"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Resolve {
            progressive: true,
            local: false,
            ..
        })
    ));

    let conflicting = Cli::try_parse_from(["finterm", "resolve", "apple", "--progressive", "--local"]);
    assert!(conflicting.is_err());
}

#[test]
fn test_card_defaults() {
    let cli = Cli::try_parse_from(["finterm", "card", "gdp-chart", "/api/v1/gdp"]).unwrap();
    match cli.command {
        Some(Commands::Card { id, path, ttl, session }) => {
            assert_eq!(id, "gdp-chart");
            assert_eq!(path, "/api/v1/gdp");
            assert_eq!(ttl, 300);
            assert!(!session);
        }
        other => panic!("expected card command, got {:?}", other),
    }
}

#[test]
fn test_config_check() {
    let cli = Cli::try_parse_from(["finterm", "config", "check"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            action: ConfigAction::Check
        })
    ));
}

#[test]
fn test_global_flags_before_subcommand() {
    let cli = Cli::try_parse_from([
        "finterm",
        "--color",
        "never",
        "--allow-any-host",
        "resolve",
        "gdp",
        "--local",
    ])
    .unwrap();

    assert_eq!(cli.config.color, ColorIntent::Never);
    assert!(cli.config.allow_any_host);
}

#[test]
fn test_requires_api() {
    assert!(!Commands::Version.requires_api());
    assert!(
        !Commands::Config {
            action: ConfigAction::Check
        }
        .requires_api()
    );
    assert!(
        Commands::Fetch {
            path: "/".to_string(),
            method: "GET".to_string(),
            retries: None,
            body: None,
        }
        .requires_api()
    );
    assert!(
        !Commands::Resolve {
            query: "gdp".to_string(),
            progressive: false,
            local: true,
        }
        .requires_api()
    );
}
