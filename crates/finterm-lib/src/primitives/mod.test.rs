use super::*;
use std::error::Error;

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant
                    .to_possible_value()
                    .expect("PossibleValue should exist for all variants");

                // Round-trip through the primary name
                let parsed: $enum_type = possible_value
                    .get_name()
                    .parse()
                    .expect("primary name should parse");
                assert_eq!(parsed, *variant, "Round-trip should preserve variant");
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(LogFormat, test_log_format_completeness);
test_enum_completeness!(LogOutput, test_log_output_completeness);
test_enum_completeness!(ColorIntent, test_color_intent_completeness);

#[test]
fn test_log_level_aliases() {
    let mappings = [
        ("err", LogLevel::Error),
        ("fatal", LogLevel::Error),
        ("warning", LogLevel::Warning),
        ("information", LogLevel::Info),
        ("debugging", LogLevel::Debug),
        ("verbose", LogLevel::Trace),
    ];

    for (input, expected) in mappings {
        assert_eq!(input.parse::<LogLevel>().unwrap(), expected, "input '{input}'");
    }
}

#[test]
fn test_log_format_aliases() {
    assert_eq!("txt".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert_eq!("plain".parse::<LogFormat>().unwrap(), LogFormat::Text);
    assert_eq!("yml".parse::<LogFormat>().unwrap(), LogFormat::Yaml);
}

#[test]
fn test_invalid_value_reports_parse_error() {
    let err = "loud".parse::<LogLevel>().unwrap_err();
    match err {
        ConfigError::ParseError { value, reason } => {
            assert_eq!(value, "loud");
            assert_eq!(reason, "invalid log level");
        }
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_verbosity_mapping() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(4), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(200), LogLevel::Trace);
    assert_eq!(LogLevel::Warning.as_filter_str(), "warn");
}

#[test]
fn test_invalid_base_url_keeps_source() {
    let source = url::Url::parse("not a url").unwrap_err();
    let err = ConfigError::InvalidBaseUrl {
        value: "not a url".to_string(),
        source,
    };

    assert!(err.to_string().contains("not a url"));
    assert!(err.source().is_some());
}
