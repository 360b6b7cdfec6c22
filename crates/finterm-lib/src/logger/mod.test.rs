use super::*;

#[test]
fn test_filter_directives_scope_levels() {
    let directives = Logger::filter_directives(LogLevel::Debug);

    assert!(directives.starts_with("finterm=debug,finterm_lib=debug"));
    assert!(directives.contains("reqwest=warn"));
    assert!(directives.contains("hyper_util=warn"));
    assert!(directives.ends_with(",debug"));
}

#[test]
fn test_filter_directives_parse() {
    for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
        let directives = Logger::filter_directives(level);
        assert!(
            EnvFilter::try_new(&directives).is_ok(),
            "directives should parse: {directives}"
        );
    }
}

#[test]
fn test_logger_not_initialized_initially() {
    // Another test in the same binary may have installed the global logger
    assert!(!Logger::is_initialized() || Logger::global().is_some());
}
