use cfgraph_config::{ConfigValidationError, ConfigWarning, GraphConfig};

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[parser]
max_dpeth = 12

[logging]
levle = "debug"
"#;

    let (config, diagnostics) =
        GraphConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["logging.levle", "parser.max_dpeth", "typo"]
    );
    assert_eq!(config.parser.max_depth, 256);
    assert!(diagnostics.is_ok());
}

#[test]
fn reports_blank_exclusion_prefixes_as_warnings() {
    let text = r#"
[parser]
exclusion_prefixes = ["java.lang.annotation.", "  "]
"#;

    let (_config, diagnostics) =
        GraphConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::BlankExclusionPrefix { index: 1 }]
    );
    assert!(diagnostics.unknown_keys.is_empty());
}

#[test]
fn semantic_errors_are_reported_without_failing_the_load() {
    let text = r#"
[parser]
platform_prefix = ""
max_depth = 0
"#;

    let (_config, diagnostics) =
        GraphConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.errors,
        vec![
            ConfigValidationError::EmptyPlatformPrefix,
            ConfigValidationError::ZeroMaxDepth
        ]
    );
    assert!(!diagnostics.is_ok());
}

#[test]
fn empty_input_produces_no_diagnostics() {
    let (config, diagnostics) =
        GraphConfig::load_from_str_with_diagnostics("").expect("config should parse");
    assert_eq!(config, GraphConfig::default());
    assert!(diagnostics.is_empty());
}
