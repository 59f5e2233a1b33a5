use super::*;

#[test]
fn empty_document_yields_defaults() {
    let config = ExecutorConfig::from_toml_str("").expect("empty config should parse");

    assert_eq!(config, ExecutorConfig::default());
    assert_eq!(config.cartesian_warn_rows, DEFAULT_CARTESIAN_WARN_ROWS);
    assert!(config.default_null_ordering.is_none());
}

#[test]
fn parses_every_key() {
    let config = ExecutorConfig::from_toml_str(
        r#"
default_null_ordering = "last"
cartesian_warn_rows = 250
"#,
    )
    .expect("config should parse");

    assert_eq!(config.default_null_ordering, Some(NullOrdering::Last));
    assert_eq!(config.cartesian_warn_rows, 250);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ExecutorConfig::from_toml_str("null_order = \"first\"")
        .expect_err("unknown key should be rejected");

    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn bad_null_ordering_is_rejected() {
    assert!(ExecutorConfig::from_toml_str("default_null_ordering = \"middle\"").is_err());
}

#[test]
fn json_shape_matches_toml_keys() {
    let config = ExecutorConfig::default().with_default_null_ordering(NullOrdering::First);
    let json = serde_json::to_value(&config).expect("config should serialize");

    assert_eq!(json["default_null_ordering"], "first");
    assert_eq!(json["cartesian_warn_rows"], DEFAULT_CARTESIAN_WARN_ROWS);
}
