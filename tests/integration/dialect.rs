//! Rewrite rules and dialects end to end

use oak::{translate, TranslateConfig, Translator};
use tempfile::TempDir;

#[test]
fn test_rule_declared_in_source() {
    let c = translate(
        r#"
        new_rule!("sq", "sq $X", "Mult($X, $X)");
        use_rule!("sq");
        let main() -> i32 { sq 3 }
        "#,
    )
    .unwrap();
    assert!(c.contains("return (Mult_FN_i32_JOIN_i32_MAPS_i32(3, 3));"));
}

#[test]
fn test_removed_rule_stops_rewriting() {
    let err = translate(
        r#"
        new_rule!("sq", "sq $X", "Mult($X, $X)");
        use_rule!("sq");
        rem_rule!("sq");
        let main() -> i32 { sq 3 }
        "#,
    )
    .unwrap_err();
    assert!(err.location().is_some());
}

#[test]
fn test_dialect_from_config() {
    let dir = TempDir::new().unwrap();
    let dialect = dir.path().join("zero.od");
    std::fs::write(&dialect, "// numbers\n\"zero\" \"0\"\n").unwrap();

    let mut config = TranslateConfig::default();
    config.dialects.push(dialect);
    let mut translator = Translator::new(config).unwrap();
    translator
        .translate_source("dialect.oak", "let main() -> i32 { zero }")
        .unwrap();
    assert!(translator.finish().contains("return (0);"));
}

#[test]
fn test_missing_dialect() {
    let mut config = TranslateConfig::default();
    config.dialects.push("no/such/dialect.od".into());
    assert!(Translator::new(config).is_err());
}
