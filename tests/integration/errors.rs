//! Error reporting tests

use oak::frontend::error::ErrorKind;
use oak::{translate, TranslateConfig, Translator};

#[test]
fn test_undefined_call_has_location() {
    let err = translate("let main() {\n  nope(1);\n}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sequencing);
    assert_eq!(err.location().map(|l| l.line), Some(2));
}

#[test]
fn test_location_names_the_file() {
    let mut translator = Translator::new(TranslateConfig::default()).unwrap();
    let err = translator
        .translate_source("broken.oak", "let main() {\n\n  nope;\n}")
        .unwrap_err();
    let location = err.location().unwrap();
    assert_eq!(location.to_string(), "broken.oak:3");
}

#[test]
fn test_unterminated_string() {
    assert!(translate("let main() { \"abc }").is_err());
}

#[test]
fn test_unmatched_brace() {
    assert!(translate("let main() {").is_err());
}

#[test]
fn test_missing_file() {
    let mut translator = Translator::new(TranslateConfig::default()).unwrap();
    let err = translator.translate_file("does/not/exist.oak").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_macro_without_evaluator() {
    let err = translate("let main() { shout!(1); }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Macro);
}

#[test]
fn test_type_mismatch_in_condition() {
    let err = translate("let main() { if 1 { } }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}
