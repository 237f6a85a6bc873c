//! End-to-end translation tests

use oak::frontend::module::FnMacroEvaluator;
use oak::{translate, TranslateConfig, Translator};
use tempfile::TempDir;

#[test]
fn test_main_with_arithmetic() {
    let c = translate(
        r#"
        let main() -> i32 {
            let x: i32;
            x = 1 + 2;
            x
        }
        "#,
    )
    .unwrap();
    assert!(c.contains("i32 main(void) {"));
    assert!(c.contains("Add_FN_i32_JOIN_i32_MAPS_i32(1, 2)"));
    assert!(c.contains("return (x);"));
}

#[test]
fn test_user_function_is_mangled() {
    let c = translate(
        r#"
        let twice(x: i32) -> i32 { x + x }
        let main() -> i32 { twice(2) }
        "#,
    )
    .unwrap();
    assert!(c.contains("i32 twice_FN_i32_MAPS_i32(i32 x) {"));
    assert!(c.contains("return (twice_FN_i32_MAPS_i32(2));"));
}

#[test]
fn test_generic_struct_from_declaration() {
    let c = translate(
        r#"
        let Pair<A, B>: struct { first: A, second: B, }
        let main() { let p: Pair<i32, bool>; }
        "#,
    )
    .unwrap();
    assert!(c.contains("typedef struct Pair__i32_bool_ Pair__i32_bool_;"));
    assert!(c.contains("struct Pair__i32_bool_ {\n    i32 first;\n    bool second;\n};"));
}

#[test]
fn test_include_is_translated_once() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("lib.oak"),
        "let twice(x: i32) -> i32 { x + x }",
    )
    .unwrap();
    let main = dir.path().join("main.oak");
    std::fs::write(
        &main,
        "include!(\"lib.oak\");\ninclude!(\"lib.oak\");\nlet main() -> i32 { twice(2) }",
    )
    .unwrap();

    let mut translator = Translator::new(TranslateConfig::default()).unwrap();
    translator.translate_file(&main).unwrap();
    assert_eq!(translator.context().symbols.candidates("twice").len(), 1);
    assert!(translator.finish().contains("twice_FN_i32_MAPS_i32(2)"));
}

#[test]
fn test_user_macro_expansion() {
    let macros = FnMacroEvaluator::new().register("three", |_| Ok("3".to_string()));
    let mut translator = Translator::new(TranslateConfig::default())
        .unwrap()
        .with_macros(macros);
    translator
        .translate_source("macro.oak", "let main() -> i32 { three!() }")
        .unwrap();
    assert!(translator.finish().contains("return (3);"));
}

#[test]
fn test_links_and_dump() {
    let mut translator = Translator::new(TranslateConfig::default()).unwrap();
    translator
        .translate_source("dump.oak", "link!(\"extra.o\"); let main() { }")
        .unwrap();
    assert_eq!(translator.links(), ["extra.o".to_string()]);

    let dump: serde_json::Value = serde_json::from_str(&translator.dump().unwrap()).unwrap();
    assert_eq!(dump["links"][0], "extra.o");
    assert!(dump["symbols"].is_object());
}

#[test]
fn test_without_prelude_operators_are_undefined() {
    let mut translator = Translator::new(TranslateConfig::new().without_prelude()).unwrap();
    let err = translator
        .translate_source("bare.oak", "let main() -> i32 { 1 + 2 }")
        .unwrap_err();
    assert!(err.to_string().contains("Add"));
}
