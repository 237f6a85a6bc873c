//! Package resolution through the translator

use oak::frontend::module::NoPackages;
use oak::frontend::error::ErrorKind;
use oak::{TranslateConfig, Translator};
use tempfile::TempDir;

#[test]
fn test_package_files_are_translated() {
    let root = TempDir::new().unwrap();
    let pkg = root.path().join("math");
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(pkg.join("package.toml"), "name = \"math\"\ninclude = [\"sq.oak\"]\n").unwrap();
    std::fs::write(pkg.join("sq.oak"), "let square(x: i32) -> i32 { x * x }").unwrap();

    let mut config = TranslateConfig::default();
    config.package_root = root.path().to_path_buf();
    let mut translator = Translator::new(config).unwrap();
    translator
        .translate_source(
            "app.oak",
            "package!(\"math\");\nlet main() -> i32 { square(4) }",
        )
        .unwrap();
    let c = translator.finish();
    assert!(c.contains("return (Mult_FN_i32_JOIN_i32_MAPS_i32(x, x));"));
    assert!(c.contains("return (square_FN_i32_MAPS_i32(4));"));
}

#[test]
fn test_missing_package() {
    let root = TempDir::new().unwrap();
    let mut config = TranslateConfig::default();
    config.package_root = root.path().to_path_buf();
    let mut translator = Translator::new(config).unwrap();
    let err = translator
        .translate_source("app.oak", "package!(\"ghost\");")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Package);
}

#[test]
fn test_packages_disabled() {
    let mut translator = Translator::new(TranslateConfig::default())
        .unwrap()
        .with_packages(NoPackages);
    assert!(translator.translate_source("app.oak", "package!(\"std\");").is_err());
}
