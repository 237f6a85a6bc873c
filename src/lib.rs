//! Oak translator
//!
//! Translates Oak source into a single C translation unit. Oak has no fixed
//! operator grammar: user rewrite rules reshape the token stream, operators
//! desugar to overloadable calls, and the sequencer resolves every call
//! against the symbol table before C is emitted.
//!
//! # Example
//!
//! ```rust
//! let c = oak::translate(
//!     r#"
//!     let main() -> i32 {
//!         let x: i32;
//!         x = 1 + 2;
//!         x
//!     }
//!     "#,
//! )
//! .unwrap();
//! assert!(c.contains("i32 main(void)"));
//! ```

#![warn(rust_2018_idioms)]

pub mod backends;
pub mod frontend;
pub mod middle;
pub mod util;

pub use frontend::config::TranslateConfig;
pub use frontend::error::{Result, TranslateError};
pub use frontend::Translator;

use std::path::Path;
use tracing::debug;

/// Translator version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Translator name
pub const NAME: &str = "Oak";

/// Translate in-memory source with the default configuration
pub fn translate(source: &str) -> Result<String> {
    debug!("translate called with {} bytes", source.len());
    let mut translator = Translator::new(TranslateConfig::default())?;
    translator.translate_source("<input>", source)?;
    Ok(translator.finish())
}

/// Translate one file with the default configuration
pub fn translate_file(path: &Path) -> Result<String> {
    let mut translator = Translator::new(TranslateConfig::default())?;
    translator.translate_file(path)?;
    Ok(translator.finish())
}
