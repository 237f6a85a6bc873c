//! Dialect files
//!
//! ```text
//! // comment
//! [engine]          switch the engine for the following rules
//! "in" "out"        add a rule
//! clear             drop every dialect rule loaded so far
//! final             lock out further dialect loading
//! ```

use super::{RuleSet, DEFAULT_ENGINE};
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::unquote;
use crate::util::span::Location;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// Names of dialect rules are this prefix plus their index
pub const DIALECT_RULE_PREFIX: &str = "dialect_rule_";

static ENGINE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z_][A-Za-z0-9_]*)\]$").expect("valid regex"));

static RULE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')\s+("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')$"#)
        .expect("valid regex")
});

impl RuleSet {
    /// Load a dialect file from disk
    pub fn load_dialect(
        &mut self,
        path: &Path,
    ) -> Result<()> {
        if self.dialect_locked {
            warn!(
                "dialect '{}' ignored: a final dialect is already loaded",
                path.display()
            );
            return Ok(());
        }
        let text =
            std::fs::read_to_string(path).map_err(|e| TranslateError::io(path, e))?;
        self.load_dialect_str(&text, &path.display().to_string())
    }

    /// Load dialect text; `file` is used for diagnostics
    pub fn load_dialect_str(
        &mut self,
        text: &str,
        file: &str,
    ) -> Result<()> {
        if self.dialect_locked {
            warn!("dialect '{}' ignored: a final dialect is already loaded", file);
            return Ok(());
        }

        let mut engine = DEFAULT_ENGINE.to_string();
        for (index, raw) in text.lines().enumerate() {
            let mut at = Location::new(file);
            at.line = index + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if let Some(caps) = ENGINE_LINE.captures(line) {
                engine = caps[1].to_string();
                self.engine(&engine).map_err(|e| e.or_at(&at))?;
                continue;
            }

            if let Some(caps) = RULE_LINE.captures(line) {
                let input = unquote(&caps[1]);
                let output = unquote(&caps[2]);
                let name = format!("{}{}", DIALECT_RULE_PREFIX, self.dialect.len());
                let rule = self
                    .build_rule(&input, &output, &engine)
                    .map_err(|e| e.or_at(&at))?;
                self.rules.insert(name.clone(), rule);
                self.dialect.push(name);
                continue;
            }

            match line {
                "clear" => {
                    for name in self.dialect.drain(..) {
                        self.rules.shift_remove(&name);
                    }
                }
                "final" => {
                    self.dialect_locked = true;
                    break;
                }
                _ => {
                    return Err(TranslateError::rule(
                        format!("invalid dialect line '{}'", line),
                        at,
                    ))
                }
            }
        }

        debug!("dialect '{}' loaded, {} rules", file, self.dialect.len());
        Ok(())
    }
}
