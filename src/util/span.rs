//! Source location tracking
//!
//! The sequencer only knows about whole lines: the lexer interleaves
//! `//__LINE__=N` marker tokens with the real tokens and the builder updates
//! the current [`Location`] whenever it consumes one.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// File name, line number and the statement text last examined
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    /// File being translated (empty for in-memory sources)
    pub file: Arc<str>,
    /// Line number (1-indexed, 0 when unknown)
    pub line: usize,
    /// Raw tokens of the statement being sequenced, joined by spaces
    pub code: Option<String>,
}

impl Location {
    /// Create a new location at the start of a file
    #[inline]
    pub fn new(file: impl Into<Arc<str>>) -> Self {
        Self {
            file: file.into(),
            line: 1,
            code: None,
        }
    }

    /// Create a dummy location
    #[inline]
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Check if this is a dummy location
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.line == 0 && self.file.is_empty()
    }

    /// Same location with the offending statement attached
    pub fn with_code(
        mut self,
        tokens: &[String],
    ) -> Self {
        if !tokens.is_empty() {
            self.code = Some(tokens.join(" "));
        }
        self
    }
}

impl fmt::Display for Location {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "<input>:{}", self.line)
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}
