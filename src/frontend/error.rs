//! Translation errors
//!
//! Every failure inside the front-end is unrecoverable for the unit being
//! translated. Located variants carry the file, line and the statement text
//! last examined so the driver can print a useful diagnostic.

use crate::frontend::lexer::LexError;
use crate::frontend::types::TypeModelError;
use crate::util::span::Location;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the front-end
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Sequencing,
    Type,
    Rule,
    MalformedType,
    Io,
    Package,
    Macro,
    Toolchain,
    Config,
}

/// Translation error
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Malformed top-level construct (struct or function declaration shape)
    #[error("parse error: {message}")]
    Parse { message: String, location: Location },

    /// Malformed expression, unresolved or ambiguous call, bad instantiation
    #[error("sequencing error: {message}")]
    Sequencing { message: String, location: Location },

    /// Incompatible types
    #[error("type error: {message}")]
    Type { message: String, location: Location },

    /// Malformed rule or dialect, unknown engine, rule or bundle
    #[error("rule error: {message}")]
    Rule { message: String, location: Location },

    /// Broken type-chain invariant
    #[error("malformed type: {source}")]
    MalformedType {
        #[source]
        source: TypeModelError,
        location: Location,
    },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package '{name}': {message}")]
    Package { name: String, message: String },

    #[error("macro '{name}': {message}")]
    Macro { name: String, message: String },

    #[error("toolchain: {message}")]
    Toolchain { message: String },

    #[error("config: {message}")]
    Config { message: String },
}

impl TranslateError {
    pub fn parse(
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        TranslateError::Parse {
            message: message.into(),
            location,
        }
    }

    pub fn sequencing(
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        TranslateError::Sequencing {
            message: message.into(),
            location,
        }
    }

    pub fn type_error(
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        TranslateError::Type {
            message: message.into(),
            location,
        }
    }

    pub fn rule(
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        TranslateError::Rule {
            message: message.into(),
            location,
        }
    }

    pub fn malformed_type(
        source: TypeModelError,
        location: Location,
    ) -> Self {
        TranslateError::MalformedType { source, location }
    }

    pub fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        TranslateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::Parse { .. } => ErrorKind::Parse,
            TranslateError::Sequencing { .. } => ErrorKind::Sequencing,
            TranslateError::Type { .. } => ErrorKind::Type,
            TranslateError::Rule { .. } => ErrorKind::Rule,
            TranslateError::MalformedType { .. } => ErrorKind::MalformedType,
            TranslateError::Io { .. } => ErrorKind::Io,
            TranslateError::Package { .. } => ErrorKind::Package,
            TranslateError::Macro { .. } => ErrorKind::Macro,
            TranslateError::Toolchain { .. } => ErrorKind::Toolchain,
            TranslateError::Config { .. } => ErrorKind::Config,
        }
    }

    /// Where the error happened, when known
    pub fn location(&self) -> Option<&Location> {
        match self {
            TranslateError::Parse { location, .. }
            | TranslateError::Sequencing { location, .. }
            | TranslateError::Type { location, .. }
            | TranslateError::Rule { location, .. }
            | TranslateError::MalformedType { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Attach a location to an error that has none yet
    pub fn or_at(
        mut self,
        at: &Location,
    ) -> Self {
        if let Some(location) = self.location_mut() {
            if location.is_dummy() {
                *location = at.clone();
            }
        }
        self
    }

    fn location_mut(&mut self) -> Option<&mut Location> {
        match self {
            TranslateError::Parse { location, .. }
            | TranslateError::Sequencing { location, .. }
            | TranslateError::Type { location, .. }
            | TranslateError::Rule { location, .. }
            | TranslateError::MalformedType { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl From<LexError> for TranslateError {
    fn from(err: LexError) -> Self {
        TranslateError::parse(err.to_string(), Location::dummy())
    }
}

impl From<crate::util::config::ConfigError> for TranslateError {
    fn from(err: crate::util::config::ConfigError) -> Self {
        TranslateError::Config {
            message: err.to_string(),
        }
    }
}
