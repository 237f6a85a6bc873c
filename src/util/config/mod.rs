//! Oak project configuration file
//!
//! A project may carry an `oak.toml` next to its sources. Values from the
//! file are overridden by command line flags.
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Project-level (oak.toml)
//! 3. Default values
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use oak::util::config::load_project_config;
//!
//! let config = load_project_config(std::path::Path::new("oak.toml")).unwrap();
//! assert!(config.prelude);
//! ```

use crate::frontend::config::TranslateConfig;
use std::fs;
use std::path::Path;

/// Default project configuration file name
pub const CONFIG_FILE_NAME: &str = "oak.toml";

/// Load project configuration
/// Returns default config if file doesn't exist
pub fn load_project_config(path: &Path) -> Result<TranslateConfig, ConfigError> {
    if !path.exists() {
        return Ok(TranslateConfig::default());
    }

    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;

    parse_config(&content)
}

/// Parse configuration text
pub fn parse_config(content: &str) -> Result<TranslateConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::ParseError)
}

/// Save project configuration
pub fn save_project_config(
    config: &TranslateConfig,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::IoError)?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(toml::de::Error),
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Config parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Config serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
