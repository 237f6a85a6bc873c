//! C compiler invocation

use crate::frontend::config::ToolchainConfig;
use crate::frontend::error::{Result, TranslateError};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Builds an executable from a C translation unit
pub trait Toolchain {
    /// Compile `unit` as `name`, linking `links`; returns the output path
    fn compile(
        &self,
        unit: &str,
        name: &str,
        links: &[String],
    ) -> Result<PathBuf>;
}

/// Any compiler with a `cc`-style command line
#[derive(Debug, Clone, Default)]
pub struct ClangToolchain {
    config: ToolchainConfig,
}

impl ClangToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Write the unit to `<output_dir>/<name>.c`
    pub fn write_source(
        &self,
        unit: &str,
        name: &str,
    ) -> Result<PathBuf> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir).map_err(|e| TranslateError::io(dir, e))?;
        let path = dir.join(format!("{}.c", name));
        std::fs::write(&path, unit).map_err(|e| TranslateError::io(&path, e))?;
        debug!("wrote '{}'", path.display());
        Ok(path)
    }
}

impl Toolchain for ClangToolchain {
    fn compile(
        &self,
        unit: &str,
        name: &str,
        links: &[String],
    ) -> Result<PathBuf> {
        let source = self.write_source(unit, name)?;
        let output = self.config.output_dir.join(name);

        let mut command = Command::new(&self.config.compiler);
        command
            .args(&self.config.flags)
            .arg(&source)
            .args(links)
            .arg("-o")
            .arg(&output);
        debug!("running {:?}", command);

        let result = command.output().map_err(|e| TranslateError::Toolchain {
            message: format!("could not run '{}': {}", self.config.compiler, e),
        })?;
        if !result.status.success() {
            return Err(TranslateError::Toolchain {
                message: format!(
                    "'{}' failed with {}:\n{}",
                    self.config.compiler,
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim_end()
                ),
            });
        }
        info!("compiled '{}'", output.display());
        Ok(output)
    }
}
