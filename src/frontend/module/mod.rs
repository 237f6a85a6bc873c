//! Packages and user macros
//!
//! The translator reaches outside the token stream through two seams:
//!
//! - [`PackageResolver`] turns `package!("name")` into the files to include
//! - [`MacroEvaluator`] turns `name!(args...)` into replacement source text
//!
//! Both are traits so embedders and tests can swap the filesystem and the
//! macro runner out.

mod macros;

pub use macros::{
    expand_macros, is_compiler_macro, CachedMacroEvaluator, FnMacroEvaluator, MacroEvaluator,
    NoMacros, COMPILER_MACROS,
};

use crate::frontend::error::{Result, TranslateError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Manifest file inside every package directory
pub const MANIFEST: &str = "package.toml";

/// Source file extension
pub const SOURCE_EXTENSION: &str = "oak";

/// Finds the source files of a package
pub trait PackageResolver {
    /// Files to include, in include order
    fn files(
        &self,
        name: &str,
    ) -> Result<Vec<PathBuf>>;
}

/// `package.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Files relative to the package directory
    #[serde(default)]
    pub include: Vec<String>,
}

/// Packages installed as directories under one root
#[derive(Debug, Clone)]
pub struct DirectoryPackageResolver {
    root: PathBuf,
}

impl DirectoryPackageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest(
        &self,
        name: &str,
        dir: &Path,
    ) -> Result<Option<PackageManifest>> {
        let path = dir.join(MANIFEST);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|e| TranslateError::io(&path, e))?;
        toml::from_str(&text)
            .map(Some)
            .map_err(|e| TranslateError::Package {
                name: name.to_string(),
                message: format!("invalid {}: {}", MANIFEST, e),
            })
    }
}

impl PackageResolver for DirectoryPackageResolver {
    fn files(
        &self,
        name: &str,
    ) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(TranslateError::Package {
                name: name.to_string(),
                message: format!(
                    "could not be found in '{}'; ensure it is installed",
                    self.root.display()
                ),
            });
        }

        if let Some(manifest) = self.manifest(name, &dir)? {
            if !manifest.include.is_empty() {
                debug!("package '{}' includes {:?}", name, manifest.include);
                return Ok(manifest.include.iter().map(|f| dir.join(f)).collect());
            }
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION))
            .collect();
        files.sort();
        debug!("package '{}' has no include list, found {} files", name, files.len());
        Ok(files)
    }
}

/// Resolver for translations that must not load packages
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPackages;

impl PackageResolver for NoPackages {
    fn files(
        &self,
        name: &str,
    ) -> Result<Vec<PathBuf>> {
        Err(TranslateError::Package {
            name: name.to_string(),
            message: "packages are disabled".to_string(),
        })
    }
}
