//! Translation configuration
//!
//! Options that shape a translation run: which dialects are loaded up front,
//! where packages live, which types are dropped without a destructor call and
//! how the external toolchain is invoked.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Primitive scalar types that never receive a destructor call
pub const PRIMITIVE_SCALARS: &[&str] = &[
    "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "u128", "i128", "f32", "f64", "f128",
    "bool", "str",
];

/// Translation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Seed the symbol table with primitive operators and constructors
    #[serde(default = "default_true")]
    pub prelude: bool,

    /// Dialect files loaded before the first source file
    #[serde(default)]
    pub dialects: Vec<PathBuf>,

    /// Directory holding installed packages
    #[serde(default = "default_package_root")]
    pub package_root: PathBuf,

    /// Atomic types dropped silently at scope exit
    #[serde(default = "default_trivially_dropped")]
    pub trivially_dropped: Vec<String>,

    /// Warn when the finished unit has no `main`
    #[serde(default = "default_true")]
    pub emit_main_warning: bool,

    /// External compiler settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

fn default_true() -> bool {
    true
}

fn default_package_root() -> PathBuf {
    PathBuf::from("/usr/include/oak")
}

fn default_trivially_dropped() -> Vec<String> {
    PRIMITIVE_SCALARS.iter().map(|s| s.to_string()).collect()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            prelude: true,
            dialects: Vec::new(),
            package_root: default_package_root(),
            trivially_dropped: default_trivially_dropped(),
            emit_main_warning: true,
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl TranslateConfig {
    /// Create the default configuration
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the built-in prelude
    #[inline]
    pub fn without_prelude(mut self) -> Self {
        self.prelude = false;
        self
    }

    /// Add a dialect file to load before translation
    pub fn with_dialect(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.dialects.push(path.into());
        self
    }

    /// Whether values of the named atomic type need no destructor call
    pub fn is_trivially_dropped(
        &self,
        name: &str,
    ) -> bool {
        self.trivially_dropped.iter().any(|t| t == name)
    }
}

/// External compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// C compiler executable
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Extra flags passed to every invocation
    #[serde(default)]
    pub flags: Vec<String>,

    /// Directory for generated sources and objects
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_compiler() -> String {
    "clang".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".oak_build")
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            flags: Vec::new(),
            output_dir: default_output_dir(),
        }
    }
}
