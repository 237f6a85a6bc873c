//! External toolchains
//!
//! The translator stops at C source text. A [`Toolchain`] takes the finished
//! unit and produces an executable.

mod toolchain;

pub use toolchain::{ClangToolchain, Toolchain};
