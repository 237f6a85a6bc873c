//! Template instantiation and C emission
//!
//! The front-end hands over a populated
//! [`CompilationContext`](crate::frontend::context::CompilationContext);
//! this layer instantiates generics on demand and renders the final unit.

pub mod codegen;
pub mod monomorphize;
