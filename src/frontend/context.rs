//! Compilation context
//!
//! All state shared by one translation run lives here and is passed by
//! reference through the builder, the template instantiator and the code
//! emitter: symbols, structs, rules, templates and the diagnostics location.

use crate::frontend::config::TranslateConfig;
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::prelude;
use crate::frontend::rules::RuleSet;
use crate::frontend::sequence::Sequence;
use crate::frontend::symbols::{lifecycle_signature, Snapshot, StructTable, SymbolTable};
use crate::frontend::types::{GenericResolver, Type};
use crate::middle::monomorphize::{self, TemplateTable};
use crate::util::span::Location;
use std::collections::HashSet;
use std::path::PathBuf;

/// Shared translation state
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub config: TranslateConfig,
    pub symbols: SymbolTable,
    pub structs: StructTable,
    pub rules: RuleSet,
    pub templates: TemplateTable,
    /// Current file, line and statement
    pub location: Location,
    /// Set while sequencing the body of an operator-overload method
    pub inside_method: bool,
    /// Mangled names of every function the output calls
    pub referenced: HashSet<String>,
    /// Objects requested by `link!`
    pub links: Vec<String>,
    /// Files already translated
    pub visited: HashSet<PathBuf>,
    /// Top-level sequences in translation order
    pub sequences: Vec<Sequence>,
}

impl CompilationContext {
    /// Fresh context, seeded with the prelude unless the config disables it
    pub fn new(config: TranslateConfig) -> Self {
        let mut ctx = Self {
            config,
            ..Default::default()
        };
        if ctx.config.prelude {
            prelude::install(&mut ctx.symbols);
        }
        ctx
    }

    /// Current location with the statement text attached
    pub fn here(&self) -> Location {
        self.location.clone()
    }

    pub fn sequencing_error(
        &self,
        message: impl Into<String>,
    ) -> TranslateError {
        TranslateError::sequencing(message, self.here())
    }

    pub fn type_error(
        &self,
        message: impl Into<String>,
    ) -> TranslateError {
        TranslateError::type_error(message, self.here())
    }

    pub fn parse_error(
        &self,
        message: impl Into<String>,
    ) -> TranslateError {
        TranslateError::parse(message, self.here())
    }

    /// Whether dropping a value of this type requires a `Del` call
    pub fn needs_destructor(
        &self,
        ty: &Type,
    ) -> bool {
        needs_destructor(&self.config, &self.destructible(), ty)
    }

    /// Types that currently have a `Del` overload
    fn destructible(&self) -> Vec<Type> {
        self.symbols
            .visible("Del")
            .map(|c| c.ty.clone())
            .collect()
    }

    /// Leave a scope, returning the teardown calls for dropped bindings
    pub fn close_scope(
        &mut self,
        snapshot: Snapshot,
    ) -> Vec<String> {
        let destructible = self.destructible();
        let config = &self.config;
        self.symbols
            .restore(snapshot, |ty| needs_destructor(config, &destructible, ty))
    }
}

fn needs_destructor(
    config: &TranslateConfig,
    destructible: &[Type],
    ty: &Type,
) -> bool {
    match ty.atomic_name() {
        Some(name) if !config.is_trivially_dropped(name) => {
            let signature = lifecycle_signature(ty);
            destructible.iter().any(|t| t == &signature)
        }
        _ => false,
    }
}

impl GenericResolver for CompilationContext {
    fn instantiate_struct(
        &mut self,
        name: &str,
        actuals: &[Vec<String>],
    ) -> Result<String> {
        monomorphize::instantiate_struct(self, name, actuals)
    }
}
