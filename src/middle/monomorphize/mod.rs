//! Template instantiation
//!
//! Generic functions and structs are stored as raw token bodies and only
//! sequenced once concrete types arrive. Instantiation substitutes every
//! generic name in the body with the actual's tokens, then hands the result
//! to the ordinary struct or function path.
//!
//! Instances are memoised by their concrete identity: a function by its full
//! signature in the symbol table, a struct by its canonical name
//! (`List<i32>` becomes `List__i32_`).

use crate::frontend::context::CompilationContext;
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::sequence::{define_struct, SequenceBuilder};
use crate::frontend::symbols::StructData;
use crate::frontend::types::{canonical_name, parse_type, parse_type_tokens, Type};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Stored generic function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTemplate {
    pub generics: Vec<String>,
    /// `let name ( signature ) { body }`
    pub body: Vec<String>,
}

/// Stored generic struct
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructTemplate {
    pub generics: Vec<String>,
    /// Member tokens between the braces
    pub body: Vec<String>,
}

/// Templates by name; one name may carry several arities
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateTable {
    functions: IndexMap<String, Vec<FunctionTemplate>>,
    structs: IndexMap<String, Vec<StructTemplate>>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(
        &mut self,
        name: &str,
        template: FunctionTemplate,
    ) {
        self.functions
            .entry(name.to_string())
            .or_default()
            .push(template);
    }

    pub fn add_struct(
        &mut self,
        name: &str,
        template: StructTemplate,
    ) {
        self.structs
            .entry(name.to_string())
            .or_default()
            .push(template);
    }

    /// Latest function template taking `arity` generics
    pub fn function(
        &self,
        name: &str,
        arity: usize,
    ) -> Option<&FunctionTemplate> {
        self.functions
            .get(name)?
            .iter()
            .rev()
            .find(|t| t.generics.len() == arity)
    }

    /// Latest struct template taking `arity` generics
    pub fn structure(
        &self,
        name: &str,
        arity: usize,
    ) -> Option<&StructTemplate> {
        self.structs
            .get(name)?
            .iter()
            .rev()
            .find(|t| t.generics.len() == arity)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.functions.contains_key(name) || self.structs.contains_key(name)
    }
}

/// Replace every generic name with the tokens of its actual
pub fn substitute(
    body: &[String],
    generics: &[String],
    actuals: &[Vec<String>],
) -> Vec<String> {
    let mut out = Vec::with_capacity(body.len());
    for token in body {
        match generics.iter().position(|g| g == token) {
            Some(i) => out.extend(actuals[i].iter().cloned()),
            None => out.push(token.clone()),
        }
    }
    out
}

/// `name<actuals>` in an expression: a function template if one matches,
/// otherwise a struct template
pub fn instantiate(
    ctx: &mut CompilationContext,
    name: &str,
    actuals: &[Vec<String>],
) -> Result<()> {
    if ctx.templates.function(name, actuals.len()).is_some() {
        instantiate_function(ctx, name, actuals)?;
        return Ok(());
    }
    if ctx.templates.structure(name, actuals.len()).is_some() {
        instantiate_struct(ctx, name, actuals)?;
        return Ok(());
    }
    Err(no_template(ctx, name, actuals.len()))
}

fn no_template(
    ctx: &CompilationContext,
    name: &str,
    arity: usize,
) -> TranslateError {
    if ctx.templates.contains(name) {
        ctx.sequencing_error(format!(
            "no template '{}' with matching generic arity {}",
            name, arity
        ))
    } else {
        ctx.sequencing_error(format!("undefined template '{}'", name))
    }
}

/// Sequence the function body for these actuals, returning its signature
/// (`None` when no function template matches)
pub fn instantiate_function(
    ctx: &mut CompilationContext,
    name: &str,
    actuals: &[Vec<String>],
) -> Result<Option<Type>> {
    let Some(template) = ctx.templates.function(name, actuals.len()).cloned() else {
        return Ok(None);
    };
    let body = substitute(&template.body, &template.generics, actuals);

    let here = ctx.here();
    let mut pos = 2;
    let signature = parse_type(&body, &mut pos, &mut *ctx).map_err(|e| e.or_at(&here))?;
    if !signature.is_function() {
        return Err(ctx.parse_error(format!("malformed generic signature for '{}'", name)));
    }

    if ctx.symbols.has_overload(name, &signature) {
        warn!(
            "redundant instantiation of '{}<{}>'",
            name,
            render_actuals(actuals)
        );
        return Ok(Some(signature));
    }

    debug!("instantiating '{}<{}>'", name, render_actuals(actuals));
    let saved = ctx.here();
    let sequences = SequenceBuilder::new(ctx, &body).build_all();
    ctx.location = saved;
    sequences?;
    Ok(Some(signature))
}

/// Define the struct for these actuals, returning its canonical name
pub fn instantiate_struct(
    ctx: &mut CompilationContext,
    name: &str,
    actuals: &[Vec<String>],
) -> Result<String> {
    let mut types = Vec::with_capacity(actuals.len());
    for actual in actuals {
        let here = ctx.here();
        types.push(parse_type_tokens(actual, &mut *ctx).map_err(|e| e.or_at(&here))?);
    }
    let canonical = canonical_name(name, &types);
    if ctx.structs.contains(&canonical) {
        return Ok(canonical);
    }

    let Some(template) = ctx.templates.structure(name, actuals.len()).cloned() else {
        return Err(no_template(ctx, name, actuals.len()));
    };
    debug!("instantiating struct '{}' as '{}'", name, canonical);

    // Reserved first so members may point back at the instance
    ctx.structs.define(&canonical, StructData::default());
    let body = substitute(&template.body, &template.generics, actuals);
    define_struct(ctx, &canonical, &body)?;
    Ok(canonical)
}

fn render_actuals(actuals: &[Vec<String>]) -> String {
    actuals
        .iter()
        .map(|a| a.join(" "))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
