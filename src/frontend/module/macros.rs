//! User macro expansion
//!
//! Any `name!( ... )` call that the translator does not handle itself is
//! handed to a [`MacroEvaluator`]. The returned source text is lexed and
//! spliced in place of the call.

use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::{is_line_marker, is_macro, tokenize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Macros consumed by the translator itself
pub const COMPILER_MACROS: &[&str] = &[
    "include!",
    "link!",
    "package!",
    "alloc!",
    "free!",
    "free_arr!",
    "new_rule!",
    "use_rule!",
    "rem_rule!",
    "bundle_rule!",
    "erase!",
];

pub fn is_compiler_macro(name: &str) -> bool {
    COMPILER_MACROS.contains(&name)
}

/// Runs a user macro
pub trait MacroEvaluator {
    /// Source text produced by `name!(args...)`; each argument is its
    /// tokens joined by spaces
    fn evaluate(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<String>;
}

/// Rejects every macro call
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMacros;

impl MacroEvaluator for NoMacros {
    fn evaluate(
        &mut self,
        name: &str,
        _args: &[String],
    ) -> Result<String> {
        Err(TranslateError::Macro {
            name: name.to_string(),
            message: "no macro evaluator is configured".to_string(),
        })
    }
}

type MacroFn = Box<dyn Fn(&[String]) -> Result<String>>;

/// Macros implemented as Rust closures
#[derive(Default)]
pub struct FnMacroEvaluator {
    macros: HashMap<String, MacroFn>,
}

impl FnMacroEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name!`; the trailing `!` is optional
    pub fn register(
        mut self,
        name: &str,
        body: impl Fn(&[String]) -> Result<String> + 'static,
    ) -> Self {
        let name = if name.ends_with('!') {
            name.to_string()
        } else {
            format!("{}!", name)
        };
        self.macros.insert(name, Box::new(body));
        self
    }
}

impl fmt::Debug for FnMacroEvaluator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FnMacroEvaluator")
            .field("macros", &self.macros.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MacroEvaluator for FnMacroEvaluator {
    fn evaluate(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<String> {
        match self.macros.get(name) {
            Some(body) => body(args),
            None => Err(TranslateError::Macro {
                name: name.to_string(),
                message: "undefined macro".to_string(),
            }),
        }
    }
}

/// Memoises another evaluator by name and arguments for one run
#[derive(Debug)]
pub struct CachedMacroEvaluator<E> {
    inner: E,
    cache: HashMap<(String, Vec<String>), String>,
}

impl<E: MacroEvaluator> CachedMacroEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    /// Number of distinct calls evaluated so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl<E: MacroEvaluator> MacroEvaluator for CachedMacroEvaluator<E> {
    fn evaluate(
        &mut self,
        name: &str,
        args: &[String],
    ) -> Result<String> {
        let key = (name.to_string(), args.to_vec());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let text = self.inner.evaluate(name, args)?;
        self.cache.insert(key, text.clone());
        Ok(text)
    }
}

/// Replace every user macro call with its lexed expansion
///
/// Expansions are not rescanned.
pub fn expand_macros(
    tokens: Vec<String>,
    evaluator: &mut dyn MacroEvaluator,
) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if !is_macro(&token) || is_compiler_macro(&token) {
            out.push(token);
            continue;
        }
        if iter.peek().map(String::as_str) != Some("(") {
            return Err(TranslateError::Macro {
                name: token,
                message: "macro calls must be followed by '('".to_string(),
            });
        }
        iter.next();

        let mut args: Vec<Vec<String>> = Vec::new();
        let mut current = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(arg) = iter.next() else {
                return Err(TranslateError::Macro {
                    name: token,
                    message: "unterminated call".to_string(),
                });
            };
            if is_line_marker(&arg) {
                out.push(arg);
                continue;
            }
            match arg.as_str() {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                "," if depth == 1 => {
                    args.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
            current.push(arg);
        }
        if !current.is_empty() || !args.is_empty() {
            args.push(current);
        }

        let args: Vec<String> = args.iter().map(|a| a.join(" ")).collect();
        let text = evaluator.evaluate(&token, &args)?;
        let expansion = tokenize(&text)?;
        debug!("expanded '{}' into {} tokens", token, expansion.len());
        out.extend(expansion.into_iter().filter(|t| !is_line_marker(t)));
    }
    Ok(out)
}
