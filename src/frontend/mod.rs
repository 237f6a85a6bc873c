//! Translation front-end
//!
//! Every source file runs through the same pipeline:
//!
//! 1. lexing into string tokens with line markers
//! 2. compiler directives (`include!`, `package!`, `link!`)
//! 3. user macro expansion
//! 4. rewrite rules, including the rule-management directives
//! 5. sequencing, which desugars operators per expression and builds the
//!    typed [`Sequence`](sequence::Sequence) trees
//!
//! The accumulated context is rendered as one C translation unit by
//! [`Translator::finish`].

pub mod config;
pub mod context;
pub mod desugar;
pub mod error;
pub mod lexer;
pub mod module;
pub mod prelude;
pub mod rules;
pub mod sequence;
pub mod symbols;
pub mod types;

use crate::middle::codegen::emit_unit;
use crate::util::span::Location;
use config::TranslateConfig;
use context::CompilationContext;
use error::{Result, TranslateError};
use lexer::{parse_line_marker, unquote};
use module::{
    expand_macros, DirectoryPackageResolver, MacroEvaluator, NoMacros, PackageResolver,
};
use sequence::{Sequence, SequenceBuilder};
use serde::Serialize;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;
use tracing::{debug, info};

type Tokens = Peekable<IntoIter<String>>;

/// Drives translation of one or more source files into a single C unit
pub struct Translator {
    ctx: CompilationContext,
    packages: Box<dyn PackageResolver>,
    macros: Box<dyn MacroEvaluator>,
    /// Directories of the files being translated, innermost last
    dirs: Vec<PathBuf>,
}

/// Snapshot written by `--dump`
#[derive(Serialize)]
struct Dump<'a> {
    sequences: &'a [Sequence],
    symbols: &'a symbols::SymbolTable,
    structs: &'a symbols::StructTable,
    templates: &'a crate::middle::monomorphize::TemplateTable,
    active_rules: &'a [String],
    links: &'a [String],
}

impl Translator {
    /// Create a translator and load the configured dialects
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let packages = DirectoryPackageResolver::new(config.package_root.clone());
        let dialects = config.dialects.clone();
        let mut translator = Self {
            ctx: CompilationContext::new(config),
            packages: Box::new(packages),
            macros: Box::new(NoMacros),
            dirs: Vec::new(),
        };
        for dialect in &dialects {
            translator.load_dialect(dialect)?;
        }
        Ok(translator)
    }

    /// Replace the package resolver
    pub fn with_packages(
        mut self,
        packages: impl PackageResolver + 'static,
    ) -> Self {
        self.packages = Box::new(packages);
        self
    }

    /// Replace the user macro evaluator
    pub fn with_macros(
        mut self,
        macros: impl MacroEvaluator + 'static,
    ) -> Self {
        self.macros = Box::new(macros);
        self
    }

    pub fn context(&self) -> &CompilationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut CompilationContext {
        &mut self.ctx
    }

    /// Objects requested by `link!`, in request order
    pub fn links(&self) -> &[String] {
        &self.ctx.links
    }

    pub fn load_dialect(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        self.ctx.rules.load_dialect(path.as_ref())
    }

    /// Translate a file; files already translated are skipped
    pub fn translate_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.ctx.visited.insert(key) {
            debug!("skipping '{}': already translated", path.display());
            return Ok(());
        }

        let source =
            std::fs::read_to_string(path).map_err(|e| TranslateError::io(path, e))?;
        self.dirs
            .push(path.parent().map(Path::to_path_buf).unwrap_or_default());
        let result = self.translate_source(&path.display().to_string(), &source);
        self.dirs.pop();
        result
    }

    /// Translate in-memory source; `name` is used for diagnostics
    pub fn translate_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<()> {
        let saved = std::mem::replace(&mut self.ctx.location, Location::new(name));
        let result = self.pipeline(source);
        self.ctx.location = saved;
        if result.is_ok() {
            info!("translated '{}'", name);
        }
        result
    }

    fn pipeline(
        &mut self,
        source: &str,
    ) -> Result<()> {
        let here = self.ctx.here();
        let tokens = lexer::tokenize(source).map_err(|e| TranslateError::from(e).or_at(&here))?;
        debug!("lexed {} tokens", tokens.len());

        let tokens = self.directives(tokens)?;
        let tokens = expand_macros(tokens, self.macros.as_mut())?;

        self.ctx.location.line = 1;
        let tokens = self.ctx.rules.apply(tokens, &mut self.ctx.location)?;

        self.ctx.location.line = 1;
        let sequences = SequenceBuilder::new(&mut self.ctx, &tokens).build_all()?;
        self.ctx.sequences.extend(sequences);
        Ok(())
    }

    /// Run `include!`, `package!` and `link!`, removing them from the stream
    fn directives(
        &mut self,
        tokens: Vec<String>,
    ) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut iter: Tokens = tokens.into_iter().peekable();

        while let Some(token) = iter.next() {
            if let Some(line) = parse_line_marker(&token) {
                self.ctx.location.line = line;
                out.push(token);
                continue;
            }
            if !matches!(token.as_str(), "include!" | "package!" | "link!") {
                out.push(token);
                continue;
            }

            for arg in self.directive_args(&token, &mut iter)? {
                match token.as_str() {
                    "include!" => self.include(&arg)?,
                    "package!" => {
                        let here = self.ctx.here();
                        for file in self.packages.files(&arg)? {
                            self.translate_file(&file).map_err(|e| e.or_at(&here))?;
                        }
                    }
                    _ => {
                        debug!("linking '{}'", arg);
                        self.ctx.links.push(arg);
                    }
                }
            }
        }
        Ok(out)
    }

    /// `( "a" , "b" ) ;?`
    fn directive_args(
        &mut self,
        directive: &str,
        iter: &mut Tokens,
    ) -> Result<Vec<String>> {
        if iter.next().as_deref() != Some("(") {
            return Err(self
                .ctx
                .parse_error(format!("'{}' must be followed by '('", directive)));
        }
        let mut args = Vec::new();
        loop {
            match iter.next() {
                Some(token) if token == ")" => break,
                Some(token) if token == "," => continue,
                Some(token) if lexer::is_quoted(&token) => args.push(unquote(&token)),
                Some(token) if parse_line_marker(&token).is_some() => continue,
                _ => {
                    return Err(self.ctx.parse_error(format!(
                        "all arguments to '{}' must be strings",
                        directive
                    )))
                }
            }
        }
        if iter.peek().is_some_and(|t| t == ";") {
            iter.next();
        }
        Ok(args)
    }

    fn include(
        &mut self,
        file: &str,
    ) -> Result<()> {
        let path = Path::new(file);
        let path = match self.dirs.last() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        let here = self.ctx.here();
        self.translate_file(&path).map_err(|e| e.or_at(&here))
    }

    /// The complete C translation unit for everything translated so far
    pub fn finish(&self) -> String {
        emit_unit(&self.ctx)
    }

    /// Sequences, symbols, structs and templates as pretty JSON
    pub fn dump(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Dump {
            sequences: &self.ctx.sequences,
            symbols: &self.ctx.symbols,
            structs: &self.ctx.structs,
            templates: &self.ctx.templates,
            active_rules: self.ctx.rules.active(),
            links: &self.ctx.links,
        })
    }
}
