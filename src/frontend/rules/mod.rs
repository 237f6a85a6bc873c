//! Rewrite engine
//!
//! Rules rewrite the token stream before sequencing. The stream is walked
//! once, left to right: at each position the rule-management directives are
//! handled first, then every dialect rule and every active rule is tried in
//! order. A match replaces its span with the instantiated output and the
//! remaining rules are tried at the same position, so fresh output can be
//! rewritten again.

mod dialect;
pub mod matcher;
pub mod pattern;

pub use dialect::DIALECT_RULE_PREFIX;
pub use matcher::{Matcher, RuleMatch};
pub use pattern::{Pattern, PatternElem};

use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::{is_line_marker, lex_pattern, parse_line_marker, unquote};
use crate::util::span::Location;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Name of the default engine
pub const DEFAULT_ENGINE: &str = "sapling";

/// Rule-management directives
pub const RULE_DIRECTIVES: &[&str] = &["new_rule!", "use_rule!", "rem_rule!", "bundle_rule!"];

/// Matching strategy selected by tag
#[derive(Debug, Clone)]
pub enum Engine {
    /// Full pattern language
    Sapling,
    /// Verbatim token sequences
    Literal,
    /// User-supplied matcher
    Custom(Arc<dyn Matcher>),
}

#[derive(Debug, Clone)]
enum RuleMatcher {
    Sapling(Pattern),
    Literal,
    Custom(Arc<dyn Matcher>),
}

/// A pattern → replacement transformation
#[derive(Debug, Clone)]
pub struct Rule {
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub engine: String,
    matcher: RuleMatcher,
}

impl Rule {
    /// Build a rule from lexed patterns
    pub fn new(
        input: Vec<String>,
        output: Vec<String>,
        engine_name: &str,
        engine: &Engine,
    ) -> std::result::Result<Self, String> {
        if input.is_empty() {
            return Err("input pattern must not be empty".to_string());
        }
        let matcher = match engine {
            Engine::Sapling => RuleMatcher::Sapling(Pattern::compile(&input)?),
            Engine::Literal => RuleMatcher::Literal,
            Engine::Custom(m) => RuleMatcher::Custom(Arc::clone(m)),
        };
        Ok(Self {
            input,
            output,
            engine: engine_name.to_string(),
            matcher,
        })
    }

    /// Try the rule at the head of `input`
    pub fn try_match(
        &self,
        input: &[String],
        prev: Option<&str>,
    ) -> Option<RuleMatch> {
        match &self.matcher {
            RuleMatcher::Sapling(pattern) => matcher::match_pattern(pattern, input, prev),
            RuleMatcher::Literal => matcher::match_literal(&self.input, input, prev),
            RuleMatcher::Custom(m) => m.try_match(&self.input, input, prev),
        }
    }

    /// Output tokens for a match
    pub fn replacement(
        &self,
        found: &RuleMatch,
    ) -> Result<Vec<String>> {
        match self.matcher {
            RuleMatcher::Literal => Ok(self.output.clone()),
            _ => Ok(matcher::substitute(&self.output, &found.captures)?),
        }
    }
}

/// Every rule, bundle and engine known to the run
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: IndexMap<String, Rule>,
    active: Vec<String>,
    dialect: Vec<String>,
    bundles: IndexMap<String, Vec<String>>,
    engines: IndexMap<String, Engine>,
    dialect_locked: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        let mut engines = IndexMap::new();
        engines.insert(DEFAULT_ENGINE.to_string(), Engine::Sapling);
        engines.insert("literal".to_string(), Engine::Literal);
        Self {
            rules: IndexMap::new(),
            active: Vec::new(),
            dialect: Vec::new(),
            bundles: IndexMap::new(),
            engines,
            dialect_locked: false,
        }
    }
}

fn rule_error(message: impl Into<String>) -> TranslateError {
    TranslateError::rule(message, Location::dummy())
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher under a tag
    pub fn register_engine(
        &mut self,
        name: &str,
        matcher: Arc<dyn Matcher>,
    ) {
        self.engines
            .insert(name.to_string(), Engine::Custom(matcher));
    }

    fn engine(
        &self,
        name: &str,
    ) -> Result<&Engine> {
        self.engines
            .get(name)
            .ok_or_else(|| rule_error(format!("unknown rule engine '{}'", name)))
    }

    /// `new_rule!(name, input, output [, engine])`
    pub fn define(
        &mut self,
        name: &str,
        input: &str,
        output: &str,
        engine: &str,
    ) -> Result<()> {
        let rule = self.build_rule(input, output, engine)?;
        debug!("defined rule '{}' ({} engine)", name, engine);
        self.rules.insert(name.to_string(), rule);
        Ok(())
    }

    fn build_rule(
        &self,
        input: &str,
        output: &str,
        engine: &str,
    ) -> Result<Rule> {
        let engine_impl = self.engine(engine)?;
        let input = lex_pattern(input).map_err(|e| rule_error(e.to_string()))?;
        let output = lex_pattern(output).map_err(|e| rule_error(e.to_string()))?;
        Rule::new(input, output, engine, engine_impl).map_err(rule_error)
    }

    /// `use_rule!(names...)`: bundles expand to their members
    pub fn activate(
        &mut self,
        names: &[String],
    ) -> Result<()> {
        if names.is_empty() {
            return Err(rule_error("use_rule! requires at least one argument"));
        }
        for name in names {
            if let Some(members) = self.bundles.get(name) {
                self.active.extend(members.iter().cloned());
            } else if self.rules.contains_key(name) {
                self.active.push(name.clone());
            } else {
                return Err(rule_error(format!(
                    "rule '{}' does not exist and is not a bundle",
                    name
                )));
            }
        }
        Ok(())
    }

    /// `rem_rule!(names...)`: no names clears the active list
    pub fn deactivate(
        &mut self,
        names: &[String],
    ) -> Result<()> {
        if names.is_empty() {
            self.active.clear();
            return Ok(());
        }
        for name in names {
            match self.active.iter().rposition(|n| n == name) {
                Some(i) => {
                    self.active.remove(i);
                }
                None => return Err(rule_error(format!("rule '{}' is not in use", name))),
            }
        }
        Ok(())
    }

    /// `bundle_rule!(bundle, members...)`
    pub fn bundle(
        &mut self,
        name: &str,
        members: &[String],
    ) -> Result<()> {
        if members.is_empty() {
            return Err(rule_error("bundle_rule! requires at least two arguments"));
        }
        self.bundles
            .entry(name.to_string())
            .or_default()
            .extend(members.iter().cloned());
        Ok(())
    }

    pub fn rule(
        &self,
        name: &str,
    ) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn dialect_rules(&self) -> &[String] {
        &self.dialect
    }

    pub fn is_dialect_locked(&self) -> bool {
        self.dialect_locked
    }

    /// Rewrite a token stream
    pub fn apply(
        &mut self,
        tokens: Vec<String>,
        location: &mut Location,
    ) -> Result<Vec<String>> {
        let mut pending: VecDeque<String> = tokens.into();
        let mut out: Vec<String> = Vec::with_capacity(pending.len());

        while let Some(front) = pending.front() {
            if let Some(line) = parse_line_marker(front) {
                location.line = line;
                out.extend(pending.pop_front());
                continue;
            }

            if RULE_DIRECTIVES.contains(&front.as_str()) {
                let directive = pending.pop_front().unwrap_or_default();
                let args = directive_args(&directive, &mut pending, &mut out)
                    .map_err(|e| e.or_at(location))?;
                self.run_directive(&directive, &args)
                    .map_err(|e| e.or_at(location))?;
                continue;
            }

            self.rewrite_here(&mut pending, &mut out, location)?;
            out.extend(pending.pop_front());
        }

        Ok(out)
    }

    /// Try each dialect and active rule once at the head of `pending`
    fn rewrite_here(
        &self,
        pending: &mut VecDeque<String>,
        out: &mut Vec<String>,
        location: &Location,
    ) -> Result<()> {
        let names: Vec<&String> = self.dialect.iter().chain(self.active.iter()).collect();
        for name in names {
            let Some(rule) = self.rules.get(name) else {
                continue;
            };
            if pending.is_empty() {
                break;
            }
            let prev = out.iter().rev().find(|t| !is_line_marker(t)).cloned();
            let found = {
                let head = pending.make_contiguous();
                rule.try_match(head, prev.as_deref())
            };
            let Some(found) = found else {
                continue;
            };
            // An empty match would rewrite the same position forever
            if found.consumed == 0 {
                continue;
            }

            let replacement = rule.replacement(&found).map_err(|e| e.or_at(location))?;
            debug!(
                "rule '{}' rewrote {} tokens into {}",
                name,
                found.consumed,
                replacement.len()
            );
            for token in pending.drain(..found.consumed) {
                if is_line_marker(&token) {
                    out.push(token);
                }
            }
            for token in replacement.into_iter().rev() {
                pending.push_front(token);
            }
        }
        Ok(())
    }

    fn run_directive(
        &mut self,
        directive: &str,
        args: &[String],
    ) -> Result<()> {
        match directive {
            "new_rule!" => match args {
                [name, input, output] => self.define(name, input, output, DEFAULT_ENGINE),
                [name, input, output, engine] => self.define(name, input, output, engine),
                _ => Err(rule_error("new_rule! requires three or four arguments")),
            },
            "use_rule!" => self.activate(args),
            "rem_rule!" => self.deactivate(args),
            "bundle_rule!" => match args.split_first() {
                Some((name, members)) => self.bundle(name, members),
                None => Err(rule_error("bundle_rule! requires at least two arguments")),
            },
            other => Err(rule_error(format!("unknown rule directive '{}'", other))),
        }
    }
}

/// Parse `( "a", "b" ) ;?` after a directive; every argument must be a string
fn directive_args(
    directive: &str,
    pending: &mut VecDeque<String>,
    out: &mut Vec<String>,
) -> Result<Vec<String>> {
    while pending.front().is_some_and(|t| is_line_marker(t)) {
        out.extend(pending.pop_front());
    }
    if pending.pop_front().as_deref() != Some("(") {
        return Err(rule_error(format!("'{}' must be followed by '('", directive)));
    }

    let mut args: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut depth = 1usize;
    loop {
        let Some(token) = pending.pop_front() else {
            return Err(rule_error(format!("unterminated '{}'", directive)));
        };
        if is_line_marker(&token) {
            out.push(token);
            continue;
        }
        match token.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    if !current.is_empty() || !args.is_empty() {
                        args.push(current);
                    }
                    break;
                }
            }
            "," if depth == 1 => {
                args.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(token);
    }
    if pending.front().is_some_and(|t| t == ";") {
        pending.pop_front();
    }

    args.into_iter()
        .map(|arg| match arg.as_slice() {
            [single] if crate::frontend::lexer::is_quoted(single) => Ok(unquote(single)),
            _ => Err(rule_error(format!(
                "all arguments to '{}' must be strings",
                directive
            ))),
        })
        .collect()
}
