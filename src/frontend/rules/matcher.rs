//! Pattern matching over token streams

use super::pattern::{is_slot, Pattern, PatternElem};
use crate::frontend::lexer::{is_line_marker, is_macro, tokenize, LexError};
use indexmap::IndexMap;
use std::fmt;

/// Successful match at the head of a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMatch {
    /// Tokens covered by the match, line markers included
    pub consumed: usize,
    /// Slot name (with `$`) → captured text
    pub captures: IndexMap<String, String>,
    /// Tokens remembered while matching
    pub memory: Vec<String>,
}

/// A pluggable matching strategy
pub trait Matcher: fmt::Debug {
    /// Try to match `pattern` against the head of `input`
    ///
    /// `prev` is the last real token before `input`.
    fn try_match(
        &self,
        pattern: &[String],
        input: &[String],
        prev: Option<&str>,
    ) -> Option<RuleMatch>;
}

struct Cursor<'a> {
    input: &'a [String],
    pos: usize,
    last: Option<&'a str>,
    memory: Vec<String>,
    captures: IndexMap<String, String>,
}

impl<'a> Cursor<'a> {
    fn new(
        input: &'a [String],
        prev: Option<&'a str>,
    ) -> Self {
        Self {
            input,
            pos: 0,
            last: prev,
            memory: Vec::new(),
            captures: IndexMap::new(),
        }
    }

    /// Index of the next real token
    fn peek_index(&self) -> Option<usize> {
        (self.pos..self.input.len()).find(|&i| !is_line_marker(&self.input[i]))
    }

    fn peek(&self) -> Option<&'a str> {
        self.peek_index().map(|i| self.input[i].as_str())
    }

    /// Consume the next real token; macro calls never match
    fn take(&mut self) -> Option<&'a str> {
        let i = self.peek_index()?;
        let token = self.input[i].as_str();
        if is_macro(token) {
            return None;
        }
        self.pos = i + 1;
        self.last = Some(token);
        self.memory.push(token.to_string());
        Some(token)
    }

    fn append(
        &mut self,
        slot: &str,
        text: &str,
    ) {
        let entry = self.captures.entry(slot.to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(text);
    }

    /// Consume up to (not including) `bound`, returning the tokens taken
    fn take_until(
        &mut self,
        bound: &str,
    ) -> Option<Vec<&'a str>> {
        let mut taken = Vec::new();
        loop {
            if self.peek()? == bound {
                return Some(taken);
            }
            taken.push(self.take()?);
        }
    }

    fn finish(self) -> RuleMatch {
        RuleMatch {
            consumed: self.pos,
            captures: self.captures,
            memory: self.memory,
        }
    }
}

fn literal_after(
    elems: &[PatternElem],
    k: usize,
) -> Option<&str> {
    match elems.get(k + 1) {
        Some(PatternElem::Literal(l)) => Some(l),
        _ => None,
    }
}

/// Match a compiled pattern at the head of `input`
pub fn match_pattern(
    pattern: &Pattern,
    input: &[String],
    prev: Option<&str>,
) -> Option<RuleMatch> {
    let elems = &pattern.elems;
    let mut cur = Cursor::new(input, prev);
    let mut retried_at: Vec<Option<usize>> = vec![None; elems.len()];
    let mut k = 0;

    while k < elems.len() {
        match &elems[k] {
            PatternElem::Literal(lit) => {
                if cur.take()? != lit {
                    return None;
                }
            }
            PatternElem::Wildcard => {
                cur.take()?;
            }
            PatternElem::Glob { required } => {
                let taken = cur.take_until(literal_after(elems, k)?)?;
                if *required && taken.is_empty() {
                    return None;
                }
            }
            PatternElem::Capture(name) => {
                let token = cur.take()?;
                cur.append(name, token);
            }
            PatternElem::NamedGlob(name) => {
                let taken = cur.take_until(literal_after(elems, k)?)?;
                for token in taken {
                    cur.append(name, token);
                }
            }
            PatternElem::MemoryReset => cur.memory.clear(),
            PatternElem::MemoryFlush(name) => {
                if !cur.memory.is_empty() {
                    let text = cur.memory.join(" ");
                    cur.append(name, &text);
                }
            }
            PatternElem::BacktrackUnless(lit) => {
                if cur.peek()? != lit {
                    // Each retry has to consume something
                    if retried_at[k] == Some(cur.pos) {
                        return None;
                    }
                    retried_at[k] = Some(cur.pos);
                    k -= 1;
                    continue;
                }
            }
            PatternElem::NotPrecededBy(lit) => {
                if cur.last == Some(lit.as_str()) {
                    return None;
                }
            }
            PatternElem::NotFollowedBy(lit) => {
                if cur.peek() == Some(lit.as_str()) {
                    return None;
                }
            }
            PatternElem::Suite(set) => {
                let token = cur.take()?;
                if !set.iter().any(|s| s == token) {
                    return None;
                }
            }
            PatternElem::NegatedSuite(set) => {
                let token = cur.take()?;
                if set.iter().any(|s| s == token) {
                    return None;
                }
            }
            PatternElem::BalancedPair { open, close } => {
                let mut depth: i64 = 0;
                let mut taken = 0usize;
                loop {
                    let token = cur.take()?;
                    taken += 1;
                    if token == open {
                        depth += 1;
                    } else if token == close {
                        depth -= 1;
                    }
                    if depth <= 0 {
                        break;
                    }
                }
                if depth != 0 || taken <= 1 {
                    return None;
                }
            }
        }
        k += 1;
    }

    Some(cur.finish())
}

/// Match tokens verbatim, no pattern operators
pub fn match_literal(
    pattern: &[String],
    input: &[String],
    prev: Option<&str>,
) -> Option<RuleMatch> {
    let mut cur = Cursor::new(input, prev);
    for lit in pattern {
        if cur.take()? != lit {
            return None;
        }
    }
    Some(cur.finish())
}

/// Instantiate an output pattern with captured slots
///
/// Slot text is re-tokenized. `$<` glues the following slot (or token) onto
/// the previous output token. A slot that captured nothing expands to nothing.
pub fn substitute(
    output: &[String],
    captures: &IndexMap<String, String>,
) -> Result<Vec<String>, LexError> {
    let lex = |text: &str| -> Result<Vec<String>, LexError> {
        Ok(tokenize(text)?
            .into_iter()
            .filter(|t| !is_line_marker(t))
            .collect())
    };

    let mut out: Vec<String> = Vec::new();
    let mut i = 0;
    while i < output.len() {
        let token = &output[i];
        if token == "$<" {
            let glued = match output.get(i + 1) {
                Some(next) => match captures.get(next) {
                    Some(text) => lex(text)?.concat(),
                    None if is_slot(next) => String::new(),
                    None => next.clone(),
                },
                None => String::new(),
            };
            match out.last_mut() {
                Some(last) => last.push_str(&glued),
                None if !glued.is_empty() => out.push(glued),
                None => {}
            }
            i += 2;
            continue;
        }

        if let Some(text) = captures.get(token) {
            out.extend(lex(text)?);
        } else if !is_slot(token) {
            out.push(token.clone());
        }
        i += 1;
    }
    Ok(out)
}
