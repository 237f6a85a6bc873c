//! Rule pattern compilation
//!
//! | Pattern          | Meaning                                             |
//! |------------------|-----------------------------------------------------|
//! | `lit`            | token must match verbatim                           |
//! | `$$`             | any one token, discarded                            |
//! | `$*` / `$+`      | zero-or-more / one-or-more tokens up to next literal |
//! | `$X`             | one token captured into `$X`                        |
//! | `$*X`            | tokens up to next literal captured into `$X`        |
//! | `$~`             | clear memory                                        |
//! | `$>X`            | append memory to `$X`                               |
//! | `$-lit`          | retry the previous element unless token is `lit`    |
//! | `$/<$lit`        | previous token is not `lit`                         |
//! | `$/>$lit`        | next token is not `lit`                             |
//! | `$[$a$b$]`       | one token out of a set                              |
//! | `$/[$a$b$]`      | one token outside a set                             |
//! | `$<$open$close$>`| balanced run from `open` to its `close`             |
//!
//! Each operator may also be written with spaces between its parts
//! (`$<$ ( $ ) $>`, `$[$ a $ b $]`, `$- ;`, `$> $X`).

use crate::frontend::lexer::is_identifier;
use smallvec::SmallVec;

/// Literal set of a suite
pub type Suite = SmallVec<[String; 4]>;

/// One compiled pattern element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElem {
    Literal(String),
    Wildcard,
    Glob { required: bool },
    Capture(String),
    NamedGlob(String),
    MemoryReset,
    MemoryFlush(String),
    BacktrackUnless(String),
    NotPrecededBy(String),
    NotFollowedBy(String),
    Suite(Suite),
    NegatedSuite(Suite),
    BalancedPair { open: String, close: String },
}

impl PatternElem {
    /// Whether a match of this element can advance past a token
    pub fn consumes(&self) -> bool {
        !matches!(
            self,
            PatternElem::MemoryReset
                | PatternElem::MemoryFlush(_)
                | PatternElem::NotPrecededBy(_)
                | PatternElem::NotFollowedBy(_)
        )
    }
}

/// Compiled input pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub elems: Vec<PatternElem>,
}

/// Whether an output token names a capture slot
pub fn is_slot(token: &str) -> bool {
    token
        .strip_prefix('$')
        .is_some_and(|rest| is_identifier(rest))
}

fn slot(name: &str) -> String {
    format!("${}", name)
}

struct Compiler<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Compiler<'a> {
    fn next_operand(
        &mut self,
        op: &str,
    ) -> Result<String, String> {
        self.pos += 1;
        self.tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| format!("'{}' needs an operand", op))
    }

    /// Spaced set `a $ b $ c $]`, starting after the opener
    fn spaced_set(
        &mut self,
        op: &str,
    ) -> Result<Suite, String> {
        let mut set = Suite::new();
        loop {
            self.pos += 1;
            match self.tokens.get(self.pos).map(String::as_str) {
                Some("$]") => return Ok(set),
                Some("$") => {}
                Some(t) => set.push(t.to_string()),
                None => return Err(format!("unterminated '{}'", op)),
            }
        }
    }

    fn elem(
        &mut self,
        token: &str,
    ) -> Result<PatternElem, String> {
        let elem = match token {
            "$$" => PatternElem::Wildcard,
            "$*" => PatternElem::Glob { required: false },
            "$+" => PatternElem::Glob { required: true },
            "$~" => PatternElem::MemoryReset,
            "$>" => {
                let target = self.next_operand(token)?;
                if !is_slot(&target) {
                    return Err(format!("'$>' must name a slot, found '{}'", target));
                }
                PatternElem::MemoryFlush(target)
            }
            "$-" => PatternElem::BacktrackUnless(self.next_operand(token)?),
            "$/<$" => PatternElem::NotPrecededBy(self.next_operand(token)?),
            "$/>$" => PatternElem::NotFollowedBy(self.next_operand(token)?),
            "$[$" => PatternElem::Suite(self.spaced_set(token)?),
            "$/[$" => PatternElem::NegatedSuite(self.spaced_set(token)?),
            "$<$" => {
                let open = self.next_operand(token)?;
                let sep = self.next_operand(token)?;
                let close = self.next_operand(token)?;
                let end = self.next_operand(token)?;
                if sep != "$" || end != "$>" {
                    return Err("expected '$<$ open $ close $>'".to_string());
                }
                PatternElem::BalancedPair { open, close }
            }
            t if t.starts_with("$<$") && t.ends_with("$>") && t.len() > 5 => {
                let parts = split_set(&t[3..t.len() - 2]);
                match parts.as_slice() {
                    [open, close] => PatternElem::BalancedPair {
                        open: open.clone(),
                        close: close.clone(),
                    },
                    _ => return Err(format!("malformed pair pattern '{}'", t)),
                }
            }
            t if t.starts_with("$/[$") && t.ends_with("$]") => {
                PatternElem::NegatedSuite(split_set(&t[4..t.len() - 2]).into_iter().collect())
            }
            t if t.starts_with("$[$") && t.ends_with("$]") => {
                PatternElem::Suite(split_set(&t[3..t.len() - 2]).into_iter().collect())
            }
            t if t.starts_with("$/<$") => PatternElem::NotPrecededBy(t[4..].to_string()),
            t if t.starts_with("$/>$") => PatternElem::NotFollowedBy(t[4..].to_string()),
            t if t.starts_with("$-") => PatternElem::BacktrackUnless(t[2..].to_string()),
            t if t.starts_with("$>") && is_identifier(&t[2..]) => {
                PatternElem::MemoryFlush(slot(&t[2..]))
            }
            t if t.starts_with("$*") && is_identifier(&t[2..]) => {
                PatternElem::NamedGlob(slot(&t[2..]))
            }
            t if is_slot(t) => PatternElem::Capture(t.to_string()),
            t if t.starts_with('$') => return Err(format!("unknown pattern operator '{}'", t)),
            t => PatternElem::Literal(t.to_string()),
        };
        Ok(elem)
    }
}

fn split_set(inner: &str) -> Vec<String> {
    inner
        .split('$')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Pattern {
    /// Compile lexed pattern tokens
    pub fn compile(tokens: &[String]) -> Result<Self, String> {
        if tokens.is_empty() {
            return Err("input pattern must not be empty".to_string());
        }

        let mut compiler = Compiler { tokens, pos: 0 };
        let mut elems = Vec::new();
        while compiler.pos < tokens.len() {
            let token = tokens[compiler.pos].clone();
            elems.push(compiler.elem(&token)?);
            compiler.pos += 1;
        }

        for (i, elem) in elems.iter().enumerate() {
            if matches!(elem, PatternElem::Glob { .. } | PatternElem::NamedGlob(_))
                && !matches!(elems.get(i + 1), Some(PatternElem::Literal(_)))
            {
                return Err("a glob must be followed by a literal".to_string());
            }
            if matches!(elem, PatternElem::BacktrackUnless(_)) && i == 0 {
                return Err("'$-' needs a preceding element".to_string());
            }
        }
        if !elems.iter().any(PatternElem::consumes) {
            return Err("input pattern must consume at least one token".to_string());
        }

        Ok(Self { elems })
    }
}
