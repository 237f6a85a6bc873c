//! Sequence builder
//!
//! Turns a rewritten token stream into typed [`Sequence`] trees, parsing and
//! inferring types in one left-to-right pass. Every statement is dispatched
//! on its leading token:
//!
//! | Token                         | Statement                                  |
//! |-------------------------------|--------------------------------------------|
//! | `;`                           | nothing                                    |
//! | `erase!`                      | hide symbols or structs                    |
//! | `alloc!` `free!` `free_arr!`  | raw memory, operator methods only          |
//! | `if` `while`                  | condition then body                        |
//! | `else`                        | body, checked against the previous sibling |
//! | `let`                         | struct, variable, function or template     |
//! | `{`                           | nested scope                               |
//! | anything else                 | expression                                 |

mod definitions;
mod literal;
mod resolve;

pub(crate) use definitions::define_struct;
pub use literal::infer_literal;
pub use resolve::Resolved;

use crate::frontend::context::CompilationContext;
use crate::frontend::error::Result;
use crate::frontend::lexer::{is_quoted, parse_line_marker, unquote};
use crate::frontend::prelude::is_integer;
use crate::frontend::types::Type;
use crate::middle::codegen::c_type;
use serde::Serialize;
use tracing::{debug, warn};

/// Control keyword held by a [`Sequence::Keyword`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    If,
    While,
    Else,
}

impl KeywordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeywordKind::If => "if",
            KeywordKind::While => "while",
            KeywordKind::Else => "else",
        }
    }
}

/// Typed tree produced by the builder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Sequence {
    /// Lexical block; `teardown` holds the destructor calls run on exit
    Scope {
        items: Vec<Sequence>,
        teardown: Vec<String>,
    },
    /// Flattened expression
    Line { items: Vec<Sequence>, ty: Type },
    /// Leaf with its C text
    Atom { ty: Type, text: String },
    /// `if` and `while` hold condition and body, `else` holds its body
    Keyword {
        kind: KeywordKind,
        children: Vec<Sequence>,
    },
}

impl Sequence {
    pub fn atom(
        ty: Type,
        text: impl Into<String>,
    ) -> Self {
        Sequence::Atom {
            ty,
            text: text.into(),
        }
    }

    /// Type of the value the sequence yields
    pub fn ty(&self) -> Type {
        match self {
            Sequence::Line { ty, .. } | Sequence::Atom { ty, .. } => ty.clone(),
            Sequence::Scope { .. } | Sequence::Keyword { .. } => Type::null(),
        }
    }

    pub fn is_keyword(
        &self,
        kind: KeywordKind,
    ) -> bool {
        matches!(self, Sequence::Keyword { kind: k, .. } if *k == kind)
    }

    /// A statement followed by `;` yields nothing
    fn discard_type(&mut self) {
        match self {
            Sequence::Line { ty, .. } | Sequence::Atom { ty, .. } => *ty = Type::null(),
            _ => {}
        }
    }

    /// `else` may follow `if`, or an `else` whose body is an `if`
    fn accepts_else(&self) -> bool {
        match self {
            Sequence::Keyword {
                kind: KeywordKind::If,
                ..
            } => true,
            Sequence::Keyword {
                kind: KeywordKind::Else,
                children,
            } => children
                .first()
                .is_some_and(|body| body.is_keyword(KeywordKind::If)),
            _ => false,
        }
    }
}

/// Cursor over a rewritten token stream
pub struct SequenceBuilder<'c, 't> {
    ctx: &'c mut CompilationContext,
    tokens: &'t [String],
    pos: usize,
    depth: usize,
}

impl<'c, 't> SequenceBuilder<'c, 't> {
    pub fn new(
        ctx: &'c mut CompilationContext,
        tokens: &'t [String],
    ) -> Self {
        Self {
            ctx,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Sequence every top-level statement
    pub fn build_all(&mut self) -> Result<Vec<Sequence>> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                ";" => self.pos += 1,
                "}" => return Err(self.ctx.parse_error("unmatched '}'")),
                _ => {
                    if let Some(seq) = self.build_statement()? {
                        items.push(seq);
                    }
                }
            }
        }
        self.check_else(&items)?;
        debug!("sequenced {} top-level statements", items.len());
        Ok(items)
    }

    /// Next real token; line markers are consumed on the way
    fn peek(&mut self) -> Option<&'t str> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.pos) {
            match parse_line_marker(token) {
                Some(line) => {
                    self.ctx.location.line = line;
                    self.pos += 1;
                }
                None => return Some(token.as_str()),
            }
        }
        None
    }

    fn next(&mut self) -> Option<&'t str> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn expect(
        &mut self,
        want: &str,
    ) -> Result<()> {
        match self.next() {
            Some(token) if token == want => Ok(()),
            found => Err(self.ctx.parse_error(format!(
                "expected '{}', found '{}'",
                want,
                found.unwrap_or("end of input")
            ))),
        }
    }

    fn identifier(
        &mut self,
        after: &str,
    ) -> Result<String> {
        match self.next() {
            Some(token) if crate::frontend::lexer::is_identifier(token) => Ok(token.to_string()),
            found => Err(self.ctx.parse_error(format!(
                "expected a name after '{}', found '{}'",
                after,
                found.unwrap_or("end of input")
            ))),
        }
    }

    /// Real tokens up to a depth-zero stop token, which is left in place
    fn collect_until(
        &mut self,
        stops: &[&str],
    ) -> Vec<String> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && stops.contains(&token) {
                break;
            }
            match token {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                _ => {}
            }
            out.push(token.to_string());
            self.pos += 1;
        }
        out
    }

    /// Tokens of a braced block, braces included
    fn collect_block(&mut self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        while let Some(token) = self.next() {
            out.push(token.to_string());
            match token {
                "{" => depth += 1,
                "}" => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
        }
        Err(self.ctx.parse_error("missing '}' at end of input"))
    }

    /// `( a , b ( c , d ) )` after a macro name, split on top-level commas
    fn macro_args(
        &mut self,
        name: &str,
    ) -> Result<Vec<Vec<String>>> {
        self.expect("(")?;
        let mut args: Vec<Vec<String>> = Vec::new();
        let mut current = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(token) = self.next() else {
                return Err(self.ctx.parse_error(format!("unterminated '{}'", name)));
            };
            match token {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        if !current.is_empty() {
                            args.push(current);
                        }
                        return Ok(args);
                    }
                }
                "," if depth == 1 => {
                    args.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
            current.push(token.to_string());
        }
    }

    fn build_statement(&mut self) -> Result<Option<Sequence>> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        self.ctx.location.code = None;
        match token {
            "erase!" => self.build_erase().map(|_| None),
            "alloc!" | "free!" | "free_arr!" => self.build_memory(token).map(Some),
            "if" => self.build_conditional(KeywordKind::If).map(Some),
            "while" => self.build_conditional(KeywordKind::While).map(Some),
            "else" => self.build_else().map(Some),
            "let" => self.build_let(),
            "{" => self.build_scope().map(Some),
            _ => self.build_expression().map(Some),
        }
    }

    /// `{ statements }` with snapshot and restore of the symbol table
    fn build_scope(&mut self) -> Result<Sequence> {
        self.expect("{")?;
        let snapshot = self.ctx.symbols.snapshot();
        self.depth += 1;
        let items = self.scope_items();
        self.depth -= 1;
        let items = items?;
        let teardown = self.ctx.close_scope(snapshot);
        Ok(Sequence::Scope { items, teardown })
    }

    fn scope_items(&mut self) -> Result<Vec<Sequence>> {
        let mut items: Vec<Sequence> = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.ctx.parse_error("missing '}' at end of input")),
                Some("}") => {
                    self.pos += 1;
                    break;
                }
                Some(";") => {
                    self.pos += 1;
                    if let Some(last) = items.last_mut() {
                        last.discard_type();
                    }
                }
                Some(_) => {
                    if let Some(seq) = self.build_statement()? {
                        items.push(seq);
                    }
                }
            }
        }
        self.check_else(&items)?;
        Ok(items)
    }

    fn check_else(
        &self,
        items: &[Sequence],
    ) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if item.is_keyword(KeywordKind::Else)
                && !(i > 0 && items[i - 1].accepts_else())
            {
                return Err(self
                    .ctx
                    .sequencing_error("'else' without a preceding 'if'"));
            }
        }
        Ok(())
    }

    fn build_expression(&mut self) -> Result<Sequence> {
        let tokens = self.collect_until(&[";", "}"]);
        self.ctx.location.code = Some(tokens.join(" "));
        let resolved = self.resolve_tokens(&tokens)?;
        Ok(Sequence::atom(resolved.ty, resolved.text))
    }

    fn build_conditional(
        &mut self,
        kind: KeywordKind,
    ) -> Result<Sequence> {
        self.pos += 1;
        let condition = self.collect_until(&["{", ";", "}"]);
        self.ctx.location.code = Some(format!("{} {}", kind.as_str(), condition.join(" ")));
        if condition.is_empty() {
            return Err(self
                .ctx
                .sequencing_error(format!("'{}' needs a condition", kind.as_str())));
        }
        if self.peek() != Some("{") {
            return Err(self.ctx.parse_error(format!(
                "expected '{{' after '{}' condition",
                kind.as_str()
            )));
        }

        let condition = self.resolve_tokens(&condition)?;
        if !condition.ty.is_atomic("bool") {
            return Err(self.ctx.type_error(format!(
                "'{}' condition must be bool, found {}",
                kind.as_str(),
                condition.ty
            )));
        }
        let body = self.build_scope()?;
        Ok(Sequence::Keyword {
            kind,
            children: vec![Sequence::atom(condition.ty, condition.text), body],
        })
    }

    fn build_else(&mut self) -> Result<Sequence> {
        self.pos += 1;
        let body = match self.peek() {
            Some("if") => self.build_conditional(KeywordKind::If)?,
            Some("{") => self.build_scope()?,
            found => {
                return Err(self.ctx.parse_error(format!(
                    "expected '{{' or 'if' after 'else', found '{}'",
                    found.unwrap_or("end of input")
                )))
            }
        };
        Ok(Sequence::Keyword {
            kind: KeywordKind::Else,
            children: vec![body],
        })
    }

    /// `erase!("a", "b")`: structs are tried before symbols
    fn build_erase(&mut self) -> Result<()> {
        self.pos += 1;
        for arg in self.macro_args("erase!")? {
            let name = match arg.as_slice() {
                [quoted] if is_quoted(quoted) => unquote(quoted),
                _ => {
                    return Err(self
                        .ctx
                        .sequencing_error("all arguments to 'erase!' must be strings"))
                }
            };
            if self.ctx.structs.erase(&name) {
                debug!("erased struct '{}'", name);
            } else if self.ctx.symbols.erase(&name) {
                debug!("erased symbol '{}'", name);
            } else {
                warn!("erase!: no symbol or struct named '{}'", name);
            }
        }
        Ok(())
    }

    /// `alloc!(p)`, `alloc!(p, n)`, `free!(p)` and `free_arr!(p)`
    fn build_memory(
        &mut self,
        name: &str,
    ) -> Result<Sequence> {
        self.pos += 1;
        let args = self.macro_args(name)?;
        self.ctx.location.code = Some(format!(
            "{}({})",
            name,
            args.iter()
                .map(|a| a.join(" "))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        if !self.ctx.inside_method {
            return Err(self.ctx.sequencing_error(format!(
                "'{}' may only appear inside operator-overload methods",
                name
            )));
        }

        let (target, count) = match (name, args.as_slice()) {
            ("alloc!", [target]) => (target, None),
            ("alloc!", [target, count]) => (target, Some(count)),
            (_, [target]) if name != "alloc!" => (target, None),
            _ => {
                return Err(self
                    .ctx
                    .sequencing_error(format!("wrong number of arguments to '{}'", name)))
            }
        };

        let target = self.resolve_tokens(target)?;
        let element = match target.ty.pointee() {
            Some(element) if target.ty.is_pointer() => element,
            _ => {
                return Err(self.ctx.type_error(format!(
                    "'{}' needs a pointer, found {}",
                    name, target.ty
                )))
            }
        };

        if name != "alloc!" {
            return Ok(Sequence::atom(Type::null(), format!("free({})", target.text)));
        }
        let count = match count {
            Some(tokens) => {
                let count = self.resolve_tokens(tokens)?;
                if !is_integer(&count.ty) {
                    return Err(self.ctx.type_error(format!(
                        "'alloc!' count must be an integer, found {}",
                        count.ty
                    )));
                }
                count.text
            }
            None => "1".to_string(),
        };
        Ok(Sequence::atom(
            Type::null(),
            format!(
                "{} = ({})malloc(sizeof({}) * ({}))",
                target.text,
                c_type(&target.ty),
                c_type(&element),
                count
            ),
        ))
    }
}

#[cfg(test)]
mod tests;
