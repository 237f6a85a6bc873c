//! C code generation
//!
//! Renders [`Sequence`] trees as C statements and assembles the complete
//! translation unit from the compilation context:
//!
//! - `types`: C declarators for type chains
//! - `unit`: header, structs, prototypes, globals and definitions
//!
//! A scope whose last item yields a value returns it. When the scope also
//! tears bindings down, the value is held in `__ret` until the destructor
//! calls have run.

mod types;
mod unit;

pub use types::{c_declaration, c_type};
pub use unit::emit_unit;

use crate::frontend::sequence::{KeywordKind, Sequence};
use crate::frontend::types::Type;

const INDENT: &str = "    ";

/// Indented C text buffer
#[derive(Debug, Default)]
pub struct CodeBuffer {
    text: String,
    indent: usize,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line at the current indentation
    pub fn line(
        &mut self,
        line: &str,
    ) {
        for _ in 0..self.indent {
            self.text.push_str(INDENT);
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Append verbatim text followed by a newline
    pub fn raw(
        &mut self,
        text: &str,
    ) {
        self.text.push_str(text);
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    pub fn finish(self) -> String {
        self.text
    }

    /// Emit a function body after its declaration
    pub fn function(
        &mut self,
        declaration: &str,
        body: &Sequence,
    ) {
        self.block(body, &format!("{} ", declaration));
    }

    fn statement(
        &mut self,
        seq: &Sequence,
        prefix: &str,
    ) {
        match seq {
            Sequence::Keyword { kind, children } => match (kind, children.as_slice()) {
                (KeywordKind::If | KeywordKind::While, [condition, body]) => {
                    let header = format!(
                        "{}{} ({}) ",
                        prefix,
                        kind.as_str(),
                        inline(condition)
                    );
                    self.block(body, &header);
                }
                (KeywordKind::Else, [body]) => {
                    self.statement(body, &format!("{}else ", prefix));
                }
                _ => {}
            },
            Sequence::Scope { .. } => self.block(seq, prefix),
            Sequence::Line { .. } | Sequence::Atom { .. } => {
                let text = inline(seq);
                if !text.is_empty() {
                    self.line(&format!("{}{};", prefix, text));
                } else if !prefix.is_empty() {
                    self.line(&format!("{}{{}}", prefix));
                }
            }
        }
    }

    fn block(
        &mut self,
        seq: &Sequence,
        header: &str,
    ) {
        let Sequence::Scope { items, teardown } = seq else {
            self.line(&format!("{}{{", header));
            self.indent += 1;
            self.statement(seq, "");
            self.indent -= 1;
            self.line("}");
            return;
        };

        self.line(&format!("{}{{", header));
        self.indent += 1;

        let returned = items.last().filter(|last| yields_value(&last.ty()));
        let body = if returned.is_some() {
            &items[..items.len() - 1]
        } else {
            &items[..]
        };
        for item in body {
            self.statement(item, "");
        }

        match returned {
            Some(value) if teardown.is_empty() => {
                self.line(&format!("return ({});", inline(value)));
            }
            Some(value) => {
                self.line(&format!(
                    "{} = {};",
                    c_declaration(&value.ty(), "__ret"),
                    inline(value)
                ));
                for call in teardown {
                    self.line(call);
                }
                self.line("return __ret;");
            }
            None => {
                for call in teardown {
                    self.line(call);
                }
            }
        }

        self.indent -= 1;
        self.line("}");
    }
}

fn yields_value(ty: &Type) -> bool {
    !ty.is_null() && !ty.is_atomic("void")
}

/// Space-joined text of an expression sequence
pub fn inline(seq: &Sequence) -> String {
    match seq {
        Sequence::Atom { text, .. } => text.clone(),
        Sequence::Line { items, .. } => items
            .iter()
            .map(inline)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Sequence::Scope { .. } | Sequence::Keyword { .. } => String::new(),
    }
}

#[cfg(test)]
mod tests;
