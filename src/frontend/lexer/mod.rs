//! Lexer module
//!
//! Oak tokens are plain strings. Line information travels in-band: whenever
//! the source line advances before the next real token, a synthetic
//! `//__LINE__=N` token is emitted, and the sequence builder consumes these
//! markers to keep its diagnostics location current.

use unicode_ident::{is_xid_continue, is_xid_start};

pub use tokenizer::tokenize;

/// Prefix of the synthetic line-marker token
pub const LINE_MARKER: &str = "//__LINE__=";

/// Lexer error
#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string starting at line {line}")]
    UnterminatedString { line: usize },
    #[error("Unterminated block comment starting at line {line}")]
    UnterminatedComment { line: usize },
    #[error("Unexpected character '{ch}' at line {line}")]
    UnexpectedChar { ch: char, line: usize },
}

/// Build a line-marker token
#[inline]
pub fn line_marker(line: usize) -> String {
    format!("{}{}", LINE_MARKER, line)
}

/// Line number carried by a marker token
pub fn parse_line_marker(token: &str) -> Option<usize> {
    token.strip_prefix(LINE_MARKER)?.parse().ok()
}

/// Whether the token is a line marker
#[inline]
pub fn is_line_marker(token: &str) -> bool {
    token.starts_with(LINE_MARKER)
}

/// Whether the token is a macro invocation name (`name!`)
#[inline]
pub fn is_macro(token: &str) -> bool {
    token.len() > 1 && token.ends_with('!')
}

/// Whether the token is an identifier
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c == '_' || is_xid_start(c) => chars.all(is_xid_continue),
        _ => false,
    }
}

/// Whether the token is a quoted string or character literal
pub fn is_quoted(token: &str) -> bool {
    token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
}

/// Strip the quotes of a string literal and undo `\"` and `\\` escapes
pub fn unquote(token: &str) -> String {
    if !is_quoted(token) {
        return token.to_string();
    }
    let inner = &token[1..token.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(n @ ('"' | '\\' | '\'')) => out.push(n),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenize a rule pattern
///
/// Whitespace-separated words that begin with a `$` operator stay whole
/// (`$<$`, `$-lit`, `$[$a$b$]`); everything else, slots like `$X)` included,
/// goes through the ordinary lexer.
pub fn lex_pattern(text: &str) -> Result<Vec<String>, LexError> {
    let mut out = Vec::new();
    for word in text.split_whitespace() {
        let is_operator = word
            .strip_prefix('$')
            .is_some_and(|rest| !rest.starts_with(|c: char| c == '_' || is_xid_start(c)));
        if is_operator {
            out.push(word.to_string());
        } else {
            out.extend(tokenize(word)?.into_iter().filter(|t| !is_line_marker(t)));
        }
    }
    Ok(out)
}

/// Multi-character operators, longest first
const OPERATORS: &[&str] = &[
    "->", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "^=",
    "&=", "|=", "[]",
];

mod tokenizer {
    use super::*;
    use std::iter::Peekable;
    use std::str::Chars;

    pub fn tokenize(source: &str) -> Result<Vec<String>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        while let Some(token) = lexer.next_token()? {
            if lexer.start_line != lexer.emitted_line {
                tokens.push(line_marker(lexer.start_line));
                lexer.emitted_line = lexer.start_line;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }

    struct Lexer<'a> {
        chars: Peekable<Chars<'a>>,
        line: usize,
        start_line: usize,
        emitted_line: usize,
    }

    impl<'a> Lexer<'a> {
        fn new(source: &'a str) -> Self {
            Self {
                chars: source.chars().peekable(),
                line: 1,
                start_line: 1,
                emitted_line: 1,
            }
        }

        fn advance(&mut self) -> Option<char> {
            let c = self.chars.next();
            if c == Some('\n') {
                self.line += 1;
            }
            c
        }

        fn peek(&mut self) -> Option<char> {
            self.chars.peek().copied()
        }

        fn peek_next(&self) -> Option<char> {
            self.chars.clone().nth(1)
        }

        fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
            loop {
                match self.peek() {
                    Some(c) if c.is_whitespace() => {
                        self.advance();
                    }
                    Some('/') if self.peek_next() == Some('/') => {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('/') if self.peek_next() == Some('*') => {
                        let line = self.line;
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some('*') if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some(_) => {}
                                None => return Err(LexError::UnterminatedComment { line }),
                            }
                        }
                    }
                    _ => return Ok(()),
                }
            }
        }

        fn next_token(&mut self) -> Result<Option<String>, LexError> {
            self.skip_whitespace_and_comments()?;
            self.start_line = self.line;

            let c = match self.advance() {
                Some(c) => c,
                None => return Ok(None),
            };

            let token = match c {
                c if c == '_' || is_xid_start(c) => self.identifier(c),
                c if c.is_ascii_digit() => self.number(c),
                '"' | '\'' => self.string(c)?,
                '$' => self.pattern_operator(),
                c if c.is_ascii_punctuation() => self.operator(c),
                ch => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        line: self.start_line,
                    })
                }
            };
            Ok(Some(token))
        }

        fn identifier(
            &mut self,
            first: char,
        ) -> String {
            let mut text = String::from(first);
            while let Some(c) = self.peek() {
                if is_xid_continue(c) {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            // `name!` is a macro call, `name != x` is not
            if self.peek() == Some('!') && self.peek_next() != Some('=') {
                self.advance();
                text.push('!');
            }
            text
        }

        fn number(
            &mut self,
            first: char,
        ) -> String {
            let mut text = String::from(first);
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    text.push(c);
                    self.advance();
                } else if c == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            text
        }

        fn string(
            &mut self,
            quote: char,
        ) -> Result<String, LexError> {
            let line = self.start_line;
            let mut text = String::from(quote);
            loop {
                match self.advance() {
                    Some('\\') => {
                        text.push('\\');
                        match self.advance() {
                            Some(c) => text.push(c),
                            None => return Err(LexError::UnterminatedString { line }),
                        }
                    }
                    Some(c) if c == quote => {
                        text.push(c);
                        return Ok(text);
                    }
                    Some(c) => text.push(c),
                    None => return Err(LexError::UnterminatedString { line }),
                }
            }
        }

        /// `$name` and `$$` are single tokens
        fn pattern_operator(&mut self) -> String {
            let mut text = String::from('$');
            match self.peek() {
                Some('$') => {
                    self.advance();
                    text.push('$');
                }
                _ => {
                    while let Some(c) = self.peek() {
                        if is_xid_continue(c) {
                            text.push(c);
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
            text
        }

        fn operator(
            &mut self,
            first: char,
        ) -> String {
            if let Some(next) = self.peek() {
                let pair: String = [first, next].iter().collect();
                if OPERATORS.contains(&pair.as_str()) {
                    self.advance();
                    return pair;
                }
            }
            first.to_string()
        }
    }
}

#[cfg(test)]
mod tests;
