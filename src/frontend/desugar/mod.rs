//! Operator desugaring
//!
//! Expression tokens are parsed into a small call tree and printed back as
//! call tokens, so the sequencer only ever resolves calls:
//!
//! ```text
//! x = a + 1      →  Copy ( @ x , Add ( a , 1 ) )
//! i ++           →  Incr ( @ i )
//! v [ 2 ] . len  →  Get ( @ v , 2 ) . len
//! ```
//!
//! Binary levels from loosest to tightest: assignment, comparison, boolean,
//! multiplicative, additive, bitwise. Assignment groups to the right, every
//! other level to the left.

use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::{is_identifier, is_quoted};
use crate::util::span::Location;

const ASSIGNMENT: &[(&str, &str)] = &[
    ("=", "Copy"),
    ("+=", "AddEq"),
    ("-=", "SubEq"),
    ("*=", "MultEq"),
    ("/=", "DivEq"),
    ("%=", "ModEq"),
    ("^=", "XorEq"),
    ("&=", "AndEq"),
    ("|=", "OrEq"),
    ("++", "Incr"),
    ("--", "Decr"),
];

const COMPARISON: &[(&str, &str)] = &[
    ("<", "Less"),
    (">", "Great"),
    ("<=", "Leq"),
    (">=", "Greq"),
    ("==", "Eq"),
    ("!=", "Neq"),
];

const BOOLEAN: &[(&str, &str)] = &[("&&", "Andd"), ("||", "Orr")];

const MULTIPLICATIVE: &[(&str, &str)] = &[("*", "Mult"), ("/", "Div"), ("%", "Mod")];

const ADDITIVE: &[(&str, &str)] = &[("+", "Add"), ("-", "Sub")];

const BITWISE: &[(&str, &str)] = &[("&", "And"), ("|", "Or"), ("^", "Xor")];

const LEVELS: &[&[(&str, &str)]] = &[
    ASSIGNMENT,
    COMPARISON,
    BOOLEAN,
    MULTIPLICATIVE,
    ADDITIVE,
    BITWISE,
];

const ASSIGNMENT_LEVEL: usize = 0;
const COMPARISON_LEVEL: usize = 1;
const BITWISE_LEVEL: usize = 5;

/// Desugared expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier or literal
    Atom(String),
    /// `@` or `^` applied to an operand
    Prefix(String, Box<Expr>),
    Paren(Box<Expr>),
    Call(String, Vec<Expr>),
    Member(Box<Expr>, String),
}

impl Expr {
    fn call(
        name: &str,
        args: Vec<Expr>,
    ) -> Self {
        Expr::Call(name.to_string(), args)
    }

    /// `@ operand`
    pub fn reference(self) -> Self {
        Expr::Prefix("@".to_string(), Box::new(self))
    }

    /// Print back as tokens
    pub fn to_tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(
        &self,
        out: &mut Vec<String>,
    ) {
        match self {
            Expr::Atom(token) => out.push(token.clone()),
            Expr::Prefix(op, inner) => {
                out.push(op.clone());
                inner.write_grouped(out);
            }
            Expr::Paren(inner) => {
                out.push("(".into());
                inner.write(out);
                out.push(")".into());
            }
            Expr::Call(name, args) => {
                out.push(name.clone());
                out.push("(".into());
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(",".into());
                    }
                    arg.write(out);
                }
                out.push(")".into());
            }
            Expr::Member(base, member) => {
                base.write(out);
                out.push(".".into());
                out.push(member.clone());
            }
        }
    }

    /// Parenthesize anything longer than one token
    fn write_grouped(
        &self,
        out: &mut Vec<String>,
    ) {
        match self {
            Expr::Atom(_) | Expr::Paren(_) => self.write(out),
            _ => {
                out.push("(".into());
                self.write(out);
                out.push(")".into());
            }
        }
    }
}

fn error(message: impl Into<String>) -> TranslateError {
    TranslateError::sequencing(message, Location::dummy())
}

/// Rewrite operators in an expression statement into call tokens
///
/// A whole statement of the form `Name < ... >` is an explicit template
/// instantiation and passes through untouched.
pub fn desugar(tokens: &[String]) -> Result<Vec<String>> {
    if tokens.is_empty() || is_instantiation(tokens) {
        return Ok(tokens.to_vec());
    }
    Ok(parse_expr(tokens)?.to_tokens())
}

/// Parse an expression into its call tree
pub fn parse_expr(tokens: &[String]) -> Result<Expr> {
    check_balanced(tokens)?;
    parse_level(tokens, ASSIGNMENT_LEVEL)
}

fn is_instantiation(tokens: &[String]) -> bool {
    tokens.len() >= 3
        && is_identifier(&tokens[0])
        && tokens[1] == "<"
        && tokens.last().is_some_and(|t| t == ">")
}

fn check_balanced(tokens: &[String]) -> Result<()> {
    let mut stack: Vec<&str> = Vec::new();
    for token in tokens {
        match token.as_str() {
            "(" => stack.push(")"),
            "[" => stack.push("]"),
            close @ (")" | "]") => {
                if stack.pop() != Some(close) {
                    return Err(error(format!("unbalanced '{}' in expression", close)));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(close) => Err(error(format!("missing '{}' in expression", close))),
        None => Ok(()),
    }
}

/// Whether a token can end an operand, making the next operator infix
fn ends_operand(token: &str) -> bool {
    matches!(token, ")" | "]")
        || is_identifier(token)
        || is_quoted(token)
        || is_number(token)
}

fn is_number(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
}

/// Operator found at depth zero
struct Site {
    at: usize,
    width: usize,
    name: &'static str,
}

fn operator_at(
    tokens: &[String],
    i: usize,
    level: usize,
) -> Option<(usize, &'static str)> {
    let token = tokens[i].as_str();
    let next = tokens.get(i + 1).map(String::as_str);

    if level == BITWISE_LEVEL {
        match (token, next) {
            ("<", Some("<")) => return Some((2, "Lbs")),
            (">", Some(">")) => return Some((2, "Rbs")),
            _ => {}
        }
    }
    LEVELS[level]
        .iter()
        .find(|(op, _)| *op == token)
        .map(|(_, name)| (1, *name))
}

/// First (assignment) or last (every other level) infix operator of a level
fn find_operator(
    tokens: &[String],
    level: usize,
) -> Option<Site> {
    let mut found: Option<Site> = None;
    let mut depth = 0usize;
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].as_str() {
            "(" | "[" => depth += 1,
            ")" | "]" => depth = depth.saturating_sub(1),
            _ if depth == 0 && i > 0 && ends_operand(&tokens[i - 1]) => {
                // `< <` and `> >` are shifts, never two comparisons
                if level == COMPARISON_LEVEL
                    && matches!(tokens[i].as_str(), "<" | ">")
                    && tokens.get(i + 1) == Some(&tokens[i])
                {
                    i += 2;
                    continue;
                }
                if let Some((width, name)) = operator_at(tokens, i, level) {
                    found = Some(Site { at: i, width, name });
                    if level == ASSIGNMENT_LEVEL {
                        return found;
                    }
                    i += width;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    found
}

fn parse_level(
    tokens: &[String],
    level: usize,
) -> Result<Expr> {
    if level == LEVELS.len() {
        return parse_unary(tokens);
    }
    let Some(site) = find_operator(tokens, level) else {
        return parse_level(tokens, level + 1);
    };
    let lhs = &tokens[..site.at];
    let rhs = &tokens[site.at + site.width..];

    if level == ASSIGNMENT_LEVEL {
        let target = parse_level(lhs, level + 1)?.reference();
        if matches!(site.name, "Incr" | "Decr") {
            if !rhs.is_empty() {
                return Err(error(format!(
                    "unexpected '{}' after '{}'",
                    rhs.join(" "),
                    tokens[site.at]
                )));
            }
            return Ok(Expr::call(site.name, vec![target]));
        }
        let value = parse_level(rhs, level)?;
        return Ok(Expr::call(site.name, vec![target, value]));
    }

    let left = parse_level(lhs, level)?;
    let right = parse_level(rhs, level + 1)?;
    Ok(Expr::call(site.name, vec![left, right]))
}

fn parse_unary(tokens: &[String]) -> Result<Expr> {
    let Some((first, rest)) = tokens.split_first() else {
        return Err(error("missing operand"));
    };
    match first.as_str() {
        "!" => Ok(Expr::call("Not", vec![parse_unary(rest)?])),
        "-" => match rest {
            [n] if is_number(n) => Ok(Expr::Atom(format!("-{}", n))),
            _ => Ok(Expr::call("Neg", vec![parse_unary(rest)?])),
        },
        "@" | "^" => Ok(Expr::Prefix(first.clone(), Box::new(parse_unary(rest)?))),
        _ => parse_postfix(tokens),
    }
}

/// Index of the bracket closing the one at `open`
fn closing(
    tokens: &[String],
    open: usize,
) -> Result<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.as_str() {
            "(" | "[" => depth += 1,
            ")" | "]" => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(error(format!("missing close for '{}'", tokens[open])))
}

fn split_args(tokens: &[String]) -> Result<Vec<Expr>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "(" | "[" => depth += 1,
            ")" | "]" => depth = depth.saturating_sub(1),
            "," if depth == 0 => {
                args.push(parse_level(&tokens[start..i], ASSIGNMENT_LEVEL)?);
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(parse_level(&tokens[start..], ASSIGNMENT_LEVEL)?);
    Ok(args)
}

fn parse_primary(tokens: &[String]) -> Result<(Expr, usize)> {
    let first = tokens[0].as_str();
    if first == "(" {
        let close = closing(tokens, 0)?;
        let inner = parse_level(&tokens[1..close], ASSIGNMENT_LEVEL)?;
        return Ok((Expr::Paren(Box::new(inner)), close + 1));
    }
    if is_identifier(first) && tokens.get(1).is_some_and(|t| t == "(") {
        let close = closing(tokens, 1)?;
        let args = split_args(&tokens[2..close])?;
        return Ok((Expr::call(first, args), close + 1));
    }
    if ends_operand(first) && !matches!(first, ")" | "]") {
        return Ok((Expr::Atom(first.to_string()), 1));
    }
    Err(error(format!("unexpected '{}' in expression", first)))
}

fn parse_postfix(tokens: &[String]) -> Result<Expr> {
    let (mut expr, mut pos) = parse_primary(tokens)?;
    while pos < tokens.len() {
        match tokens[pos].as_str() {
            "." => {
                let member = tokens
                    .get(pos + 1)
                    .filter(|t| is_identifier(t))
                    .ok_or_else(|| error("expected a member name after '.'"))?;
                expr = Expr::Member(Box::new(expr), member.clone());
                pos += 2;
            }
            "[" => {
                let close = closing(tokens, pos)?;
                let index = parse_level(&tokens[pos + 1..close], ASSIGNMENT_LEVEL)?;
                expr = Expr::call("Get", vec![expr.reference(), index]);
                pos = close + 1;
            }
            other => {
                return Err(error(format!(
                    "unexpected '{}' in expression '{}'",
                    other,
                    tokens.join(" ")
                )))
            }
        }
    }
    Ok(expr)
}

#[cfg(test)]
mod tests;
