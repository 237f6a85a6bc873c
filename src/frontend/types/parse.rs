//! Type parsing from token slices
//!
//! ```text
//! type    := '^' type | '[]' type | '[' N ']' type | signature | name generics?
//! signature := '(' (arg (',' arg)*)? ')' ('->' type)?
//! arg     := (ident ':')? type
//! generics := '<' type-tokens (',' type-tokens)* '>'
//! ```

use super::{Type, TypeKind};
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::is_identifier;
use crate::util::span::Location;

/// Instantiates generic structs named inside type expressions
pub trait GenericResolver {
    /// Instantiate `name<actuals...>` and return the canonical struct name
    fn instantiate_struct(
        &mut self,
        name: &str,
        actuals: &[Vec<String>],
    ) -> Result<String>;
}

/// Resolver for contexts where generic structs cannot appear
pub struct NoGenerics;

impl GenericResolver for NoGenerics {
    fn instantiate_struct(
        &mut self,
        name: &str,
        _actuals: &[Vec<String>],
    ) -> Result<String> {
        Err(TranslateError::sequencing(
            format!("generic struct '{}' is not allowed here", name),
            Location::dummy(),
        ))
    }
}

/// Canonical mangled name of a generic instantiation: `Name__A_B_`
pub fn canonical_name(
    name: &str,
    actuals: &[Type],
) -> String {
    let mut out = format!("{}_", name);
    for actual in actuals {
        out.push('_');
        out.push_str(&actual.mangled());
    }
    out.push('_');
    out
}

/// Parse a complete token slice as one type
pub fn parse_type_tokens(
    tokens: &[String],
    generics: &mut dyn GenericResolver,
) -> Result<Type> {
    let mut pos = 0;
    let ty = parse_type(tokens, &mut pos, generics)?;
    if pos != tokens.len() {
        return Err(TranslateError::parse(
            format!(
                "unexpected '{}' after type '{}'",
                tokens[pos..].join(" "),
                ty
            ),
            Location::dummy(),
        ));
    }
    Ok(ty)
}

/// Parse one type starting at `pos`, advancing past it
pub fn parse_type(
    tokens: &[String],
    pos: &mut usize,
    generics: &mut dyn GenericResolver,
) -> Result<Type> {
    let mut out = Type::null();
    parse_into(tokens, pos, generics, &mut out)?;
    out.validate()
        .map_err(|e| TranslateError::malformed_type(e, Location::dummy()))?;
    Ok(out)
}

fn peek(
    tokens: &[String],
    pos: usize,
) -> Option<&str> {
    tokens.get(pos).map(String::as_str)
}

fn expect(
    tokens: &[String],
    pos: &mut usize,
    want: &str,
) -> Result<()> {
    match peek(tokens, *pos) {
        Some(t) if t == want => {
            *pos += 1;
            Ok(())
        }
        found => Err(TranslateError::parse(
            format!(
                "expected '{}' in type, found '{}'",
                want,
                found.unwrap_or("end of input")
            ),
            Location::dummy(),
        )),
    }
}

fn parse_into(
    tokens: &[String],
    pos: &mut usize,
    generics: &mut dyn GenericResolver,
    out: &mut Type,
) -> Result<()> {
    let token = match peek(tokens, *pos) {
        Some(t) => t,
        None => {
            return Err(TranslateError::parse(
                "expected a type, found end of input",
                Location::dummy(),
            ))
        }
    };

    match token {
        "^" => {
            *pos += 1;
            out.append(TypeKind::Pointer);
            parse_into(tokens, pos, generics, out)
        }
        "[]" => {
            *pos += 1;
            out.append(TypeKind::Array);
            parse_into(tokens, pos, generics, out)
        }
        "[" => {
            *pos += 1;
            let size = peek(tokens, *pos).unwrap_or("").to_string();
            *pos += 1;
            expect(tokens, pos, "]")?;
            out.append(TypeKind::SizedArray(size));
            parse_into(tokens, pos, generics, out)
        }
        "(" => parse_signature(tokens, pos, generics, out),
        name if is_identifier(name) => {
            *pos += 1;
            if peek(tokens, *pos) == Some("<") {
                let actuals = generic_actuals(tokens, pos)?;
                let canonical = generics.instantiate_struct(name, &actuals)?;
                out.append(TypeKind::Atomic(canonical));
            } else {
                out.append(TypeKind::Atomic(name.to_string()));
            }
            Ok(())
        }
        other => Err(TranslateError::parse(
            format!("'{}' cannot start a type", other),
            Location::dummy(),
        )),
    }
}

fn parse_signature(
    tokens: &[String],
    pos: &mut usize,
    generics: &mut dyn GenericResolver,
    out: &mut Type,
) -> Result<()> {
    expect(tokens, pos, "(")?;
    out.append(TypeKind::Function);

    let mut first = true;
    while peek(tokens, *pos) != Some(")") {
        if !first {
            expect(tokens, pos, ",")?;
            out.append(TypeKind::Join);
        }
        first = false;

        if let (Some(name), Some(":")) = (peek(tokens, *pos), peek(tokens, *pos + 1)) {
            if is_identifier(name) {
                out.append(TypeKind::VarName(name.to_string()));
                *pos += 2;
            }
        }
        parse_into(tokens, pos, generics, out)?;
    }
    expect(tokens, pos, ")")?;
    out.append(TypeKind::Maps);

    if peek(tokens, *pos) == Some("->") {
        *pos += 1;
        parse_into(tokens, pos, generics, out)
    } else {
        out.append(TypeKind::Atomic("void".into()));
        Ok(())
    }
}

/// Collect `<a, b<c>>` starting at the `<`, split on top-level commas
pub(crate) fn generic_actuals(
    tokens: &[String],
    pos: &mut usize,
) -> Result<Vec<Vec<String>>> {
    expect(tokens, pos, "<")?;
    let mut actuals = vec![Vec::new()];
    let mut depth = 1usize;
    while let Some(token) = peek(tokens, *pos) {
        *pos += 1;
        match token {
            "<" => depth += 1,
            ">" => {
                depth -= 1;
                if depth == 0 {
                    if actuals.iter().any(Vec::is_empty) {
                        return Err(TranslateError::sequencing(
                            "empty generic argument",
                            Location::dummy(),
                        ));
                    }
                    return Ok(actuals);
                }
            }
            "," if depth == 1 => {
                actuals.push(Vec::new());
                continue;
            }
            _ => {}
        }
        if let Some(last) = actuals.last_mut() {
            last.push(token.to_string());
        }
    }
    Err(TranslateError::sequencing(
        "unterminated generic argument list",
        Location::dummy(),
    ))
}
