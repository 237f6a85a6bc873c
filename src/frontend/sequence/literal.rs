//! Literal type inference

use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::is_quoted;
use crate::frontend::prelude::{FLOAT_TYPES, INTEGER_TYPES};
use crate::frontend::types::Type;
use crate::util::span::Location;

/// Type and C text of a literal token, `None` when the token is not one
///
/// Integers take the narrowest of `i32`, `i64` and `i128` that holds them,
/// anything with a decimal point is `f64`, and a scalar suffix (`7u8`,
/// `1.5f32`) names the type explicitly. An integer wider than `i128` is a
/// sequencing error.
pub fn infer_literal(token: &str) -> Result<Option<(Type, String)>> {
    if matches!(token, "true" | "false") {
        return Ok(Some((Type::bool(), token.to_string())));
    }
    if is_quoted(token) {
        let text = if token.starts_with('\'') {
            format!("\"{}\"", &token[1..token.len() - 1])
        } else {
            token.to_string()
        };
        return Ok(Some((Type::atomic("str"), text)));
    }
    numeric(token)
}

fn numeric(token: &str) -> Result<Option<(Type, String)>> {
    let sign = usize::from(token.starts_with('-'));
    let body = &token[sign..];
    let end = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());
    let (number, suffix) = body.split_at(end);

    if !number.starts_with(|c: char| c.is_ascii_digit())
        || number.ends_with('.')
        || number.matches('.').count() > 1
    {
        return Ok(None);
    }
    let literal = &token[..sign + end];
    let is_float = number.contains('.');

    if !suffix.is_empty() {
        let valid = FLOAT_TYPES.contains(&suffix) || (!is_float && INTEGER_TYPES.contains(&suffix));
        if !valid {
            return Ok(None);
        }
        return Ok(Some((Type::atomic(suffix), format!("(({}){})", suffix, literal))));
    }

    if is_float {
        return Ok(Some((Type::atomic("f64"), literal.to_string())));
    }
    let name = match literal.parse::<i128>() {
        Ok(v) if i32::try_from(v).is_ok() => "i32",
        Ok(v) if i64::try_from(v).is_ok() => "i64",
        Ok(_) => "i128",
        Err(_) => {
            return Err(TranslateError::sequencing(
                format!("integer literal '{}' does not fit in i128", literal),
                Location::dummy(),
            ))
        }
    };
    Ok(Some((Type::atomic(name), literal.to_string())))
}
