//! Expression resolution
//!
//! Walks desugared call tokens, producing the C text and the inferred type
//! together. Overloads are chosen here by argument types.

use super::{infer_literal, SequenceBuilder};
use crate::frontend::desugar::desugar;
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::is_identifier;
use crate::frontend::prelude::is_integer;
use crate::frontend::symbols::mangle_symbol;
use crate::frontend::types::{generic_actuals, Type};
use crate::middle::monomorphize;

/// Typed C text of an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub ty: Type,
    pub text: String,
}

impl Resolved {
    pub fn new(
        ty: Type,
        text: impl Into<String>,
    ) -> Self {
        Self {
            ty,
            text: text.into(),
        }
    }
}

/// A viable overload
#[derive(Clone)]
struct Viable {
    /// Declared type of the candidate
    declared: Type,
    /// Callable signature, one pointer stripped for `^fn` candidates
    signature: Type,
    through_pointer: bool,
}

/// Strip every leading pointer, returning the count
fn strip_pointers(ty: &Type) -> (usize, Type) {
    let mut depth = 0;
    let mut current = ty.clone();
    while current.is_pointer() {
        match current.pointee() {
            Some(inner) => current = inner,
            None => break,
        }
        depth += 1;
    }
    (depth, current)
}

/// Signature behind the target of a function-pointer assignment
fn function_target(ty: &Type) -> Option<Type> {
    let (depth, inner) = strip_pointers(ty);
    (depth >= 2 && inner.is_function()).then_some(inner)
}

/// `Get(^^T | ^[]T | ^[N]T, integer)` reads an element in place
fn index(args: &[Resolved]) -> Option<Resolved> {
    let [container, at] = args else {
        return None;
    };
    if !container.ty.is_pointer() || !is_integer(&at.ty) {
        return None;
    }
    let element = container.ty.pointee()?.pointee()?;
    Some(Resolved::new(
        element,
        format!("(*{})[{}]", container.text, at.text),
    ))
}

/// Index of the bracket closing the one at `open`
fn matching_close(
    tokens: &[String],
    open: usize,
) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.as_str() {
            "(" | "[" => depth += 1,
            ")" | "]" => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_arguments(tokens: &[String]) -> Vec<&[String]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "(" | "[" | "<" => depth += 1,
            ")" | "]" | ">" => depth = depth.saturating_sub(1),
            "," if depth == 0 => {
                args.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(&tokens[start..]);
    args
}

impl<'c, 't> SequenceBuilder<'c, 't> {
    /// Desugar operators, then resolve
    pub(super) fn resolve_tokens(
        &mut self,
        tokens: &[String],
    ) -> Result<Resolved> {
        let here = self.ctx.here();
        let calls = desugar(tokens).map_err(|e| e.or_at(&here))?;
        self.resolve_all(&calls)
    }

    /// Resolve a token slice that must form exactly one expression
    pub(super) fn resolve_all(
        &mut self,
        tokens: &[String],
    ) -> Result<Resolved> {
        let mut pos = 0;
        let resolved = self.resolve(tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(self.ctx.sequencing_error(format!(
                "unexpected '{}' after expression",
                tokens[pos..].join(" ")
            )));
        }
        Ok(resolved)
    }

    fn resolve(
        &mut self,
        tokens: &[String],
        pos: &mut usize,
    ) -> Result<Resolved> {
        let Some(token) = tokens.get(*pos) else {
            return Err(self.ctx.sequencing_error("expected an expression"));
        };
        match token.as_str() {
            "@" => {
                *pos += 1;
                let inner = self.resolve(tokens, pos)?;
                Ok(Resolved::new(
                    inner.ty.pointer_to(),
                    format!("&{}", inner.text),
                ))
            }
            "^" => {
                *pos += 1;
                let inner = self.resolve(tokens, pos)?;
                match inner.ty.pointee() {
                    Some(ty) if inner.ty.is_pointer() => {
                        Ok(Resolved::new(ty, format!("(*{})", inner.text)))
                    }
                    _ => Err(self.ctx.type_error(format!(
                        "cannot dereference '{}' of non-pointer type {}",
                        inner.text, inner.ty
                    ))),
                }
            }
            _ => {
                let primary = self.primary(tokens, pos)?;
                self.members(primary, tokens, pos)
            }
        }
    }

    fn primary(
        &mut self,
        tokens: &[String],
        pos: &mut usize,
    ) -> Result<Resolved> {
        let token = tokens[*pos].as_str();
        let next = tokens.get(*pos + 1).map(String::as_str);

        if token == "(" {
            let close = matching_close(tokens, *pos)
                .ok_or_else(|| self.ctx.sequencing_error("missing ')'"))?;
            let inner = self.resolve_all(&tokens[*pos + 1..close])?;
            *pos = close + 1;
            return Ok(Resolved::new(inner.ty, format!("({})", inner.text)));
        }

        if is_identifier(token) && next == Some("(") {
            let close = matching_close(tokens, *pos + 1).ok_or_else(|| {
                self.ctx
                    .sequencing_error(format!("missing ')' in call to '{}'", token))
            })?;
            let args = split_arguments(&tokens[*pos + 2..close]);
            *pos = close + 1;
            return self.resolve_call(token, &args);
        }

        if is_identifier(token) && next == Some("<") {
            *pos += 1;
            let here = self.ctx.here();
            let actuals = generic_actuals(tokens, pos).map_err(|e| e.or_at(&here))?;
            monomorphize::instantiate(self.ctx, token, &actuals)?;
            return Ok(Resolved::new(Type::null(), String::new()));
        }

        *pos += 1;
        let here = self.ctx.here();
        if let Some((ty, text)) = infer_literal(token).map_err(|e| e.or_at(&here))? {
            return Ok(Resolved::new(ty, text));
        }
        self.symbol(token)
    }

    /// Latest visible candidate of a plain name
    fn symbol(
        &mut self,
        name: &str,
    ) -> Result<Resolved> {
        let Some(candidate) = self.ctx.symbols.latest(name) else {
            return Err(self
                .ctx
                .sequencing_error(format!("undefined symbol '{}'", name)));
        };
        let ty = candidate.ty.clone();
        if ty.is_function() {
            let mangled = mangle_symbol(name, &ty);
            self.ctx.referenced.insert(mangled.clone());
            return Ok(Resolved::new(ty, mangled));
        }
        Ok(Resolved::new(ty, name))
    }

    /// `.member` chains, dereferencing pointers on the way
    fn members(
        &mut self,
        mut current: Resolved,
        tokens: &[String],
        pos: &mut usize,
    ) -> Result<Resolved> {
        while tokens.get(*pos).is_some_and(|t| t == ".") {
            let Some(member) = tokens.get(*pos + 1) else {
                return Err(self
                    .ctx
                    .sequencing_error("expected a member name after '.'"));
            };
            *pos += 2;

            while current.ty.is_pointer() {
                let Some(inner) = current.ty.pointee() else {
                    break;
                };
                current = Resolved::new(inner, format!("(*{})", current.text));
            }

            let Some(struct_name) = current.ty.atomic_name() else {
                return Err(self.ctx.type_error(format!(
                    "member access '.{}' on non-struct type {}",
                    member, current.ty
                )));
            };
            let Some(data) = self.ctx.structs.get(struct_name) else {
                return Err(self
                    .ctx
                    .type_error(format!("struct '{}' does not exist", struct_name)));
            };
            if data.erased {
                return Err(self.ctx.type_error(format!(
                    "struct '{}' exists, but is erased",
                    struct_name
                )));
            }
            let Some(member_ty) = data.member(member) else {
                return Err(self.ctx.type_error(format!(
                    "struct '{}' has no member '{}'",
                    struct_name, member
                )));
            };
            let ty = member_ty.clone();
            let text = format!("{}.{}", current.text, member);
            current = Resolved::new(ty, text);
        }
        Ok(current)
    }

    fn resolve_call(
        &mut self,
        name: &str,
        args: &[&[String]],
    ) -> Result<Resolved> {
        if name == "Copy" && args.len() == 2 {
            let target = self.resolve_all(args[0])?;
            if let Some(signature) = function_target(&target.ty) {
                return self.assign_function(target, signature, args[1]);
            }
            let value = self.resolve_all(args[1])?;
            return self.call(name, vec![target, value]);
        }

        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            resolved.push(self.resolve_all(arg)?);
        }
        self.call(name, resolved)
    }

    /// `Copy(@f, g)` where `f` is a function pointer
    fn assign_function(
        &mut self,
        target: Resolved,
        signature: Type,
        value: &[String],
    ) -> Result<Resolved> {
        let named_function = match value {
            [name] if is_identifier(name) => self
                .ctx
                .symbols
                .visible(name)
                .any(|c| c.ty.is_function())
                .then_some(name.as_str()),
            _ => None,
        };

        let value = match named_function {
            Some(name) => {
                if !self.ctx.symbols.has_overload(name, &signature) {
                    return Err(self.ctx.type_error(format!(
                        "no overload of '{}' has type {}",
                        name, signature
                    )));
                }
                let mangled = mangle_symbol(name, &signature);
                self.ctx.referenced.insert(mangled.clone());
                Resolved::new(signature.clone(), mangled)
            }
            None => self.resolve_all(value)?,
        };

        if strip_pointers(&value.ty).1 != signature {
            return Err(self.ctx.type_error(format!(
                "cannot assign {} to a function pointer of type {}",
                value.ty, signature
            )));
        }
        Ok(Resolved::new(
            Type::null(),
            format!("(*{}) = {}", target.text, value.text),
        ))
    }

    /// Overload resolution by argument types
    pub(super) fn call(
        &mut self,
        name: &str,
        args: Vec<Resolved>,
    ) -> Result<Resolved> {
        if name == "Get" {
            if let Some(element) = index(&args) {
                return Ok(element);
            }
        }

        let candidates = self.ctx.symbols.candidates(name);
        if candidates.is_empty() {
            return Err(self
                .ctx
                .sequencing_error(format!("undefined function '{}'", name)));
        }

        let mut reasons = Vec::new();
        let mut viable: Vec<Viable> = Vec::new();
        for candidate in candidates {
            let rendered = candidate.ty.to_string();
            if candidate.erased {
                reasons.push(format!("{}: erased", rendered));
                continue;
            }
            let (signature, through_pointer) = if candidate.ty.is_function() {
                (candidate.ty.clone(), false)
            } else {
                match candidate.ty.pointee() {
                    Some(inner) if candidate.ty.is_pointer() && inner.is_function() => {
                        (inner, true)
                    }
                    _ => {
                        reasons.push(format!("{}: not a function", rendered));
                        continue;
                    }
                }
            };
            let params = signature
                .get_arguments()
                .map_err(|e| TranslateError::malformed_type(e, self.ctx.here()))?;
            if params.len() != args.len() {
                reasons.push(format!(
                    "{}: expects {} argument(s), got {}",
                    rendered,
                    params.len(),
                    args.len()
                ));
                continue;
            }
            let mismatch = params
                .iter()
                .zip(&args)
                .position(|((_, want), got)| want != &got.ty);
            if let Some(i) = mismatch {
                reasons.push(format!(
                    "{}: argument {} expects {}, got {}",
                    rendered,
                    i + 1,
                    params[i].1,
                    args[i].ty
                ));
                continue;
            }
            viable.push(Viable {
                declared: candidate.ty.clone(),
                signature,
                through_pointer,
            });
        }

        let Some(chosen) = viable.first().cloned() else {
            let arg_types: Vec<String> = args.iter().map(|a| a.ty.to_string()).collect();
            return Err(self.ctx.sequencing_error(format!(
                "no viable candidate for '{}({})':\n    {}",
                name,
                arg_types.join(", "),
                reasons.join("\n    ")
            )));
        };

        let here = self.ctx.here();
        let ret = chosen
            .signature
            .get_return_type()
            .map_err(|e| TranslateError::malformed_type(e, here.clone()))?;
        for other in &viable[1..] {
            let other_ret = other
                .signature
                .get_return_type()
                .map_err(|e| TranslateError::malformed_type(e, here.clone()))?;
            if other_ret != ret {
                return Err(self.ctx.sequencing_error(format!(
                    "ambiguous call to '{}': candidates return {} and {}",
                    name, ret, other_ret
                )));
            }
        }

        let args_text: Vec<&str> = args.iter().map(|a| a.text.as_str()).collect();
        let text = if chosen.through_pointer {
            format!("(*{})({})", name, args_text.join(", "))
        } else {
            let mangled = mangle_symbol(name, &chosen.declared);
            self.ctx.referenced.insert(mangled.clone());
            format!("{}({})", mangled, args_text.join(", "))
        };
        Ok(Resolved::new(ret, text))
    }
}
