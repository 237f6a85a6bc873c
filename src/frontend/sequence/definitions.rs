//! `let` forms
//!
//! ```text
//! let name: struct { a, b: i32, next: ^name, }    struct
//! let name: struct;                                unit struct
//! let name: T;                                     variable
//! let name(a: T) -> R { ... }                      function
//! let name(a: T) -> R;                             prototype
//! let name<T>(a: T) -> T { ... }                   function template
//! let name<T>: struct { value: T, }                struct template
//! ```

use super::{Sequence, SequenceBuilder};
use crate::frontend::context::CompilationContext;
use crate::frontend::error::{Result, TranslateError};
use crate::frontend::lexer::is_identifier;
use crate::frontend::symbols::{lifecycle_signature, mangle_symbol, Body, StructData};
use crate::frontend::types::{parse_type_tokens, Type};
use crate::middle::codegen::c_declaration;
use crate::middle::monomorphize::{FunctionTemplate, StructTemplate};
use indexmap::IndexMap;
use tracing::debug;

impl<'c, 't> SequenceBuilder<'c, 't> {
    pub(super) fn build_let(&mut self) -> Result<Option<Sequence>> {
        self.expect("let")?;
        let name = self.identifier("let")?;
        match self.peek() {
            Some("<") => {
                self.build_template(&name)?;
                Ok(None)
            }
            Some(":") => {
                self.pos += 1;
                if self.peek() == Some("struct") {
                    self.pos += 1;
                    let body = self.struct_body(&name)?;
                    self.ctx.location.code = Some(format!("let {}: struct", name));
                    define_struct(self.ctx, &name, &body)?;
                    Ok(None)
                } else {
                    self.build_variable(&name)
                }
            }
            Some("(") => {
                self.build_function(&name)?;
                Ok(None)
            }
            found => Err(self.ctx.parse_error(format!(
                "expected ':', '(' or '<' after 'let {}', found '{}'",
                name,
                found.unwrap_or("end of input")
            ))),
        }
    }

    /// Member tokens between the braces, empty for a unit struct
    fn struct_body(
        &mut self,
        name: &str,
    ) -> Result<Vec<String>> {
        match self.peek() {
            Some(";") => Ok(Vec::new()),
            Some("{") => {
                let mut block = self.collect_block()?;
                block.pop();
                block.remove(0);
                Ok(block)
            }
            found => Err(self.ctx.parse_error(format!(
                "expected '{{' or ';' after 'let {}: struct', found '{}'",
                name,
                found.unwrap_or("end of input")
            ))),
        }
    }

    /// `<A, B>` after a template name
    fn generic_names(&mut self) -> Result<Vec<String>> {
        self.expect("<")?;
        let mut names = Vec::new();
        loop {
            names.push(self.identifier("<")?);
            match self.next() {
                Some(",") => continue,
                Some(">") => return Ok(names),
                found => {
                    return Err(self.ctx.parse_error(format!(
                        "expected ',' or '>' in generic list, found '{}'",
                        found.unwrap_or("end of input")
                    )))
                }
            }
        }
    }

    /// Store a generic definition; bodies are built on instantiation
    fn build_template(
        &mut self,
        name: &str,
    ) -> Result<()> {
        let generics = self.generic_names()?;
        match self.peek() {
            Some(":") => {
                self.pos += 1;
                self.expect("struct")?;
                let body = self.struct_body(name)?;
                debug!("stored struct template '{}' <{}>", name, generics.join(", "));
                self.ctx
                    .templates
                    .add_struct(name, StructTemplate { generics, body });
                Ok(())
            }
            Some("(") => {
                let signature = self.collect_until(&["{", ";", "}"]);
                if self.peek() != Some("{") {
                    return Err(self.ctx.parse_error(format!(
                        "generic function '{}' must have a body",
                        name
                    )));
                }
                let mut body = vec!["let".to_string(), name.to_string()];
                body.extend(signature);
                body.extend(self.collect_block()?);
                debug!("stored function template '{}' <{}>", name, generics.join(", "));
                self.ctx.templates.add_function(
                    name,
                    FunctionTemplate { generics, body },
                );
                Ok(())
            }
            found => Err(self.ctx.parse_error(format!(
                "expected ':' or '(' after generics of '{}', found '{}'",
                name,
                found.unwrap_or("end of input")
            ))),
        }
    }

    /// `let name: T;` declares and constructs a variable
    fn build_variable(
        &mut self,
        name: &str,
    ) -> Result<Option<Sequence>> {
        let type_tokens = self.collect_until(&[";", "}"]);
        self.ctx.location.code = Some(format!("let {}: {}", name, type_tokens.join(" ")));
        if type_tokens.iter().any(|t| t == "=") {
            return Err(self.ctx.sequencing_error(
                "assignment in a declaration is not supported; declare first, then assign",
            ));
        }
        let here = self.ctx.here();
        let ty = parse_type_tokens(&type_tokens, &mut *self.ctx).map_err(|e| e.or_at(&here))?;
        self.ctx.symbols.declare(name, ty.clone(), Body::None);

        // Globals are emitted from the symbol table
        if self.depth == 0 {
            return Ok(None);
        }

        let mut items = vec![Sequence::atom(Type::null(), c_declaration(&ty, name))];
        if let Some(call) = self.constructor_call(name, &ty)? {
            items.push(Sequence::atom(Type::null(), ";"));
            items.push(call);
        }
        Ok(Some(Sequence::Line {
            items,
            ty: Type::null(),
        }))
    }

    /// `New(@name)` unless the type is indirect or trivially constructed
    fn constructor_call(
        &mut self,
        name: &str,
        ty: &Type,
    ) -> Result<Option<Sequence>> {
        if ty.is_indirect() || ty.is_function() {
            return Ok(None);
        }
        let trivial = ty
            .atomic_name()
            .is_some_and(|n| self.ctx.config.is_trivially_dropped(n));
        if trivial && !self.ctx.symbols.has_overload("New", &lifecycle_signature(ty)) {
            return Ok(None);
        }
        let target = super::Resolved::new(ty.clone().pointer_to(), format!("&{}", name));
        let call = self.call("New", vec![target])?;
        Ok(Some(Sequence::atom(call.ty, call.text)))
    }

    /// Function definition or prototype
    fn build_function(
        &mut self,
        name: &str,
    ) -> Result<()> {
        let signature = self.collect_until(&["{", ";", "}"]);
        self.ctx.location.code = Some(format!("let {} {}", name, signature.join(" ")));
        let here = self.ctx.here();
        let ty = parse_type_tokens(&signature, &mut *self.ctx).map_err(|e| e.or_at(&here))?;
        if !ty.is_function() {
            return Err(self
                .ctx
                .parse_error(format!("malformed signature for '{}'", name)));
        }
        let args = ty
            .get_arguments()
            .map_err(|e| TranslateError::malformed_type(e, here.clone()))?;

        if self.peek() != Some("{") {
            if !self.ctx.symbols.has_overload(name, &ty) {
                self.ctx.symbols.declare(name, ty, Body::None);
            }
            return Ok(());
        }

        match self.ctx.symbols.find_exact(name, &ty) {
            Some(i) if matches!(self.ctx.symbols.candidates(name)[i].body, Body::Sequence(_)) => {
                return Err(self
                    .ctx
                    .parse_error(format!("redefinition of '{}' with type {}", name, ty)));
            }
            Some(_) => {}
            None => {
                self.ctx.symbols.declare(name, ty.clone(), Body::None);
            }
        }

        let snapshot = self.ctx.symbols.snapshot();
        for (arg, arg_ty) in &args {
            if !arg.is_empty() {
                self.ctx.symbols.declare(arg, arg_ty.clone(), Body::None);
            }
        }
        let is_method = name.chars().any(char::is_uppercase);
        let outer = std::mem::replace(&mut self.ctx.inside_method, is_method);
        let body = self.build_scope();
        self.ctx.inside_method = outer;
        let body = body?;

        // Arguments belong to the caller
        self.ctx.close_scope(snapshot);

        if let Some(i) = self.ctx.symbols.find_exact(name, &ty) {
            if let Some(candidate) = self.ctx.symbols.candidate_mut(name, i) {
                candidate.body = Body::Sequence(body);
            }
        }
        debug!("defined '{}' {}", name, ty);
        Ok(())
    }
}

/// Register a struct from its member tokens and generate `New`/`Del`
pub(crate) fn define_struct(
    ctx: &mut CompilationContext,
    name: &str,
    body: &[String],
) -> Result<()> {
    let members = parse_members(ctx, name, body)?;
    ctx.structs.define(
        name,
        StructData {
            members: members.clone(),
            erased: false,
        },
    );
    install_lifecycle(ctx, name, &members);
    debug!("defined struct '{}' with {} members", name, members.len());
    Ok(())
}

/// `a, b: T, c: U,` with an optional trailing comma
fn parse_members(
    ctx: &mut CompilationContext,
    name: &str,
    body: &[String],
) -> Result<IndexMap<String, Type>> {
    let mut members = IndexMap::new();
    let mut i = 0;
    while i < body.len() {
        let mut names = Vec::new();
        loop {
            match body.get(i) {
                Some(member) if is_identifier(member) => names.push(member.clone()),
                found => {
                    return Err(ctx.parse_error(format!(
                        "expected a member name in struct '{}', found '{}'",
                        name,
                        found.map(String::as_str).unwrap_or("end of body")
                    )))
                }
            }
            i += 1;
            match body.get(i).map(String::as_str) {
                Some(",") => i += 1,
                Some(":") => {
                    i += 1;
                    break;
                }
                _ => {
                    return Err(ctx.parse_error(format!(
                        "expected ':' after member '{}' of struct '{}'",
                        names.last().map(String::as_str).unwrap_or_default(),
                        name
                    )))
                }
            }
        }

        let start = i;
        let mut depth = 0usize;
        while i < body.len() {
            match body[i].as_str() {
                "<" | "(" => depth += 1,
                ">" | ")" => depth = depth.saturating_sub(1),
                "," if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        let here = ctx.here();
        let ty = parse_type_tokens(&body[start..i], &mut *ctx).map_err(|e| e.or_at(&here))?;
        i += 1;

        for member in names {
            if members.insert(member.clone(), ty.clone()).is_some() {
                return Err(ctx.parse_error(format!(
                    "duplicate member '{}' in struct '{}'",
                    member, name
                )));
            }
        }
    }
    Ok(members)
}

/// Generated `New` constructs members in order, `Del` destroys the
/// non-trivial ones in reverse
fn install_lifecycle(
    ctx: &mut CompilationContext,
    name: &str,
    members: &IndexMap<String, Type>,
) {
    let signature = lifecycle_signature(&Type::atomic(name));
    let mut construct = Vec::new();
    let mut destruct = Vec::new();

    for (member, ty) in members {
        if ty.is_pointer() {
            construct.push(format!("what->{} = NULL;", member));
            continue;
        }
        if ty.is_indirect() || ty.is_function() {
            continue;
        }
        let member_signature = lifecycle_signature(ty);
        if ctx.symbols.has_overload("New", &member_signature) {
            let new = mangle_symbol("New", &member_signature);
            construct.push(format!("{}(&what->{});", new, member));
            ctx.referenced.insert(new);
        }
        if ctx.needs_destructor(ty) {
            let del = mangle_symbol("Del", &member_signature);
            destruct.push(format!("{}(&what->{});", del, member));
            ctx.referenced.insert(del);
        }
    }
    destruct.reverse();

    for (function, lines) in [("New", construct), ("Del", destruct)] {
        let mangled = mangle_symbol(function, &signature);
        let mut text = format!("static inline {} {{\n", c_declaration(&signature, &mangled));
        if lines.is_empty() {
            text.push_str("    (void)what;\n");
        }
        for line in &lines {
            text.push_str("    ");
            text.push_str(line);
            text.push('\n');
        }
        text.push('}');

        match ctx.symbols.find_exact(function, &signature) {
            Some(i) => {
                if let Some(existing) = ctx.symbols.candidate_mut(function, i) {
                    if matches!(existing.body, Body::Builtin(_) | Body::None) {
                        existing.body = Body::Builtin(text);
                    }
                }
            }
            None => {
                ctx.symbols.declare(function, signature.clone(), Body::Builtin(text));
            }
        }
        ctx.referenced.insert(mangled);
    }
}
