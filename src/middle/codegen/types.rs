//! C declarators
//!
//! A type chain reads outside-in (`^[4]i32` is a pointer to an array of
//! four `i32`), while a C declarator wraps the name from the inside out.
//! Each node therefore wraps the declarator built so far before handing
//! the rest of the chain on.

use crate::frontend::types::{Type, TypeKind};

/// C type of an abstract declarator: `i32 *`, `bool (*)(i32)`
pub fn c_type(ty: &Type) -> String {
    c_declaration(ty, "")
}

/// C declaration of `name` with type `ty`: `i32 *p`, `i32 xs[4]`,
/// `bool (*f)(i32 a)`
pub fn c_declaration(
    ty: &Type,
    name: &str,
) -> String {
    declare(ty.nodes(), name.to_string())
}

fn declare(
    nodes: &[TypeKind],
    declarator: String,
) -> String {
    let Some(first) = nodes.first() else {
        return with_base("void", &declarator);
    };
    let rest = &nodes[1..];
    match first {
        TypeKind::Atomic(name) => with_base(name, &declarator),
        TypeKind::Pointer | TypeKind::Array => declare(rest, format!("*{}", declarator)),
        TypeKind::SizedArray(size) => {
            declare(rest, format!("{}[{}]", grouped(declarator), size))
        }
        TypeKind::Function => function(nodes, declarator),
        // Labels are read by `function`, stray separators carry no C meaning
        TypeKind::VarName(_) | TypeKind::Maps | TypeKind::Join => declare(rest, declarator),
    }
}

/// `(*f)` when a pointer declarator is followed by a suffix
fn grouped(declarator: String) -> String {
    if declarator.starts_with('*') {
        format!("({})", declarator)
    } else {
        declarator
    }
}

fn with_base(
    base: &str,
    declarator: &str,
) -> String {
    if declarator.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, declarator)
    }
}

fn function(
    nodes: &[TypeKind],
    declarator: String,
) -> String {
    let ty = Type::from_nodes(nodes.to_vec());
    let (Ok(args), Ok(ret)) = (ty.get_arguments(), ty.get_return_type()) else {
        return with_base("void", &declarator);
    };
    let params = if args.is_empty() {
        "void".to_string()
    } else {
        args.iter()
            .map(|(name, arg)| c_declaration(arg, name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    declare(
        ret.nodes(),
        format!("{}({})", grouped(declarator), params),
    )
}
