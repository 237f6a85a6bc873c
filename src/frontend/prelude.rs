//! Built-in operator overloads
//!
//! Seeds the symbol table with the primitive scalar operations the desugarer
//! targets. Every body is a `static inline` C definition emitted only when
//! the translation references it.

use crate::frontend::symbols::{mangle_symbol, Body, SymbolTable};
use crate::frontend::types::Type;
use crate::middle::codegen::c_declaration;
use tracing::debug;

pub const INTEGER_TYPES: &[&str] = &[
    "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "u128", "i128",
];

pub const FLOAT_TYPES: &[&str] = &["f32", "f64", "f128"];

/// `(a: T, b: T) -> T` on every numeric type
const ARITHMETIC: &[(&str, &str)] = &[("Add", "+"), ("Sub", "-"), ("Mult", "*"), ("Div", "/")];

/// `(a: T, b: T) -> bool`
const COMPARISON: &[(&str, &str)] = &[
    ("Less", "<"),
    ("Great", ">"),
    ("Leq", "<="),
    ("Greq", ">="),
    ("Eq", "=="),
    ("Neq", "!="),
];

/// `(a: T, b: T) -> T` on integers only
const BITWISE: &[(&str, &str)] = &[
    ("Mod", "%"),
    ("And", "&"),
    ("Or", "|"),
    ("Xor", "^"),
    ("Lbs", "<<"),
    ("Rbs", ">>"),
];

/// `(what: ^T, b: T) -> void`
const COMPOUND: &[(&str, &str)] = &[
    ("AddEq", "+="),
    ("SubEq", "-="),
    ("MultEq", "*="),
    ("DivEq", "/="),
];

const INTEGER_COMPOUND: &[(&str, &str)] = &[
    ("ModEq", "%="),
    ("AndEq", "&="),
    ("OrEq", "|="),
    ("XorEq", "^="),
];

/// Whether a type is one of the built-in integer scalars
pub fn is_integer(ty: &Type) -> bool {
    ty.atomic_name().is_some_and(|n| INTEGER_TYPES.contains(&n))
}

fn arg(
    name: &str,
    ty: &Type,
) -> (String, Type) {
    (name.to_string(), ty.clone())
}

/// Declare one builtin with its C body
fn builtin(
    symbols: &mut SymbolTable,
    name: &str,
    args: &[(String, Type)],
    ret: Type,
    body: &str,
) {
    let ty = Type::function(args, ret);
    let mangled = mangle_symbol(name, &ty);
    let text = format!(
        "static inline {} {{\n    {}\n}}",
        c_declaration(&ty, &mangled),
        body
    );
    symbols.declare(name, ty, Body::Builtin(text));
}

fn binary(
    symbols: &mut SymbolTable,
    scalar: &Type,
    table: &[(&str, &str)],
    ret: &Type,
) {
    let args = [arg("a", scalar), arg("b", scalar)];
    for (name, op) in table {
        builtin(symbols, name, &args, ret.clone(), &format!("return a {} b;", op));
    }
}

fn compound(
    symbols: &mut SymbolTable,
    scalar: &Type,
    table: &[(&str, &str)],
) {
    let args = [arg("what", &scalar.clone().pointer_to()), arg("b", scalar)];
    for (name, op) in table {
        builtin(symbols, name, &args, Type::void(), &format!("*what {} b;", op));
    }
}

/// Copy, New and Del for a scalar with the given zero value
fn lifecycle(
    symbols: &mut SymbolTable,
    scalar: &Type,
    zero: &str,
) {
    let target = arg("what", &scalar.clone().pointer_to());
    builtin(
        symbols,
        "Copy",
        &[target.clone(), arg("from", scalar)],
        Type::void(),
        "*what = from;",
    );
    builtin(symbols, "New", &[target.clone()], Type::void(), &format!("*what = {};", zero));
    builtin(symbols, "Del", &[target], Type::void(), "(void)what;");
}

fn numeric(
    symbols: &mut SymbolTable,
    name: &str,
    integer: bool,
) {
    let scalar = Type::atomic(name);
    binary(symbols, &scalar, ARITHMETIC, &scalar);
    binary(symbols, &scalar, COMPARISON, &Type::bool());
    compound(symbols, &scalar, COMPOUND);
    builtin(symbols, "Neg", &[arg("a", &scalar)], scalar.clone(), "return -a;");

    let target = [arg("what", &scalar.clone().pointer_to())];
    builtin(symbols, "Incr", &target, Type::void(), "++*what;");
    builtin(symbols, "Decr", &target, Type::void(), "--*what;");

    if integer {
        binary(symbols, &scalar, BITWISE, &scalar);
        compound(symbols, &scalar, INTEGER_COMPOUND);
    }
    lifecycle(symbols, &scalar, "0");
}

/// Seed a symbol table with every primitive operation
pub fn install(symbols: &mut SymbolTable) {
    for name in INTEGER_TYPES {
        numeric(symbols, name, true);
    }
    for name in FLOAT_TYPES {
        numeric(symbols, name, false);
    }

    let boolean = Type::bool();
    binary(
        symbols,
        &boolean,
        &[("Andd", "&&"), ("Orr", "||"), ("Eq", "=="), ("Neq", "!=")],
        &boolean,
    );
    builtin(symbols, "Not", &[arg("a", &boolean)], boolean.clone(), "return !a;");
    lifecycle(symbols, &boolean, "false");

    let string = Type::atomic("str");
    let pair = [arg("a", &string), arg("b", &string)];
    builtin(symbols, "Eq", &pair, Type::bool(), "return strcmp(a, b) == 0;");
    builtin(symbols, "Neq", &pair, Type::bool(), "return strcmp(a, b) != 0;");
    lifecycle(symbols, &string, "\"\"");

    debug!("prelude installed {} symbol names", symbols.len());
}
