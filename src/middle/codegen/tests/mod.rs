//! Code generation tests

use crate::frontend::config::TranslateConfig;
use crate::frontend::context::CompilationContext;
use crate::frontend::lexer::tokenize;
use crate::frontend::sequence::{KeywordKind, Sequence, SequenceBuilder};
use crate::frontend::types::Type;
use crate::middle::codegen::*;

fn scope(
    items: Vec<Sequence>,
    teardown: &[&str],
) -> Sequence {
    Sequence::Scope {
        items,
        teardown: teardown.iter().map(|s| s.to_string()).collect(),
    }
}

fn render(
    declaration: &str,
    body: &Sequence,
) -> String {
    let mut buffer = CodeBuffer::new();
    buffer.function(declaration, body);
    buffer.finish()
}

fn unit(source: &str) -> String {
    let mut ctx = CompilationContext::new(TranslateConfig::default());
    let tokens = tokenize(source).unwrap();
    SequenceBuilder::new(&mut ctx, &tokens).build_all().unwrap();
    emit_unit(&ctx)
}

#[test]
fn test_typed_tail_is_returned() {
    let body = scope(vec![Sequence::atom(Type::atomic("i32"), "5")], &[]);
    assert_eq!(render("i32 main(void)", &body), "i32 main(void) {\n    return (5);\n}\n");
}

#[test]
fn test_void_tail_is_a_statement() {
    let body = scope(vec![Sequence::atom(Type::void(), "g()")], &[]);
    assert_eq!(render("void f(void)", &body), "void f(void) {\n    g();\n}\n");
}

#[test]
fn test_return_is_hoisted_past_teardown() {
    let body = scope(
        vec![
            Sequence::Line {
                items: vec![
                    Sequence::atom(Type::null(), "node n"),
                    Sequence::atom(Type::null(), ";"),
                    Sequence::atom(Type::void(), "New(&n)"),
                ],
                ty: Type::null(),
            },
            Sequence::atom(Type::atomic("i32"), "x"),
        ],
        &["Del(&n);"],
    );
    assert_eq!(
        render("i32 f(void)", &body),
        "i32 f(void) {\n    node n ; New(&n);\n    i32 __ret = x;\n    Del(&n);\n    return __ret;\n}\n"
    );
}

#[test]
fn test_keywords() {
    let body = scope(
        vec![
            Sequence::Keyword {
                kind: KeywordKind::If,
                children: vec![
                    Sequence::atom(Type::bool(), "c"),
                    scope(vec![Sequence::atom(Type::null(), "a()")], &[]),
                ],
            },
            Sequence::Keyword {
                kind: KeywordKind::Else,
                children: vec![scope(vec![Sequence::atom(Type::null(), "b()")], &[])],
            },
        ],
        &[],
    );
    assert_eq!(
        render("void f(void)", &body),
        "void f(void) {\n    if (c) {\n        a();\n    }\n    else {\n        b();\n    }\n}\n"
    );
}

#[test]
fn test_inline_skips_empty_atoms() {
    let line = Sequence::Line {
        items: vec![
            Sequence::atom(Type::null(), "a"),
            Sequence::atom(Type::null(), ""),
            Sequence::atom(Type::null(), "b"),
        ],
        ty: Type::null(),
    };
    assert_eq!(inline(&line), "a b");
}

#[test]
fn test_unit_structs_and_lifecycle() {
    let c = unit("let node: struct { value: i32, next: ^node, } let main() -> i32 { 0 }");
    assert!(c.contains("typedef struct node node;"));
    assert!(c.contains("struct node {\n    i32 value;\n    node *next;\n};"));
    assert!(c.contains("static inline void New_FN_PTR_node_MAPS_void(node *what) {"));
    assert!(c.contains("i32 main(void) {\n    return (0);\n}"));
}

#[test]
fn test_unit_emits_only_referenced_builtins() {
    let c = unit("let main() -> i32 { 1 + 2 }");
    assert!(c.contains("static inline i32 Add_FN_i32_JOIN_i32_MAPS_i32(i32 a, i32 b) {\n    return a + b;\n}"));
    assert!(c.contains("return (Add_FN_i32_JOIN_i32_MAPS_i32(1, 2));"));
    assert!(!c.contains("Sub_FN_i32_JOIN_i32_MAPS_i32"));
}

#[test]
fn test_unit_globals() {
    let c = unit("let counter: i32; let main() -> i32 { counter }");
    assert!(c.contains("\ni32 counter;\n"));
    assert!(c.contains("return (counter);"));
}

#[test]
fn test_unit_header() {
    let c = unit("let main() { }");
    assert!(c.starts_with("#include <stdbool.h>"));
    assert!(c.contains("typedef int32_t i32;"));
    assert!(c.contains("void main(void) {\n}"));
}
