//! Sequence builder tests

use crate::frontend::config::TranslateConfig;
use crate::frontend::context::CompilationContext;
use crate::frontend::error::{ErrorKind, Result};
use crate::frontend::lexer::tokenize;
use crate::frontend::sequence::*;
use crate::frontend::symbols::Body;
use crate::frontend::types::Type;

fn context() -> CompilationContext {
    CompilationContext::new(TranslateConfig::default())
}

fn build(
    ctx: &mut CompilationContext,
    source: &str,
) -> Result<Vec<Sequence>> {
    let tokens = tokenize(source)?;
    SequenceBuilder::new(ctx, &tokens).build_all()
}

fn error_kind(source: &str) -> ErrorKind {
    build(&mut context(), source).unwrap_err().kind()
}

fn error_message(source: &str) -> String {
    build(&mut context(), source).unwrap_err().to_string()
}

/// Items and teardown of the latest `name` body
fn body(
    ctx: &CompilationContext,
    name: &str,
) -> (Vec<Sequence>, Vec<String>) {
    match &ctx.symbols.latest(name).unwrap().body {
        Body::Sequence(Sequence::Scope { items, teardown }) => (items.clone(), teardown.clone()),
        other => panic!("'{}' has no sequenced body: {:?}", name, other),
    }
}

fn text(seq: &Sequence) -> String {
    crate::middle::codegen::inline(seq)
}

mod overloads {
    use super::*;

    const OVERLOADS: &str = "let f(a: i32) -> bool; let f(a: str) -> bool;";

    #[test]
    fn test_resolution_by_argument_type() {
        let mut ctx = context();
        build(&mut ctx, &format!("{} let main() {{ f(5); f(\"x\"); }}", OVERLOADS)).unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(text(&items[0]), "f_FN_i32_MAPS_bool(5)");
        assert_eq!(text(&items[1]), "f_FN_str_MAPS_bool(\"x\")");
        assert!(ctx.referenced.contains("f_FN_i32_MAPS_bool"));
    }

    #[test]
    fn test_no_viable_candidate() {
        let message = error_message(&format!("{} let main() {{ f(5, 5); }}", OVERLOADS));
        assert!(message.contains("no viable candidate for 'f(i32, i32)'"));
        assert!(message.contains("expects 1 argument(s), got 2"));
    }

    #[test]
    fn test_ambiguous_return_types() {
        let source = "let f(a: i32) -> bool; let f(a: i32) -> i32; let main() { f(5); }";
        assert_eq!(error_kind(source), ErrorKind::Sequencing);
        assert!(error_message(source).contains("ambiguous call to 'f'"));
    }

    #[test]
    fn test_undefined_function() {
        assert!(error_message("let main() { nope(1); }").contains("undefined function 'nope'"));
    }

    #[test]
    fn test_operators_resolve_to_builtins() {
        let mut ctx = context();
        build(&mut ctx, "let main() -> bool { 1 + 2 < 4 }").unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(
            items[0],
            Sequence::atom(
                Type::bool(),
                "Less_FN_i32_JOIN_i32_MAPS_bool(Add_FN_i32_JOIN_i32_MAPS_i32(1, 2), 4)"
            )
        );
    }
}

mod scopes {
    use super::*;

    #[test]
    fn test_inner_functions_survive_block_exit() {
        let mut ctx = context();
        build(
            &mut ctx,
            "let main() {
                let x: i32;
                {
                    let y: i32;
                    let f() -> bool { true }
                    f();
                }
                x;
                f();
            }",
        )
        .unwrap();
        let (items, _) = body(&ctx, "main");
        let Sequence::Scope { teardown, .. } = &items[1] else {
            panic!("expected a nested scope");
        };
        assert!(teardown.is_empty());
        assert!(ctx.symbols.contains("f"));
        assert!(!ctx.symbols.contains("x"));
    }

    #[test]
    fn test_inner_bindings_are_dropped() {
        let message = error_message("let main() { { let y: i32; } y; }");
        assert!(message.contains("undefined symbol 'y'"));
    }

    #[test]
    fn test_struct_bindings_are_destroyed_in_reverse() {
        let mut ctx = context();
        build(
            &mut ctx,
            "let node: struct { v: i32, }
             let main() { let a: node; let b: node; }",
        )
        .unwrap();
        let (items, teardown) = body(&ctx, "main");
        assert_eq!(
            teardown,
            vec![
                "Del_FN_PTR_node_MAPS_void(&b);".to_string(),
                "Del_FN_PTR_node_MAPS_void(&a);".to_string(),
            ]
        );
        assert_eq!(text(&items[0]), "node a ; New_FN_PTR_node_MAPS_void(&a)");
    }

    #[test]
    fn test_arguments_are_not_destroyed_by_callee() {
        let mut ctx = context();
        build(&mut ctx, "let node: struct { v: i32, } let take(n: node) { }").unwrap();
        let (_, teardown) = body(&ctx, "take");
        assert!(teardown.is_empty());
    }

    #[test]
    fn test_semicolon_discards_value() {
        let mut ctx = context();
        build(&mut ctx, "let main() -> i32 { 5; }").unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(items[0].ty(), Type::null());
    }

    #[test]
    fn test_unmatched_brace() {
        assert_eq!(error_kind("}"), ErrorKind::Parse);
        assert_eq!(error_kind("let main() { 1"), ErrorKind::Parse);
    }
}

mod control {
    use super::*;

    #[test]
    fn test_condition_must_be_bool() {
        let source = "let main() { if 5 { } }";
        assert_eq!(error_kind(source), ErrorKind::Type);
        assert!(error_message(source).contains("'if' condition must be bool, found i32"));
    }

    #[test]
    fn test_condition_needs_braced_body() {
        assert_eq!(error_kind("let main() { if true ; }"), ErrorKind::Parse);
    }

    #[test]
    fn test_else_needs_if() {
        assert_eq!(error_kind("let main() { else { } }"), ErrorKind::Sequencing);
        assert_eq!(
            error_kind("let main() { while true { } else { } }"),
            ErrorKind::Sequencing
        );
    }

    #[test]
    fn test_else_if_chain() {
        let mut ctx = context();
        build(
            &mut ctx,
            "let main() { if true { } else if false { } else { } }",
        )
        .unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(items.len(), 3);
        assert!(items[0].is_keyword(KeywordKind::If));
        assert!(items[1].is_keyword(KeywordKind::Else));
        assert!(items[2].is_keyword(KeywordKind::Else));
    }

    #[test]
    fn test_while_loop() {
        let mut ctx = context();
        build(&mut ctx, "let main() { let i: i32; while i < 3 { i++; } }").unwrap();
        let (items, _) = body(&ctx, "main");
        let Sequence::Keyword { kind, children } = &items[1] else {
            panic!("expected a loop");
        };
        assert_eq!(*kind, KeywordKind::While);
        assert_eq!(text(&children[0]), "Less_FN_i32_JOIN_i32_MAPS_bool(i, 3)");
        let Sequence::Scope { items: inner, .. } = &children[1] else {
            panic!("expected a loop body");
        };
        assert_eq!(text(&inner[0]), "Incr_FN_PTR_i32_MAPS_void(&i)");
    }
}

mod structs {
    use super::*;

    const POINT: &str = "let point: struct { x, y: i32, }";

    #[test]
    fn test_member_access() {
        let mut ctx = context();
        build(&mut ctx, &format!("{} let main() -> i32 {{ let p: point; p.y }}", POINT)).unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(items[1], Sequence::atom(Type::atomic("i32"), "p.y"));
    }

    #[test]
    fn test_member_access_through_pointer() {
        let mut ctx = context();
        build(&mut ctx, &format!("{} let get(p: ^point) -> i32 {{ p.x }}", POINT)).unwrap();
        let (items, _) = body(&ctx, "get");
        assert_eq!(text(&items[0]), "(*p).x");
    }

    #[test]
    fn test_missing_member() {
        let source = format!("{} let main() {{ let p: point; p.z; }}", POINT);
        assert_eq!(error_kind(&source), ErrorKind::Type);
        assert!(error_message(&source).contains("struct 'point' has no member 'z'"));
    }

    #[test]
    fn test_duplicate_member() {
        assert_eq!(
            error_kind("let s: struct { a: i32, a: bool, }"),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_unit_struct() {
        let mut ctx = context();
        build(&mut ctx, "let unit: struct;").unwrap();
        assert!(ctx.structs.get("unit").unwrap().members.is_empty());
    }

    #[test]
    fn test_user_constructor_replaces_generated() {
        let mut ctx = context();
        build(
            &mut ctx,
            "let node: struct { v: i32, }
             let New(what: ^node) { }",
        )
        .unwrap();
        let signature =
            crate::frontend::symbols::lifecycle_signature(&Type::atomic("node"));
        let index = ctx.symbols.find_exact("New", &signature).unwrap();
        assert!(matches!(
            ctx.symbols.candidates("New")[index].body,
            Body::Sequence(_)
        ));
    }
}

mod statements {
    use super::*;

    #[test]
    fn test_erase_struct() {
        let source = "let point: struct { x: i32, }
                      erase!(\"point\")
                      let main() -> i32 { let p: point; p.x }";
        assert_eq!(error_kind(source), ErrorKind::Type);
        assert!(error_message(source).contains("exists, but is erased"));
    }

    #[test]
    fn test_erase_symbol() {
        let source = "let g() -> i32 { 1 } erase!(\"g\") let main() -> i32 { g() }";
        assert!(error_message(source).contains("erased"));
    }

    #[test]
    fn test_erase_needs_strings() {
        assert_eq!(error_kind("erase!(g)"), ErrorKind::Sequencing);
    }

    #[test]
    fn test_alloc_outside_method() {
        let source = "let main() { let p: ^i32; alloc!(p); }";
        assert_eq!(error_kind(source), ErrorKind::Sequencing);
    }

    #[test]
    fn test_alloc_and_free_inside_method() {
        let mut ctx = context();
        build(&mut ctx, "let Make(p: ^^i32) { alloc!(^p, 4); free!(^p); }").unwrap();
        let (items, _) = body(&ctx, "Make");
        assert_eq!(text(&items[0]), "(*p) = (i32 *)malloc(sizeof(i32) * (4))");
        assert_eq!(text(&items[1]), "free((*p))");
    }

    #[test]
    fn test_alloc_count_must_be_integer() {
        let source = "let Make(p: ^^i32) { alloc!(^p, true); }";
        assert_eq!(error_kind(source), ErrorKind::Type);
    }

    #[test]
    fn test_indexing() {
        let mut ctx = context();
        build(&mut ctx, "let first(xs: ^i32) -> i32 { xs[0] }").unwrap();
        let (items, _) = body(&ctx, "first");
        assert_eq!(items[0], Sequence::atom(Type::atomic("i32"), "(*&xs)[0]"));
    }

    #[test]
    fn test_function_pointer_assignment() {
        let mut ctx = context();
        build(
            &mut ctx,
            "let g(a: i32) -> bool { true }
             let main() { let f: ^(i32) -> bool; f = g; }",
        )
        .unwrap();
        let (items, _) = body(&ctx, "main");
        assert_eq!(text(&items[0]), "bool (*f)(i32)");
        assert_eq!(text(&items[1]), "(*&f) = g_FN_i32_MAPS_bool");
    }

    #[test]
    fn test_function_pointer_type_mismatch() {
        let source = "let g(a: str) -> bool { true }
                      let main() { let f: ^(i32) -> bool; f = g; }";
        assert_eq!(error_kind(source), ErrorKind::Type);
    }

    #[test]
    fn test_declaration_cannot_assign() {
        assert_eq!(
            error_kind("let main() { let x: i32 = 5; }"),
            ErrorKind::Sequencing
        );
    }

    #[test]
    fn test_top_level_variable_is_declared_only() {
        let mut ctx = context();
        let sequences = build(&mut ctx, "let counter: i32;").unwrap();
        assert!(sequences.is_empty());
        assert_eq!(ctx.symbols.latest("counter").unwrap().ty, Type::atomic("i32"));
    }

    #[test]
    fn test_prototype_then_definition() {
        let mut ctx = context();
        build(&mut ctx, "let f() -> i32; let f() -> i32 { 1 }").unwrap();
        let candidates = ctx.symbols.candidates("f");
        assert_eq!(candidates.len(), 1);
        assert!(matches!(candidates[0].body, Body::Sequence(_)));
    }

    #[test]
    fn test_redefinition() {
        let source = "let f() -> i32 { 1 } let f() -> i32 { 2 }";
        assert_eq!(error_kind(source), ErrorKind::Parse);
        assert!(error_message(source).contains("redefinition of 'f'"));
    }

    #[test]
    fn test_errors_carry_location() {
        let err = build(&mut context(), "let main() {\n  nope;\n}").unwrap_err();
        let location = err.location().unwrap();
        assert_eq!(location.line, 2);
        assert_eq!(location.code.as_deref(), Some("nope"));
    }

    #[test]
    fn test_oversized_integer_literal() {
        let err = build(
            &mut context(),
            &format!("let main() -> i128 {{\n  {}\n}}", "9".repeat(42)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
        assert_eq!(err.location().map(|l| l.line), Some(2));
    }
}

mod dump {
    use super::*;

    #[test]
    fn test_keywords_serialize_with_node_tag() {
        let mut ctx = context();
        build(&mut ctx, "let main() { if true { } }").unwrap();
        let (items, _) = body(&ctx, "main");
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["node"], "keyword");
        assert_eq!(json["kind"], "if");
        assert_eq!(json["children"][0]["node"], "atom");
        assert_eq!(json["children"][1]["node"], "scope");
    }
}
