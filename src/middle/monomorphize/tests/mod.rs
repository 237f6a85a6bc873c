//! Template instantiation tests

use crate::frontend::config::TranslateConfig;
use crate::frontend::context::CompilationContext;
use crate::frontend::error::{ErrorKind, Result};
use crate::frontend::lexer::tokenize;
use crate::frontend::sequence::{Sequence, SequenceBuilder};
use crate::frontend::symbols::Body;
use crate::frontend::types::Type;
use crate::middle::monomorphize::*;

fn context() -> CompilationContext {
    CompilationContext::new(TranslateConfig::default())
}

fn run(
    ctx: &mut CompilationContext,
    source: &str,
) -> Result<Vec<Sequence>> {
    let tokens = tokenize(source)?;
    SequenceBuilder::new(ctx, &tokens).build_all()
}

fn actuals(list: &[&str]) -> Vec<Vec<String>> {
    list.iter()
        .map(|a| a.split(' ').map(String::from).collect())
        .collect()
}

#[test]
fn test_substitute_replaces_whole_tokens() {
    let body: Vec<String> = ["value", ":", "T", ",", "Tx", ":", "T"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let out = substitute(&body, &["T".to_string()], &actuals(&["^ i32"]));
    assert_eq!(
        out,
        vec!["value", ":", "^", "i32", ",", "Tx", ":", "^", "i32"]
    );
}

#[test]
fn test_struct_template_canonical_name() {
    let mut ctx = context();
    run(&mut ctx, "let Pair<A, B>: struct { first: A, second: B, }").unwrap();
    assert!(ctx.structs.get("Pair").is_none());

    let name = instantiate_struct(&mut ctx, "Pair", &actuals(&["i32", "bool"])).unwrap();
    assert_eq!(name, "Pair__i32_bool_");
    let data = ctx.structs.get(&name).unwrap();
    assert_eq!(data.member("first"), Some(&Type::atomic("i32")));
    assert_eq!(data.member("second"), Some(&Type::bool()));
}

#[test]
fn test_struct_instances_are_memoised() {
    let mut ctx = context();
    run(&mut ctx, "let Box<T>: struct { value: T, }").unwrap();
    instantiate_struct(&mut ctx, "Box", &actuals(&["i32"])).unwrap();
    let structs = ctx.structs.len();
    let news = ctx.symbols.candidates("New").len();

    instantiate_struct(&mut ctx, "Box", &actuals(&["i32"])).unwrap();
    assert_eq!(ctx.structs.len(), structs);
    assert_eq!(ctx.symbols.candidates("New").len(), news);
}

#[test]
fn test_self_referential_struct_template() {
    let mut ctx = context();
    run(&mut ctx, "let List<T>: struct { value: T, next: ^List<T>, }").unwrap();
    let name = instantiate_struct(&mut ctx, "List", &actuals(&["i32"])).unwrap();
    let data = ctx.structs.get(&name).unwrap();
    assert_eq!(
        data.member("next"),
        Some(&Type::atomic("List__i32_").pointer_to())
    );
}

#[test]
fn test_struct_instance_gets_lifecycle() {
    let mut ctx = context();
    run(&mut ctx, "let Box<T>: struct { value: T, next: ^Box<T>, }").unwrap();
    instantiate_struct(&mut ctx, "Box", &actuals(&["i32"])).unwrap();

    let signature = crate::frontend::symbols::lifecycle_signature(&Type::atomic("Box__i32_"));
    let index = ctx.symbols.find_exact("New", &signature).unwrap();
    match &ctx.symbols.candidates("New")[index].body {
        Body::Builtin(text) => {
            assert!(text.contains("New_FN_PTR_i32_MAPS_void(&what->value);"));
            assert!(text.contains("what->next = NULL;"));
        }
        other => panic!("expected a generated constructor, got {:?}", other),
    }
}

#[test]
fn test_nested_generic_actuals() {
    let mut ctx = context();
    run(
        &mut ctx,
        "let Box<T>: struct { value: T, } let Pair<A, B>: struct { first: A, second: B, }",
    )
    .unwrap();
    let name = instantiate_struct(&mut ctx, "Pair", &actuals(&["Box < i32 >", "bool"])).unwrap();
    assert_eq!(name, "Pair__Box__i32__bool_");
    assert!(ctx.structs.contains("Box__i32_"));
}

#[test]
fn test_function_template_instantiation() {
    let mut ctx = context();
    run(&mut ctx, "let id<T>(x: T) -> T { x }").unwrap();
    assert!(!ctx.symbols.contains("id"));

    let signature = instantiate_function(&mut ctx, "id", &actuals(&["i32"]))
        .unwrap()
        .unwrap();
    let i32 = Type::atomic("i32");
    assert_eq!(signature, Type::function(&[("x".into(), i32.clone())], i32));
    let candidates = ctx.symbols.candidates("id");
    assert_eq!(candidates.len(), 1);
    assert!(matches!(candidates[0].body, Body::Sequence(_)));
}

#[test]
fn test_redundant_function_instantiation() {
    let mut ctx = context();
    run(&mut ctx, "let id<T>(x: T) -> T { x }").unwrap();
    instantiate_function(&mut ctx, "id", &actuals(&["bool"])).unwrap();
    instantiate_function(&mut ctx, "id", &actuals(&["bool"])).unwrap();
    assert_eq!(ctx.symbols.candidates("id").len(), 1);

    instantiate_function(&mut ctx, "id", &actuals(&["i32"])).unwrap();
    assert_eq!(ctx.symbols.candidates("id").len(), 2);
}

#[test]
fn test_instantiation_from_expression() {
    let mut ctx = context();
    run(
        &mut ctx,
        "let id<T>(x: T) -> T { x }
         let main() -> i32 { id<i32>; id(5) }",
    )
    .unwrap();
    let main = ctx.symbols.latest("main").unwrap();
    let Body::Sequence(Sequence::Scope { items, .. }) = &main.body else {
        panic!("main has no body");
    };
    assert_eq!(
        items.last(),
        Some(&Sequence::atom(Type::atomic("i32"), "id_FN_i32_MAPS_i32(5)"))
    );
}

#[test]
fn test_arity_mismatch() {
    let mut ctx = context();
    run(&mut ctx, "let id<T>(x: T) -> T { x }").unwrap();
    let err = instantiate(&mut ctx, "id", &actuals(&["i32", "bool"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sequencing);
    assert!(err.to_string().contains("arity"));
}

#[test]
fn test_unknown_template() {
    let mut ctx = context();
    let err = instantiate(&mut ctx, "Nope", &actuals(&["i32"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Sequencing);
    assert!(err.to_string().contains("undefined template 'Nope'"));
}

#[test]
fn test_generic_function_requires_body() {
    let mut ctx = context();
    let err = run(&mut ctx, "let id<T>(x: T) -> T;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}
