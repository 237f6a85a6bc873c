//! Symbol table tests

use crate::frontend::symbols::*;
use crate::frontend::types::Type;

fn i32_t() -> Type {
    Type::atomic("i32")
}

fn f_type() -> Type {
    Type::function(&[], Type::bool())
}

fn never(_: &Type) -> bool {
    false
}

#[test]
fn test_overloads_keep_declaration_order() {
    let mut table = SymbolTable::new();
    let a = Type::function(&[("a".into(), i32_t())], Type::bool());
    let b = Type::function(&[("a".into(), Type::atomic("str"))], Type::bool());
    assert_eq!(table.declare("f", a.clone(), Body::None), 0);
    assert_eq!(table.declare("f", b.clone(), Body::None), 1);
    assert_eq!(table.candidates("f")[0].ty, a);
    assert_eq!(table.latest("f").map(|c| &c.ty), Some(&b));
}

#[test]
fn test_erase_hides_without_removing() {
    let mut table = SymbolTable::new();
    table.declare("x", i32_t(), Body::None);
    assert!(table.erase("x"));
    assert_eq!(table.candidates("x").len(), 1);
    assert!(table.latest("x").is_none());
    assert!(!table.erase("missing"));
}

#[test]
fn test_scope_exit_keeps_functions_and_outer_bindings() {
    let mut table = SymbolTable::new();
    table.declare("x", i32_t(), Body::None);
    let snapshot = table.snapshot();

    table.declare("y", i32_t(), Body::None);
    table.declare("f", f_type(), Body::None);

    let teardown = table.restore(snapshot, |ty| !ty.is_atomic("i32"));
    assert!(teardown.is_empty());
    assert!(table.contains("x"));
    assert!(table.contains("f"));
    assert!(!table.contains("y"));
}

#[test]
fn test_shadowing_binding_is_dropped() {
    let mut table = SymbolTable::new();
    table.declare("x", i32_t(), Body::None);
    let snapshot = table.snapshot();
    table.declare("x", i32_t(), Body::None);

    table.restore(snapshot, never);
    assert_eq!(table.candidates("x").len(), 1);
}

#[test]
fn test_dropped_struct_gets_destructor() {
    let mut table = SymbolTable::new();
    let snapshot = table.snapshot();
    table.declare("a", Type::atomic("node"), Body::None);
    table.declare("b", Type::atomic("node"), Body::None);

    let teardown = table.restore(snapshot, |ty| ty.is_atomic("node"));
    assert_eq!(
        teardown,
        vec![
            "Del_FN_PTR_node_MAPS_void(&b);".to_string(),
            "Del_FN_PTR_node_MAPS_void(&a);".to_string(),
        ]
    );
}

#[test]
fn test_mangle_symbol() {
    let ty = Type::function(&[("a".into(), i32_t()), ("b".into(), i32_t())], i32_t());
    assert_eq!(mangle_symbol("Add", &ty), "Add_FN_i32_JOIN_i32_MAPS_i32");
    assert_eq!(mangle_symbol("main", &ty), "main");
}

#[test]
fn test_struct_table() {
    let mut structs = StructTable::new();
    let mut data = StructData::default();
    data.members.insert("next".into(), Type::atomic("node").pointer_to());
    data.members.insert("value".into(), i32_t());
    structs.define("node", data);

    let node = structs.get("node").unwrap();
    assert_eq!(node.members.keys().collect::<Vec<_>>(), vec!["next", "value"]);
    assert_eq!(node.member("value"), Some(&i32_t()));

    assert!(structs.erase("node"));
    assert!(structs.get("node").unwrap().erased);
    assert!(!structs.erase("leaf"));
}
