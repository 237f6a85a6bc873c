//! Operator desugaring tests

use crate::frontend::desugar::*;
use crate::frontend::lexer::tokenize;

fn sugar(source: &str) -> String {
    desugar(&tokenize(source).unwrap()).unwrap().join(" ")
}

#[test]
fn test_assignment_passes_target_by_reference() {
    assert_eq!(sugar("x = 5"), "Copy ( @ x , 5 )");
    assert_eq!(sugar("x += y"), "AddEq ( @ x , y )");
    assert_eq!(sugar("a . b = 1"), "Copy ( @ ( a . b ) , 1 )");
}

#[test]
fn test_assignment_groups_right() {
    assert_eq!(sugar("a = b = c"), "Copy ( @ a , Copy ( @ b , c ) )");
}

#[test]
fn test_postfix_increment() {
    assert_eq!(sugar("i ++"), "Incr ( @ i )");
    assert_eq!(sugar("i --"), "Decr ( @ i )");
    assert!(desugar(&tokenize("i ++ j").unwrap()).is_err());
}

#[test]
fn test_arithmetic_groups_left() {
    assert_eq!(sugar("a - b - c"), "Sub ( Sub ( a , b ) , c )");
    assert_eq!(sugar("a / b / c"), "Div ( Div ( a , b ) , c )");
}

#[test]
fn test_level_order() {
    // comparison is split before boolean operators
    assert_eq!(
        sugar("a && b < c"),
        "Less ( Andd ( a , b ) , c )"
    );
    // multiplicative is split before additive
    assert_eq!(sugar("a * b + c"), "Mult ( a , Add ( b , c ) )");
    // bitwise binds tightest
    assert_eq!(sugar("a + b & c"), "Add ( a , And ( b , c ) )");
}

#[test]
fn test_parentheses_override_levels() {
    assert_eq!(sugar("( a + b ) * c"), "Mult ( ( Add ( a , b ) ) , c )");
}

#[test]
fn test_shifts_are_not_comparisons() {
    assert_eq!(sugar("a < < 2"), "Lbs ( a , 2 )");
    assert_eq!(sugar("a > > b"), "Rbs ( a , b )");
    assert_eq!(sugar("a < < 2 == b"), "Eq ( Lbs ( a , 2 ) , b )");
}

#[test]
fn test_unary_operators() {
    assert_eq!(sugar("! done"), "Not ( done )");
    assert_eq!(sugar("- x"), "Neg ( x )");
    assert_eq!(sugar("x = - 5"), "Copy ( @ x , -5 )");
    assert_eq!(sugar("a * - b"), "Mult ( a , Neg ( b ) )");
    assert_eq!(sugar("a - - 1"), "Sub ( a , -1 )");
}

#[test]
fn test_reference_and_dereference() {
    assert_eq!(sugar("p = @ x"), "Copy ( @ p , @ x )");
    assert_eq!(sugar("^ p + 1"), "Add ( ^ p , 1 )");
    assert_eq!(sugar("^ p = 3"), "Copy ( @ ( ^ p ) , 3 )");
}

#[test]
fn test_calls_desugar_arguments() {
    assert_eq!(sugar("f ( a + 1 , b )"), "f ( Add ( a , 1 ) , b )");
    assert_eq!(sugar("f ( )"), "f ( )");
    assert_eq!(sugar("f ( g ( x ) ) * 2"), "Mult ( f ( g ( x ) ) , 2 )");
}

#[test]
fn test_indexing_and_members() {
    assert_eq!(sugar("v [ 2 ]"), "Get ( @ v , 2 )");
    assert_eq!(sugar("v [ i + 1 ] . len"), "Get ( @ v , Add ( i , 1 ) ) . len");
    assert_eq!(sugar("a . b [ 0 ] = 1"), "Copy ( @ ( Get ( @ ( a . b ) , 0 ) ) , 1 )");
}

#[test]
fn test_strings_are_operands() {
    assert_eq!(sugar("s = \"hi\""), "Copy ( @ s , \"hi\" )");
}

#[test]
fn test_instantiation_passes_through() {
    assert_eq!(sugar("swap < i32 >"), "swap < i32 >");
}

#[test]
fn test_tree_shape() {
    let expr = parse_expr(&tokenize("a + b").unwrap()).unwrap();
    assert_eq!(
        expr,
        Expr::Call(
            "Add".into(),
            vec![Expr::Atom("a".into()), Expr::Atom("b".into())]
        )
    );
}

#[test]
fn test_malformed_expressions() {
    for source in ["a +", "( a", "a )", "f ( a , , b )", "a . + b", "+ a"] {
        let tokens = tokenize(source).unwrap();
        assert!(desugar(&tokens).is_err(), "'{}' should fail", source);
    }
}
