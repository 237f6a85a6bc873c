//! Lexer unit tests

use crate::frontend::lexer::*;

fn toks(source: &str) -> Vec<String> {
    tokenize(source).unwrap()
}

#[cfg(test)]
mod lexer_basic_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        assert!(toks("").is_empty());
        assert!(toks("   \t\n\r  ").is_empty());
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            toks("let x: i32;"),
            vec!["let", "x", ":", "i32", ";"]
        );
    }

    #[test]
    fn test_function_signature() {
        assert_eq!(
            toks("let f(a: ^i32) -> bool;"),
            vec!["let", "f", "(", "a", ":", "^", "i32", ")", "->", "bool", ";"]
        );
    }

    #[test]
    fn test_multi_char_operators() {
        assert_eq!(
            toks("a += b == c && d++"),
            vec!["a", "+=", "b", "==", "c", "&&", "d", "++"]
        );
        assert_eq!(toks("x: []i32"), vec!["x", ":", "[]", "i32"]);
    }

    #[test]
    fn test_shift_is_two_tokens() {
        // Keeps `List<List<i32>>` splittable
        assert_eq!(toks("a >> b"), vec!["a", ">", ">", "b"]);
    }
}

#[cfg(test)]
mod lexer_literal_tests {
    use super::*;

    #[test]
    fn test_numbers() {
        assert_eq!(toks("3.0 42 7u8"), vec!["3.0", "42", "7u8"]);
    }

    #[test]
    fn test_number_followed_by_member_access() {
        assert_eq!(toks("1.x"), vec!["1", ".", "x"]);
    }

    #[test]
    fn test_strings_keep_quotes() {
        assert_eq!(
            toks(r#"print("a b" , 'c')"#),
            vec!["print", "(", "\"a b\"", ",", "'c'", ")"]
        );
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(toks(r#""a\"b""#), vec![r#""a\"b""#]);
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("\"abc"),
            Err(LexError::UnterminatedString { line: 1 })
        ));
    }
}

#[cfg(test)]
mod lexer_macro_tests {
    use super::*;

    #[test]
    fn test_macro_token() {
        assert_eq!(
            toks("include!(\"x.oak\");"),
            vec!["include!", "(", "\"x.oak\"", ")", ";"]
        );
        assert!(is_macro("include!"));
        assert!(!is_macro("!"));
    }

    #[test]
    fn test_not_equal_is_not_a_macro() {
        assert_eq!(toks("a!=b"), vec!["a", "!=", "b"]);
    }

    #[test]
    fn test_pattern_tokens() {
        assert_eq!(toks("Inc($X)"), vec!["Inc", "(", "$X", ")"]);
        assert_eq!(toks("$$"), vec!["$$"]);
    }

    #[test]
    fn test_lex_pattern_keeps_dollar_words() {
        assert_eq!(
            lex_pattern("$<$ ( $ ) $>").unwrap(),
            vec!["$<$", "(", "$", ")", "$>"]
        );
        assert_eq!(lex_pattern("$X + 1").unwrap(), vec!["$X", "+", "1"]);
        assert_eq!(lex_pattern("Inc($X)").unwrap(), vec!["Inc", "(", "$X", ")"]);
        assert_eq!(lex_pattern("f($X, $Y)").unwrap(), vec!["f", "(", "$X", ",", "$Y", ")"]);
        assert_eq!(lex_pattern("$-;").unwrap(), vec!["$-;"]);
    }
}

#[cfg(test)]
mod lexer_line_tests {
    use super::*;

    #[test]
    fn test_line_markers() {
        assert_eq!(
            toks("a\n\nb c\n// comment\nd"),
            vec!["a", "//__LINE__=3", "b", "c", "//__LINE__=5", "d"]
        );
    }

    #[test]
    fn test_block_comment_advances_lines() {
        assert_eq!(toks("/* one\ntwo */ x"), vec!["//__LINE__=2", "x"]);
    }

    #[test]
    fn test_parse_marker() {
        assert_eq!(parse_line_marker(&line_marker(17)), Some(17));
        assert_eq!(parse_line_marker("x"), None);
        assert!(is_line_marker("//__LINE__=1"));
    }
}
