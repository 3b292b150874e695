//! Lexer edge cases and error tests.

use fscript::token::{InterpolationPart, TokenValue};
use fscript::{ErrorCategory, ErrorKind, Frontend, Span, Token, TokenKind, tokenize};

mod common;

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .expect("tokenize")
        .iter()
        .map(fscript::TokenData::kind)
        .collect()
}

// -----------------------------------------------------------
// Basic lexer behaviour.
// -----------------------------------------------------------

#[test]
fn lex_empty_input() {
    assert_eq!(kinds(""), vec![TokenKind::End]);
}

#[test]
fn lex_only_whitespace() {
    assert_eq!(
        kinds("   \t  \n\n  "),
        vec![TokenKind::NewLine, TokenKind::NewLine, TokenKind::End]
    );
}

#[test]
fn keywords_are_whole_words() {
    let tokens = tokenize("var variable iffy if").expect("tokenize");
    assert_eq!(tokens[0].kind(), TokenKind::Keyword);
    assert_eq!(tokens[1].kind(), TokenKind::Ident);
    assert_eq!(tokens[2].kind(), TokenKind::Ident);
    assert_eq!(tokens[3].kind(), TokenKind::Keyword);
}

#[test]
fn number_values() {
    let tokens = tokenize("3.25 10").expect("tokenize");
    assert_eq!(tokens[0].token.as_number(), Some(3.25));
    assert_eq!(tokens[1].token.as_number(), Some(10.0));
}

#[test]
fn single_quotes_never_interpolate() {
    let tokens = tokenize("'a #{b}'").expect("tokenize");
    assert_eq!(tokens[0].kind(), TokenKind::Str);
    assert_eq!(tokens[0].token.as_str(), Some("a #{b}"));
}

#[test]
fn positions_track_lines_and_crlf() {
    let tokens = tokenize("a\r\n  b").expect("tokenize");
    assert_eq!(tokens[0].span, Span::new(1, 1));
    assert_eq!(tokens[1].token.text, "\r\n");
    assert_eq!(tokens[2].span, Span::new(2, 3));
    assert_eq!(tokens[2].offset, 5);
}

// -----------------------------------------------------------
// Interpolation.
// -----------------------------------------------------------

#[test]
fn interpolation_with_text_on_both_sides() {
    let tokens = tokenize("\"a #{1+2} b\"").expect("tokenize");
    let TokenValue::Parts(parts) = &tokens[0].token.value else {
        panic!("expected parts");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2], InterpolationPart::Text(" b".to_string()));
}

#[test]
fn interpolation_alone_is_one_part() {
    let tokens = tokenize("\"#{x}\"").expect("tokenize");
    let TokenValue::Parts(parts) = &tokens[0].token.value else {
        panic!("expected parts");
    };
    assert_eq!(parts.len(), 1);
    assert!(matches!(parts[0], InterpolationPart::Tokens(_)));
}

#[test]
fn interpolation_keeps_inner_braces() {
    let tokens = tokenize("\"#{ {k: 1}.k }\"").expect("tokenize");
    let TokenValue::Parts(parts) = &tokens[0].token.value else {
        panic!("expected parts");
    };
    let InterpolationPart::Tokens(inner) = &parts[0] else {
        panic!("expected tokens");
    };
    let texts: Vec<&str> = inner.iter().map(fscript::TokenData::text).collect();
    assert_eq!(texts, vec!["{", "k", ":", "1", "}", ".", "k", ""]);
}

// -----------------------------------------------------------
// Lexer errors.
// -----------------------------------------------------------

#[test]
fn unterminated_block_comment() {
    let err = tokenize("x = 1 /* never closed").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedComment);
    assert_eq!(err.span, Span::new(1, 7));
    assert_eq!(err.category(), ErrorCategory::Lexical);
}

#[test]
fn unterminated_interpolation() {
    let err = tokenize("\"a #{b\"").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Lexical);
}

#[test]
fn stray_character() {
    let err = tokenize("a @ b").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedCharacter('@'));
    assert_eq!(err.to_string(), "Lexical error: unexpected character: @ at line 1, column 3");
}

// -----------------------------------------------------------
// Rules and lexical plugins through the front end.
// -----------------------------------------------------------

#[test]
fn replacement_rules_feed_the_parser() {
    let mut frontend = Frontend::default();
    frontend
        .rules_mut()
        .replace("plus", Token::symbol("+").expect("symbol"))
        .remove("please");
    let program = frontend.parse("x = 1 plus 2 please").expect("parse");
    assert_eq!(fscript::format(&program), "x = (1 + 2)\n");
}

#[test]
fn uri_plugin_claims_scheme_words() {
    let mut frontend = Frontend::default();
    fscript::std_plugins::register_defaults(&mut frontend).expect("register");
    let tokens = frontend.tokenize("go https://a.io/x?y=1 now").expect("tokenize");
    assert_eq!(tokens[1].kind(), TokenKind::Str);
    assert_eq!(tokens[1].token.as_str(), Some("https://a.io/x?y=1"));
    assert!(tokens[2].is("now"));
    assert!(common::parse_with_plugins("u = ftp://files.local/a.txt").is_ok());
}
