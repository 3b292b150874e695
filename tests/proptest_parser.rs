//! Property-based tests for expression parsing.
//!
//! Random expressions are parsed, formatted, and parsed again; the
//! fully parenthesized output must be a fixed point. Operator chains
//! check grouping against the precedence table directly.

use fscript::ast::Operator;
use fscript::formatter::format_expr;
use fscript::{format, parse_str};
use proptest::prelude::*;

const OPERATORS: &[&str] = &[
    "*", "/", "%", "+", "-", "<", "<=", ">", ">=", "==", "!=", "&&", "||",
];

// -- Strategies --

fn operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(OPERATORS)
}

/// Variable names that can never collide with keywords or literals.
fn variable() -> impl Strategy<Value = String> {
    "v_[a-z]{0,4}"
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![(0u16..1000).prop_map(|n| n.to_string()), variable()]
}

fn expression() -> impl Strategy<Value = String> {
    operand().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            3 => (inner.clone(), operator(), inner.clone())
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            1 => inner.clone().prop_map(|e| format!("({e})")),
            1 => inner.prop_map(|e| format!("!{e}")),
        ]
    })
}

fn precedence(symbol: &str) -> u8 {
    Operator::from_symbol(symbol)
        .map(Operator::precedence)
        .unwrap_or_default()
}

fn only_statement(input: &str) -> String {
    let program = parse_str(input)
        .unwrap_or_else(|e| panic!("failed to parse: {e}\n--- input ---\n{input}"));
    assert_eq!(program.statements.len(), 1, "{input}");
    format_expr(&program.statements[0])
}

// -- Properties --

proptest! {
    #[test]
    fn formatting_is_a_fixed_point(expr in expression()) {
        let input = format!("x = {expr}");
        let first = format(&parse_str(&input).expect("generated expression parses"));
        let second = format(&parse_str(&first).expect("formatted expression parses"));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn equal_precedence_groups_left(operands in prop::collection::vec(operand(), 2..8)) {
        let input = format!("x = {}", operands.join(" - "));
        let mut expected = operands[0].clone();
        for operand in &operands[1..] {
            expected = format!("({expected} - {operand})");
        }
        prop_assert_eq!(only_statement(&input), format!("x = {expected}"));
    }

    #[test]
    fn tighter_operator_binds_first(
        a in variable(),
        b in variable(),
        c in variable(),
        first in operator(),
        second in operator(),
    ) {
        let input = format!("x = {a} {first} {b} {second} {c}");
        let expected = if precedence(first) < precedence(second) {
            format!("x = ({a} {first} ({b} {second} {c}))")
        } else {
            format!("x = (({a} {first} {b}) {second} {c})")
        };
        prop_assert_eq!(only_statement(&input), expected);
    }

    #[test]
    fn explicit_parentheses_override_precedence(
        a in variable(),
        b in variable(),
        c in variable(),
        first in operator(),
        second in operator(),
    ) {
        let input = format!("x = {a} {first} ({b} {second} {c})");
        prop_assert_eq!(
            only_statement(&input),
            format!("x = ({a} {first} ({b} {second} {c}))")
        );
    }
}
