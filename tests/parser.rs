//! Statement forms and syntax errors.

mod common;

use common::statement;
use fscript::ast::ExprKind;
use fscript::{ErrorCategory, ErrorKind, ScriptError, Span, parse_str};

fn error(input: &str) -> ScriptError {
    parse_str(input).expect_err("script should not parse")
}

fn expected(what: &str, found: &str) -> ErrorKind {
    ErrorKind::Expected {
        expected: what.to_string(),
        found: found.to_string(),
    }
}

// -----------------------------------------------------------
// Declarations and assignments.
// -----------------------------------------------------------

#[test]
fn multiple_declarations() {
    assert_eq!(
        statement("var a = 1, b, c = a + 1", 0),
        "var a = 1, b, c = (a + 1)"
    );
}

#[test]
fn compound_assignments() {
    assert_eq!(statement("x = 1\nx += 2\nx *= x - 1", 1), "x += 2");
    assert_eq!(statement("x = 1\nx += 2\nx *= x - 1", 2), "x *= (x - 1)");
}

#[test]
fn member_and_index_targets() {
    assert_eq!(statement("m.k = 1", 0), "m.k = 1");
    assert_eq!(statement("m[\"a\"] = 2", 0), "m[\"a\"] = 2");
}

#[test]
fn operators_group_by_precedence() {
    assert_eq!(statement("x = -y + !z", 0), "x = (-y + !z)");
    assert_eq!(statement("x = a < b == c", 0), "x = ((a < b) == c)");
    assert_eq!(
        statement("x = a || b && c % 2 == 0", 0),
        "x = (a || (b && ((c % 2) == 0)))"
    );
}

#[test]
fn groups_take_member_index_and_call_links() {
    assert_eq!(statement("x = (a + b).len", 0), "x = (a + b).len");
    assert_eq!(statement("y = (items)[0]", 0), "y = items[0]");
    assert_eq!(statement("z = (f)(1)(2)", 0), "z = f(1)(2)");
    assert_eq!(statement("w = (!a).b", 0), "w = (!a).b");
    assert_eq!(statement("(m).k = 1", 0), "m.k = 1");
}

#[test]
fn link_targets_keep_their_parentheses() {
    common::assert_format_is_stable(
        "w = (!a).b\nv = (-1).abs\nu = (x++).y\nt = (function(a) { return a })(1)",
    );
}

// -----------------------------------------------------------
// Statement separators and line breaks.
// -----------------------------------------------------------

#[test]
fn semicolons_separate_statements() {
    let program = parse_str("a = 1; b = 2;; c = 3;").expect("parse");
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn line_breaks_inside_groups_and_after_operators() {
    assert_eq!(statement("x = (1\n+ 2)", 0), "x = (1 + 2)");
    assert_eq!(statement("y = 3 *\n4", 0), "y = (3 * 4)");
    assert_eq!(statement("f(1,\n2\n)", 0), "f(1, 2)");
    assert_eq!(statement("x = !(a\n&& b)", 0), "x = !(a && b)");
    assert_eq!(statement("x = -(\n1 + 2\n).abs", 0), "x = -(1 + 2).abs");
}

#[test]
fn empty_script() {
    let program = parse_str("\n\n// nothing here\n").expect("parse");
    assert!(program.statements.is_empty());
    assert_eq!(program.symbols.scope_count(), 1);
}

// -----------------------------------------------------------
// Control flow.
// -----------------------------------------------------------

#[test]
fn if_else_chain() {
    assert_eq!(
        statement("if a { b = 1 } else if c { b = 2 } else { b = 3 }", 0),
        "if a {\n\tb = 1\n} else if c {\n\tb = 2\n} else {\n\tb = 3\n}"
    );
}

#[test]
fn else_may_start_a_new_line() {
    let program = parse_str("if a {\n\tb = 1\n}\nelse {\n\tb = 2\n}").expect("parse");
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(
        program.statements[0].kind,
        ExprKind::If {
            otherwise: Some(_),
            ..
        }
    ));
}

#[test]
fn then_bodies() {
    assert_eq!(
        statement("if a then b = 1 else b = 2", 0),
        "if a {\n\tb = 1\n} else {\n\tb = 2\n}"
    );
    assert_eq!(statement("while i < 3 then i++", 0), "while (i < 3) {\n\ti++\n}");
}

#[test]
fn loops() {
    assert_eq!(statement("for x in [1, 2] { }", 0), "for (x in [1, 2]) {}");
    assert_eq!(
        statement("for (i = 0; i < 3; i += 1) { }", 0),
        "for (i = 0; (i < 3); i += 1) {}"
    );
    assert_eq!(
        statement("while true { if a then break; continue }", 0),
        "while true {\n\tif a {\n\t\tbreak\n\t}\n\tcontinue\n}"
    );
}

#[test]
fn try_catch_without_parentheses() {
    assert_eq!(
        statement("try { throw \"bad\" } catch err { log = err }", 0),
        "try {\n\tthrow \"bad\"\n} catch (err) {\n\tlog = err\n}"
    );
}

#[test]
fn return_value_is_optional() {
    assert_eq!(
        statement("function f() {\n\treturn\n}", 0),
        "function f {\n\treturn\n}"
    );
    assert_eq!(
        statement("function g(a) { return a * 2 }", 0),
        "function g(a) {\n\treturn (a * 2)\n}"
    );
}

#[test]
fn nodes_carry_positions() {
    let program = parse_str("x = 1\n  if x then y = 2").expect("parse");
    assert_eq!(program.statements[0].span, Span::new(1, 1));
    assert_eq!(program.statements[1].span, Span::new(2, 3));
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn unclosed_block() {
    assert_eq!(error("if a {\n\tb = 1\n").kind, expected("}", ""));
}

#[test]
fn unclosed_call() {
    assert_eq!(error("f(1, 2").kind, expected(")", ""));
}

#[test]
fn missing_value() {
    assert_eq!(error("x = ").kind, expected("expression", ""));
}

#[test]
fn missing_body() {
    assert_eq!(error("while a\n").kind, expected("{", "new line"));
    assert_eq!(error("if a then").kind, expected("statement", ""));
}

#[test]
fn try_needs_catch() {
    assert_eq!(error("try { } x").kind, expected("catch", "x"));
}

#[test]
fn bad_map_key() {
    assert_eq!(error("m = {[1]: 2}").kind, expected("map key", "["));
}

#[test]
fn misplaced_keywords_and_symbols() {
    assert_eq!(
        error("else { }").kind,
        ErrorKind::UnexpectedToken("else".to_string())
    );
    assert_eq!(
        error("x = 1 }").kind,
        ErrorKind::UnexpectedToken("}".to_string())
    );
}

#[test]
fn operands_without_operator() {
    assert_eq!(
        error("x = [1 2]").kind,
        ErrorKind::MissingOperator("2".to_string())
    );
    assert_eq!(
        error("return 1 2").kind,
        ErrorKind::MissingOperator("2".to_string())
    );
}

#[test]
fn unassignable_targets() {
    for input in ["1 = 2", "f() = 2", "a + b = 3"] {
        let err = error(input);
        assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget, "{input}");
        assert_eq!(err.span, Span::new(1, 1), "{input}");
    }
}

#[test]
fn error_reports_category_and_position() {
    let err = error("x = 1\ny = )");
    assert_eq!(err.category(), ErrorCategory::Syntax);
    assert_eq!(err.span, Span::new(2, 5));
    assert_eq!(
        err.to_string(),
        "Syntax error: unexpected token ')' at line 2, column 5"
    );
}

#[test]
fn lexical_errors_surface_through_the_parser() {
    let err = error("x = \"open");
    assert_eq!(err.category(), ErrorCategory::Lexical);
    assert_eq!(err.kind, ErrorKind::UnterminatedString);
}

// -----------------------------------------------------------
// Serialization.
// -----------------------------------------------------------

#[test]
fn program_serializes_to_json() {
    let program = parse_str("var x = [1, \"a\"]").expect("parse");
    let json = serde_json::to_value(&program).expect("serialize");
    assert_eq!(json["statements"][0]["span"]["line"], 1);
    assert!(json["statements"][0]["kind"]["Assign"]["declare"]
        .as_bool()
        .expect("declare flag"));
    assert!(json["symbols"].is_object());
}
