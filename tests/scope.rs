//! Name resolution while parsing.

use fscript::ast::{Callee, Expr, ExprKind};
use fscript::formatter::format_expr;
use fscript::scope::{FunctionMeta, ScopeId, ScopeKind};
use fscript::{Frontend, Program, parse_str};

fn parse(input: &str) -> Program {
    parse_str(input).unwrap_or_else(|e| panic!("failed to parse: {e}\n--- input ---\n{input}"))
}

fn defines(program: &Program, scope: ScopeId, name: &str) -> bool {
    program
        .symbols
        .scope(scope)
        .is_some_and(|s| s.symbols.contains_key(name))
}

fn callee(expr: &Expr) -> &Callee {
    match &expr.kind {
        ExprKind::Call { callee, .. } => callee,
        other => panic!("expected a call, got {other:?}"),
    }
}

// -----------------------------------------------------------
// Block scopes.
// -----------------------------------------------------------

#[test]
fn block_variables_are_invisible_afterwards() {
    let program = parse("if a { var t = 1 }");
    assert!(!program.symbols.contains("t"));
    let ExprKind::If { then, .. } = &program.statements[0].kind else {
        panic!("expected if");
    };
    assert!(defines(&program, then.scope, "t"));
    assert_eq!(
        program.symbols.scope(then.scope).map(|s| s.kind),
        Some(ScopeKind::Block)
    );
}

#[test]
fn nodes_record_the_scope_they_were_parsed_in() {
    let program = parse("if a { b = 1 }");
    let ExprKind::If { then, .. } = &program.statements[0].kind else {
        panic!("expected if");
    };
    let ExprKind::Block(body) = &then.kind else {
        panic!("expected block");
    };
    assert_eq!(body[0].scope, then.scope);
    assert_eq!(program.statements[0].scope, fscript::scope::GLOBAL_SCOPE);
}

#[test]
fn assignment_defines_only_unknown_names() {
    let program = parse("var n = 0\nif a { n = 1; m = 2 }");
    let ExprKind::If { then, .. } = &program.statements[1].kind else {
        panic!("expected if");
    };
    assert!(!defines(&program, then.scope, "n"));
    assert!(defines(&program, then.scope, "m"));
    assert!(program.symbols.is_var("n"));
    assert!(!program.symbols.contains("m"));
}

#[test]
fn each_block_gets_its_own_scope() {
    let program = parse("if a { }\nwhile b { }\n{ c = 1 }");
    assert_eq!(program.symbols.scope_count(), 4);
}

#[test]
fn loop_and_handler_names_stay_inside() {
    let program = parse(
        "for (var i = 0; i < 3; i++) { }\n\
         for (item in list) { }\n\
         try { } catch (e) { }",
    );
    for name in ["i", "item", "e"] {
        assert!(!program.symbols.contains(name), "{name} leaked");
    }

    assert!(defines(&program, program.statements[0].scope, "i"));
    let ExprKind::ForEach { body, .. } = &program.statements[1].kind else {
        panic!("expected foreach");
    };
    assert!(defines(&program, body.scope, "item"));
    let ExprKind::TryCatch { handler, .. } = &program.statements[2].kind else {
        panic!("expected try");
    };
    assert!(defines(&program, handler.scope, "e"));
}

// -----------------------------------------------------------
// Functions.
// -----------------------------------------------------------

#[test]
fn parameters_shadow_outer_variables() {
    let program = parse("var x = 1\nfunction f(x) {\n\treturn x\n}");
    let ExprKind::FunctionDeclare(decl) = &program.statements[1].kind else {
        panic!("expected function");
    };
    assert!(defines(&program, decl.scope, "x"));
    assert_eq!(decl.body[0].scope, decl.scope);
    assert!(program.symbols.is_var("x"));
    assert!(program.symbols.is_func("f"));
}

#[test]
fn functions_can_call_themselves() {
    let program = parse("function fact(n) {\n\treturn n * fact(n - 1)\n}");
    assert_eq!(
        format_expr(&program.statements[0]),
        "function fact(n) {\n\treturn (n * fact((n - 1)))\n}"
    );
    let decl = program.symbols.function_decl("fact").expect("declaration");
    assert_eq!(decl.meta.params, vec!["n"]);
}

#[test]
fn aliases_call_the_function() {
    let program = parse("function greet, hello(name) { }\nhello \"bob\"");
    assert_eq!(format_expr(&program.statements[1]), "hello(\"bob\")");
    assert_eq!(
        program.symbols.function("hello").map(|m| m.name.as_str()),
        Some("greet")
    );
}

#[test]
fn wildcard_functions_answer_to_longer_names() {
    let program = parse("function find_by*(v) { }\nx = find_by_name \"z\"");
    assert_eq!(format_expr(&program.statements[1]), "x = find_by_name(\"z\")");
}

#[test]
fn calls_before_the_declaration_are_plain_expressions() {
    let program = parse("f(1)\nfunction f() { }\nf(2)");
    assert!(matches!(callee(&program.statements[0]), Callee::Expr(_)));
    assert_eq!(callee(&program.statements[2]), &Callee::Named("f".to_string()));
}

#[test]
fn lambda_parameters_stay_inside() {
    let program = parse("g = function(a) { return a }\nb = a");
    assert!(!program.symbols.contains("a"));
    assert!(program.symbols.is_var("g"));
}

// -----------------------------------------------------------
// Host symbols.
// -----------------------------------------------------------

#[test]
fn host_modules_and_functions() {
    let mut frontend = Frontend::default();
    frontend
        .define_module("math")
        .define_function(FunctionMeta::new("notify", &["who"]));

    let program = frontend
        .parse("x = math.min(1, 2)\nnotify \"me\", x")
        .expect("parse");
    let ExprKind::Assign { value, .. } = &program.statements[0].kind else {
        panic!("expected assignment");
    };
    let value = value.as_ref().expect("value");
    assert_eq!(callee(value), &Callee::Named("math.min".to_string()));
    assert_eq!(format_expr(&program.statements[1]), "notify(\"me\", x)");
}

#[test]
fn host_symbols_do_not_leak_between_frontends() {
    let mut frontend = Frontend::default();
    frontend.define_function(FunctionMeta::new("notify", &[]));
    assert!(frontend.parse("notify").expect("parse").symbols.is_func("notify"));
    assert!(!parse("notify").symbols.is_func("notify"));
}
