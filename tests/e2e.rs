//! Whole scripts through lexer, parser and formatter.

mod common;

use common::{assert_format_is_stable, parse_with_plugins};
use fscript::ast::ExprKind;
use fscript::{Frontend, ParserConfig, format, parse_str};

// -----------------------------------------------------------
// Canonical formatting of complete scripts.
// -----------------------------------------------------------

const INVENTORY: &str = "\
var items = [3, 1, 2]; var total = 0
for item in items {
  total += item
}
function describe(n) {
  if n > 2 then return \"big #{n}\"
  else { return \"small\" }
}
result = { count: total, label: describe(total) }
";

#[test]
fn inventory_script_formats_canonically() {
    let program = parse_str(INVENTORY).expect("parse");
    assert_eq!(
        format(&program),
        "var items = [3, 1, 2]\n\
         var total = 0\n\
         for (item in items) {\n\ttotal += item\n}\n\
         function describe(n) {\n\
         \tif (n > 2) {\n\t\treturn \"big #{n}\"\n\t} else {\n\t\treturn \"small\"\n\t}\n\
         }\n\
         result = {count: total, label: describe(total)}\n"
    );
}

#[test]
fn inventory_script_format_is_stable() {
    assert_format_is_stable(INVENTORY);
}

#[test]
fn callbacks_and_chains_are_stable() {
    assert_format_is_stable(
        "handlers = [function(e) { log = e }]\n\
         handlers[0](\"x\")\n\
         config = {\"retry count\": 3, nested: {on: true}}\n\
         config.nested.on = !config.nested.on\n",
    );
}

#[test]
fn loops_and_errors_are_stable() {
    assert_format_is_stable(
        "var attempts = 0\n\
         while attempts < 5 {\n\
         \tattempts++\n\
         \ttry {\n\t\tif attempts % 2 == 0 then continue\n\t\tthrow \"odd\"\n\t}\n\
         \tcatch (err) {\n\t\tlast = err\n\t}\n\
         }\n\
         for (var i = 10; i > 0; i -= 3) { countdown = i }\n",
    );
}

#[test]
fn crlf_and_lf_scripts_parse_alike() {
    let lf = "var a = 1\nif a then b = a * 2\n";
    let crlf = lf.replace('\n', "\r\n");
    let left = format(&parse_str(lf).expect("lf"));
    let right = format(&parse_str(&crlf).expect("crlf"));
    assert_eq!(left, right);
}

// -----------------------------------------------------------
// Scripts using the standard plugins.
// -----------------------------------------------------------

const STATUS: &str = "\
var due = june 30, 2024
reminder = at 9:30am
site = https://status.example.com/api
function check(url) {
    if url is not null and retries is at most 3 then return true
    return false
}
print \"checking #{site}\", due
";

#[test]
fn status_script_with_plugins() {
    let program = parse_with_plugins(STATUS).expect("parse");
    assert_eq!(
        format(&program),
        "var due = 2024-06-30\n\
         reminder = 09:30\n\
         site = \"https://status.example.com/api\"\n\
         function check(url) {\n\
         \tif ((url != null) && (retries <= 3)) {\n\t\treturn true\n\t}\n\
         \treturn false\n\
         }\n\
         print(\"checking #{site}\", due)\n"
    );
    assert!(program.symbols.is_var("due"));
    assert!(program.symbols.is_func("check"));
}

#[test]
fn plugins_are_not_active_without_registration() {
    assert!(parse_str("due = june 30").is_err());
    assert!(parse_with_plugins("due = june 30").is_ok());
}

// -----------------------------------------------------------
// Configuration.
// -----------------------------------------------------------

#[test]
fn custom_interpolation_marker() {
    let frontend = Frontend::new(ParserConfig::new().interpolation_marker('$'));
    let program = frontend.parse("name = 1\ngreeting = \"hi ${name}\"").expect("parse");
    let ExprKind::Assign { value, .. } = &program.statements[1].kind else {
        panic!("expected assignment");
    };
    let value = value.as_ref().expect("value");
    assert!(matches!(value.kind, ExprKind::Interpolated(_)));
    assert_eq!(format(&program).lines().nth(1), Some("greeting = \"hi #{name}\""));
}

#[test]
fn error_deep_in_a_script_names_file_and_line() {
    let frontend = Frontend::new(ParserConfig::new().file("jobs.fs"));
    let err = frontend
        .parse("a = 1\nb = 2\nif a {\n\tc = (1 +\n}\n")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Syntax error: unexpected token '}' at line 5, column 1 in jobs.fs"
    );
}
