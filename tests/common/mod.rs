#![allow(dead_code)]

use fscript::{Frontend, Program, ScriptError, format, formatter::format_expr, std_plugins};

/// Parse with the standard plugins registered.
pub fn parse_with_plugins(input: &str) -> Result<Program, ScriptError> {
    let mut frontend = Frontend::default();
    std_plugins::register_defaults(&mut frontend).expect("plugins should register");
    frontend.parse(input)
}

/// Canonical text of statement `index`.
pub fn statement(input: &str, index: usize) -> String {
    let program = fscript::parse_str(input)
        .unwrap_or_else(|e| panic!("failed to parse: {e}\n--- input ---\n{input}"));
    format_expr(&program.statements[index])
}

/// Helper: format, parse the output again, and require the same text.
pub fn assert_format_is_stable(input: &str) {
    let first = format(&fscript::parse_str(input).expect("parse failed"));
    let reparsed = fscript::parse_str(&first).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{first}"
        )
    });
    let second = format(&reparsed);
    assert_eq!(
        first, second,
        "format mismatch:\n--- first ---\n{first}\n--- second ---\n{second}"
    );
}
