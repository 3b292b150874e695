//! Ready-made extensions: English operator synonyms, calendar dates,
//! times of day, a `print` statement and bare URIs.
//!
//! ```
//! use fscript::{Frontend, std_plugins};
//!
//! let mut frontend = Frontend::default();
//! std_plugins::register_defaults(&mut frontend).expect("plugins compile");
//! let program = frontend.parse("if total is not 0 and open then print total").expect("parses");
//! assert_eq!(program.statements.len(), 1);
//! ```

use crate::ast::Expr;
use crate::error::{ErrorKind, ScriptError};
use crate::lexer::LexPlugin;
use crate::parser::{Frontend, Parser};
use crate::registry::{Grammar, Plugin, PluginKind, PluginMatch, StartToken};
use crate::scanner::Scanner;
use crate::scope::Resolve;
use crate::token::{Token, TokenData, TokenKind};
use crate::value::Value;

/// Multi-word synonyms, longest phrases first so `is not` is tried
/// before `is`.
pub const SYNONYMS: &[(&str, &str)] = &[
    ("is not", "!="),
    ("is less than", "<"),
    ("is greater than", ">"),
    ("is at most", "<="),
    ("is at least", ">="),
    ("is", "=="),
    ("equals", "=="),
    ("and", "&&"),
    ("or", "||"),
    ("not", "!"),
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Register every plugin in this module on `frontend`.
///
/// # Errors
///
/// `InvalidGrammar` if a pattern fails to compile.
pub fn register_defaults(frontend: &mut Frontend) -> Result<(), ScriptError> {
    for (phrase, replacement) in SYNONYMS {
        frontend.register_plugin(Box::new(SynonymPlugin::new(phrase, replacement)))?;
    }
    frontend
        .register_plugin(Box::new(DatePlugin))?
        .register_plugin(Box::new(TimePlugin))?
        .register_plugin(Box::new(PrintPlugin))?
        .register_lex_plugin(Box::new(UriLexPlugin));
    Ok(())
}

/// Rewrites a word or phrase into a single operator token.
#[derive(Debug, Clone)]
pub struct SynonymPlugin {
    phrase: String,
    replacement: String,
}

impl SynonymPlugin {
    #[must_use]
    pub fn new(phrase: &str, replacement: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

impl Plugin for SynonymPlugin {
    fn name(&self) -> &str {
        &self.phrase
    }

    fn kind(&self) -> PluginKind {
        PluginKind::TokenReplace
    }

    fn start_tokens(&self) -> Vec<StartToken> {
        self.phrase
            .split_whitespace()
            .next()
            .map(StartToken::text)
            .into_iter()
            .collect()
    }

    fn grammar(&self) -> Grammar {
        Grammar::Pattern(self.phrase.clone())
    }

    /// A script variable called `is` or `and` keeps its meaning.
    fn can_start(&self, token: &TokenData, resolver: &dyn Resolve) -> bool {
        !resolver.is_defined(token.text())
    }

    fn replace_token(&self, _found: &PluginMatch, _first: &TokenData) -> Option<Token> {
        let text = self.replacement.as_str();
        Some(
            Token::symbol(text)
                .or_else(|| Token::keyword(text))
                .unwrap_or_else(|| Token::ident(text)),
        )
    }
}

/// `june 5`, `jun 5, 2024` as a date constant.
#[derive(Debug, Clone, Copy)]
pub struct DatePlugin;

impl DatePlugin {
    /// Full names, then three-letter abbreviations.
    fn month_names() -> Vec<String> {
        let mut names: Vec<String> = MONTHS.iter().map(|m| (*m).to_string()).collect();
        names.extend(MONTHS.iter().filter(|m| m.len() > 3).map(|m| m[..3].to_string()));
        names
    }
}

impl Plugin for DatePlugin {
    fn name(&self) -> &str {
        "date"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Expression
    }

    fn start_tokens(&self) -> Vec<StartToken> {
        Self::month_names()
            .into_iter()
            .flat_map(|name| {
                let mut title = name.clone();
                title[..1].make_ascii_uppercase();
                [StartToken::Text(name), StartToken::Text(title)]
            })
            .collect()
    }

    fn grammar(&self) -> Grammar {
        Grammar::Pattern(format!(
            "$month:({}) $day:@number (, $year:@number)?",
            Self::month_names().join("|")
        ))
    }

    fn can_start(&self, token: &TokenData, resolver: &dyn Resolve) -> bool {
        token.kind() == TokenKind::Ident && !resolver.is_defined(token.text())
    }

    fn build_expr(&self, parser: &mut Parser<'_>, found: &PluginMatch) -> Result<Expr, ScriptError> {
        let month_text = found.text("month").unwrap_or_default().to_ascii_lowercase();
        let month = MONTHS
            .iter()
            .position(|m| m.starts_with(&month_text))
            .map_or(0, |i| i + 1);
        let day = found.value("day").and_then(Value::as_number).unwrap_or(0.0);
        let year = found.value("year").and_then(Value::as_number);

        let (Ok(month), Some(day)) = (u32::try_from(month), whole(day)) else {
            return Err(parser.error(invalid_date(&month_text, day)));
        };
        let year = match year.map(whole) {
            None => None,
            Some(Some(y)) => i32::try_from(y).ok(),
            Some(None) => return Err(parser.error(invalid_date(&month_text, f64::from(day)))),
        };
        if day == 0 || day > days_in_month(month, year) {
            return Err(parser.error(invalid_date(&month_text, f64::from(day))));
        }
        Ok(Expr::constant(Value::Date { year, month, day }))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole(n: f64) -> Option<u32> {
    (n.fract().abs() < f64::EPSILON && (0.0..=f64::from(u32::MAX)).contains(&n)).then(|| n as u32)
}

fn invalid_date(month: &str, day: f64) -> ErrorKind {
    ErrorKind::InvalidStatement(format!("invalid date: {month} {day}"))
}

const fn days_in_month(month: u32, year: Option<i32>) -> u32 {
    match month {
        2 => match year {
            Some(y) if y % 4 == 0 && (y % 100 != 0 || y % 400 == 0) => 29,
            Some(_) => 28,
            None => 29,
        },
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// `at 9:30pm` as a time-of-day constant.
#[derive(Debug, Clone, Copy)]
pub struct TimePlugin;

impl Plugin for TimePlugin {
    fn name(&self) -> &str {
        "time"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Expression
    }

    fn start_tokens(&self) -> Vec<StartToken> {
        vec![StartToken::text("at")]
    }

    fn grammar(&self) -> Grammar {
        Grammar::Pattern("at $time:@time".to_string())
    }

    fn can_start(&self, token: &TokenData, resolver: &dyn Resolve) -> bool {
        !resolver.is_defined(token.text())
    }

    fn build_expr(&self, parser: &mut Parser<'_>, found: &PluginMatch) -> Result<Expr, ScriptError> {
        match found.value("time") {
            Some(value @ Value::Time(_)) => Ok(Expr::constant(value.clone())),
            _ => Err(parser.error(ErrorKind::InvalidStatement(
                "time of day expected after 'at'".to_string(),
            ))),
        }
    }
}

/// `print a, b` as a call into the host's `print` binding.
#[derive(Debug, Clone, Copy)]
pub struct PrintPlugin;

impl Plugin for PrintPlugin {
    fn name(&self) -> &str {
        "print"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Statement
    }

    fn start_tokens(&self) -> Vec<StartToken> {
        vec![StartToken::text("print")]
    }

    fn grammar(&self) -> Grammar {
        Grammar::AutoMatch
    }

    fn can_start(&self, token: &TokenData, resolver: &dyn Resolve) -> bool {
        !resolver.is_defined(token.text())
    }

    fn build_expr(&self, parser: &mut Parser<'_>, _found: &PluginMatch) -> Result<Expr, ScriptError> {
        parser.tokens().advance(1, false)?;
        let mut args = Vec::new();
        if !parser.tokens().is_end_of_stmt_or_block() {
            args.push(parser.parse_expression()?);
            while parser.tokens().is(",") {
                parser.tokens().advance(1, true)?;
                args.push(parser.parse_expression()?);
            }
        }
        Ok(Expr::binding_call("print", args))
    }
}

/// Lexes `scheme://rest` into one string literal.
#[derive(Debug, Clone, Copy)]
pub struct UriLexPlugin;

impl LexPlugin for UriLexPlugin {
    fn name(&self) -> &str {
        "uri"
    }

    fn claims(&self, token: &TokenData, scanner: &Scanner) -> bool {
        token.kind() == TokenKind::Ident
            && scanner.current() == Some(':')
            && scanner.peek() == Some('/')
            && scanner.peek_at(2) == Some('/')
    }

    fn lex(&self, token: &TokenData, scanner: &mut Scanner) -> Result<Token, ScriptError> {
        let mut uri = token.text().to_string();
        while let Some(c) = scanner.current() {
            if c.is_whitespace() || matches!(c, ',' | ';' | ')' | ']' | '}' | '"' | '\'') {
                break;
            }
            uri.push(c);
            scanner.advance();
        }
        log::trace!("lexed uri '{uri}'");
        Ok(Token::quoted(uri.clone(), uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::ast::Program;
    use crate::formatter::format_expr;

    fn parse(src: &str) -> Result<Program, ScriptError> {
        let mut frontend = Frontend::default();
        register_defaults(&mut frontend).expect("should register");
        frontend.parse(src)
    }

    fn value_of(program: &Program, index: usize) -> Option<Value> {
        match &program.statements[index].kind {
            ExprKind::Assign {
                value: Some(value), ..
            } => value.as_constant().cloned(),
            _ => None,
        }
    }

    #[test]
    fn synonyms_become_operators() {
        let program = parse("if x is not 3 and y is less than 2 then z = 1").expect("should parse");
        assert_eq!(
            format_expr(&program.statements[0]),
            "if ((x != 3) && (y < 2)) {\n\tz = 1\n}"
        );
    }

    #[test]
    fn defined_names_are_not_rewritten() {
        let program = parse("var times = 2\nx = times").expect("should parse");
        assert_eq!(format_expr(&program.statements[1]), "x = times");
    }

    #[test]
    fn dates() {
        let program = parse("a = june 5, 2024\nb = Dec 25").expect("should parse");
        assert_eq!(
            value_of(&program, 0),
            Some(Value::Date {
                year: Some(2024),
                month: 6,
                day: 5
            })
        );
        assert_eq!(
            value_of(&program, 1),
            Some(Value::Date {
                year: None,
                month: 12,
                day: 25
            })
        );
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let err = parse("d = feb 29, 2023").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidStatement(_)));
        assert!(parse("d = feb 29, 2024").is_ok());
    }

    #[test]
    fn date_argument_leaves_the_following_comma() {
        let program = parse("print june 5, x").expect("should parse");
        assert_eq!(format_expr(&program.statements[0]), "print(--06-05, x)");

        let program = parse("print june 5, 2024, x").expect("should parse");
        assert_eq!(format_expr(&program.statements[0]), "print(2024-06-05, x)");
    }

    #[test]
    fn month_named_variable_steps_aside() {
        let program = parse("may = 3\nx = may + 1").expect("should parse");
        assert_eq!(format_expr(&program.statements[1]), "x = (may + 1)");
    }

    #[test]
    fn times() {
        let program = parse("t = at 9:30pm").expect("should parse");
        assert_eq!(value_of(&program, 0), Some(Value::Time(21 * 3600 + 30 * 60)));
    }

    #[test]
    fn print_statement() {
        let program = parse("print \"total\", 1 + 2").expect("should parse");
        assert_eq!(
            format_expr(&program.statements[0]),
            "print(\"total\", (1 + 2))"
        );
        assert!(matches!(
            program.statements[0].kind,
            ExprKind::BindingCall { .. }
        ));
    }

    #[test]
    fn uris_lex_as_strings() {
        let program = parse("site = https://example.com/a?b=1").expect("should parse");
        assert_eq!(
            value_of(&program, 0),
            Some(Value::Str("https://example.com/a?b=1".to_string()))
        );
    }
}
