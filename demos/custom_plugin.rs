//! Register a grammar extension that turns `repeat N times { ... }`
//! into a counted loop.

use fscript::ast::{AssignOp, CompareOp, Expr, ExprKind};
use fscript::scope::ScopeKind;
use fscript::{
    Frontend, Grammar, Parser, Plugin, PluginKind, PluginMatch, ScriptError, StartToken,
};

struct Repeat;

impl Plugin for Repeat {
    fn name(&self) -> &str {
        "repeat"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::Statement
    }

    fn start_tokens(&self) -> Vec<StartToken> {
        vec![StartToken::text("repeat")]
    }

    fn grammar(&self) -> Grammar {
        Grammar::Pattern("repeat $count:@number times".to_string())
    }

    fn build_expr(&self, parser: &mut Parser<'_>, found: &PluginMatch) -> Result<Expr, ScriptError> {
        let count = found
            .value("count")
            .and_then(fscript::Value::as_number)
            .unwrap_or_default();

        let scope = parser.symbols_mut().push_scope(ScopeKind::Block);
        parser.symbols_mut().define_var("_n");
        let mut body = Vec::new();
        parser.tokens().expect("{", true)?;
        loop {
            parser.tokens().skip_new_lines()?;
            if parser.tokens().is("}") || parser.tokens().is_ended() {
                break;
            }
            if let Some(statement) = parser.parse_statement()? {
                body.push(statement);
            }
        }
        parser.tokens().expect("}", false)?;
        parser
            .symbols_mut()
            .pop_scope()
            .map_err(|kind| parser.error(kind))?;

        let counter = Expr::var("_n").in_scope(scope);
        Ok(Expr::new(
            ExprKind::For {
                init: Box::new(Expr::assign(
                    counter.clone(),
                    AssignOp::Assign,
                    Some(Expr::number(0.0)),
                    true,
                )),
                condition: Box::new(Expr::compare(
                    CompareOp::Less,
                    counter.clone(),
                    Expr::number(count),
                )),
                step: Box::new(Expr::assign(
                    counter,
                    AssignOp::Add,
                    Some(Expr::number(1.0)),
                    false,
                )),
                body: Box::new(Expr::block(body).in_scope(scope)),
            },
            parser.span(),
            scope,
        ))
    }
}

fn main() {
    let mut frontend = Frontend::default();
    if let Err(e) = frontend.register_plugin(Box::new(Repeat)) {
        eprintln!("Error: {e}");
        return;
    }

    match frontend.parse("x = 1\nrepeat 3 times {\n\tx = x * 2\n}\n") {
        Ok(program) => print!("{}", fscript::format(&program)),
        Err(e) => eprintln!("Error: {e}"),
    }
}
