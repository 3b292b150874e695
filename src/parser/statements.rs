use std::rc::Rc;

use crate::ast::{AssignOp, Expr, ExprKind, FunctionDecl};
use crate::error::{ErrorKind, ScriptError};
use crate::registry::PluginKind;
use crate::scope::{FunctionMeta, ScopeId, ScopeKind};
use crate::token::TokenKind;

use super::Parser;

impl Parser<'_> {
    /// Next statement, or `None` once the input is used up.
    ///
    /// Statement plugins get the first look, then the built-in
    /// keyword forms, then an expression or assignment.
    ///
    /// # Errors
    ///
    /// The first error met.
    pub fn parse_statement(&mut self) -> Result<Option<Expr>, ScriptError> {
        self.skip_separators()?;
        if self.tokens.is_ended() {
            return Ok(None);
        }
        self.apply_token_replacements()?;

        if let Some(statement) = self.try_plugin(PluginKind::Statement)? {
            self.end_statement()?;
            return Ok(Some(statement));
        }

        let text = self.tokens.current().text().to_string();
        let statement = match (self.tokens.kind(), text.as_str()) {
            (TokenKind::Keyword, "if") => return self.parse_if().map(Some),
            (TokenKind::Keyword, "while") => return self.parse_while().map(Some),
            (TokenKind::Keyword, "for") => return self.parse_for().map(Some),
            (TokenKind::Keyword, "try") => return self.parse_try().map(Some),
            (TokenKind::Keyword, "function")
                if self.tokens.peek(1, false)?.kind() == TokenKind::Ident =>
            {
                return self.parse_function().map(Some);
            }
            (TokenKind::Symbol, "{") => return self.parse_block(ScopeKind::Block).map(Some),
            (TokenKind::Keyword, "var") => self.parse_var()?,
            (TokenKind::Keyword, "return") => self.parse_return()?,
            (TokenKind::Keyword, "throw") => {
                let span = self.span();
                self.tokens.advance(1, false)?;
                let value = self.parse_expression()?;
                self.node(ExprKind::Throw(Box::new(value)), span)
            }
            (TokenKind::Keyword, "break" | "continue") => {
                let span = self.span();
                self.tokens.advance(1, false)?;
                let kind = if text == "break" {
                    ExprKind::Break
                } else {
                    ExprKind::Continue
                };
                self.node(kind, span)
            }
            (TokenKind::Keyword, "else" | "then" | "in" | "catch") => {
                return Err(self.error(ErrorKind::UnexpectedToken(text)));
            }
            _ => self.parse_simple_statement()?,
        };
        self.end_statement()?;
        Ok(Some(statement))
    }

    fn skip_separators(&mut self) -> Result<(), ScriptError> {
        loop {
            self.tokens.skip_new_lines()?;
            if !self.tokens.is(";") {
                return Ok(());
            }
            self.tokens.advance(1, true)?;
        }
    }

    /// Skip new-lines when they are followed by `text`.
    fn skip_new_lines_before(&mut self, text: &str) -> Result<bool, ScriptError> {
        if self.tokens.kind() == TokenKind::NewLine && self.tokens.peek(1, true)?.is(text) {
            self.tokens.skip_new_lines()?;
        }
        Ok(self.tokens.is(text))
    }

    /// Expression, assignment, or `++`/`--` statement.
    pub(super) fn parse_simple_statement(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        let target = self.parse_expression()?;
        let op = if self.tokens.kind() == TokenKind::Symbol {
            AssignOp::from_symbol(self.tokens.current().text())
        } else {
            None
        };
        let Some(op) = op else {
            return Ok(target);
        };
        if !target.is_assignable() {
            return Err(ScriptError::new(ErrorKind::InvalidAssignmentTarget, target.span));
        }
        self.tokens.advance(1, true)?;
        let value = self.parse_expression()?;
        if op == AssignOp::Assign {
            if let Some(name) = target.as_variable() {
                if !self.symbols.contains(name) {
                    self.symbols.define_var(name);
                }
            }
        }
        Ok(Expr::assign(target, op, Some(value), false)
            .at(span)
            .in_scope(self.scope()))
    }

    /// `var a = 1, b, c = a + 1`
    fn parse_var(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("var", false)?;
        let mut declarations = Vec::new();
        loop {
            let name_span = self.span();
            let name = self.tokens.expect_id(false)?;
            self.symbols.define_var(&name);
            let value = if self.tokens.is("=") {
                self.tokens.advance(1, true)?;
                Some(self.parse_expression()?)
            } else {
                None
            };
            let target = Expr::var(name).at(name_span).in_scope(self.scope());
            declarations.push(
                Expr::assign(target, AssignOp::Assign, value, true)
                    .at(name_span)
                    .in_scope(self.scope()),
            );
            if !self.tokens.is(",") {
                break;
            }
            self.tokens.advance(1, true)?;
        }
        if declarations.len() == 1 {
            if let Some(single) = declarations.pop() {
                return Ok(single.at(span));
            }
        }
        Ok(self.node(ExprKind::MultiAssign(declarations), span))
    }

    fn parse_return(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("return", false)?;
        let value = if self.tokens.is_end_of_stmt_or_block() || self.tokens.is("else") {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        Ok(self.node(ExprKind::Return(value), span))
    }

    /// `if cond { } else if cond { } else { }` or `if cond then stmt`.
    fn parse_if(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("if", false)?;
        let condition = self.parse_expression()?;
        let then = self.parse_body()?;
        let otherwise = if self.skip_new_lines_before("else")? {
            self.tokens.advance(1, false)?;
            if self.tokens.is("if") {
                self.enter_block()?;
                let chained = self.parse_if()?;
                self.statement_depth -= 1;
                Some(Box::new(chained))
            } else {
                Some(Box::new(self.parse_body_or_statement()?))
            }
        } else {
            None
        };
        Ok(self.node(
            ExprKind::If {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("while", false)?;
        let condition = self.parse_expression()?;
        let body = self.parse_body()?;
        Ok(self.node(
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// Body of `if`/`while`: a block, or `then` and one statement.
    fn parse_body(&mut self) -> Result<Expr, ScriptError> {
        if self.tokens.is("then") {
            self.tokens.advance(1, true)?;
            return self.parse_body_or_statement();
        }
        if self.skip_new_lines_before("{")? {
            return self.parse_block(ScopeKind::Block);
        }
        Err(self.expected("{"))
    }

    /// A block, or a single statement given its own scope.
    fn parse_body_or_statement(&mut self) -> Result<Expr, ScriptError> {
        self.tokens.skip_new_lines()?;
        if self.tokens.is("{") {
            return self.parse_block(ScopeKind::Block);
        }
        let span = self.span();
        self.enter_block()?;
        let scope = self.symbols.push_scope(ScopeKind::Block);
        let statement = self
            .parse_statement()?
            .ok_or_else(|| self.expected("statement"))?;
        self.pop_scope()?;
        self.statement_depth -= 1;
        Ok(Expr::new(ExprKind::Block(vec![statement]), span, scope))
    }

    /// `for (x in items) { }` or `for (init; cond; step) { }`.
    fn parse_for(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("for", false)?;
        let parens = self.tokens.is("(");
        let first = usize::from(parens);
        let is_foreach = self.tokens.peek(first, false)?.kind() == TokenKind::Ident
            && self.tokens.peek(first + 1, false)?.is("in");

        if is_foreach {
            if parens {
                self.tokens.advance(1, false)?;
            }
            let variable = self.tokens.expect_id(false)?;
            self.tokens.expect("in", false)?;
            let source = self.parse_expression()?;
            if parens {
                self.tokens.expect(")", false)?;
            }
            let body = self.parse_block_with(ScopeKind::Block, std::slice::from_ref(&variable))?;
            return Ok(self.node(
                ExprKind::ForEach {
                    variable,
                    source: Box::new(source),
                    body: Box::new(body),
                },
                span,
            ));
        }

        self.tokens.expect("(", false)?;
        let scope = self.symbols.push_scope(ScopeKind::Block);
        let init = if self.tokens.is("var") {
            self.parse_var()?
        } else {
            self.parse_simple_statement()?
        };
        self.tokens.expect(";", true)?;
        let condition = self.parse_expression()?;
        self.tokens.expect(";", true)?;
        let step = self.parse_simple_statement()?;
        self.tokens.expect(")", false)?;
        let body = self.parse_block_with(ScopeKind::Block, &[])?;
        self.pop_scope()?;
        Ok(Expr::new(
            ExprKind::For {
                init: Box::new(init),
                condition: Box::new(condition),
                step: Box::new(step),
                body: Box::new(body),
            },
            span,
            scope,
        ))
    }

    /// `try { } catch (err) { }`
    fn parse_try(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("try", false)?;
        let body = self.parse_block_with(ScopeKind::Block, &[])?;
        if !self.skip_new_lines_before("catch")? {
            return Err(self.expected("catch"));
        }
        self.tokens.advance(1, false)?;
        let parens = self.tokens.is("(");
        if parens {
            self.tokens.advance(1, false)?;
        }
        let error_name = self.tokens.expect_id(false)?;
        if parens {
            self.tokens.expect(")", false)?;
        }
        let handler = self.parse_block_with(ScopeKind::Block, std::slice::from_ref(&error_name))?;
        Ok(self.node(
            ExprKind::TryCatch {
                body: Box::new(body),
                error_name,
                handler: Box::new(handler),
            },
            span,
        ))
    }

    /// `function name[*][, alias...] [(params)] { body }`
    ///
    /// The name and aliases are defined before the body so the function
    /// can call itself.
    fn parse_function(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("function", false)?;
        let name = self.tokens.expect_id(false)?;
        let mut meta = FunctionMeta::new(&name, &[]);
        if self.tokens.is("*") {
            meta.has_wildcard = true;
            self.tokens.advance(1, false)?;
        }
        while self.tokens.is(",") {
            self.tokens.advance(1, false)?;
            meta.aliases.push(self.tokens.expect_id(false)?);
            if meta.aliases.len() > self.limits.max_aliases {
                return Err(self.error(ErrorKind::TooMany {
                    what: "aliases",
                    max: self.limits.max_aliases,
                }));
            }
        }
        if self.tokens.is("(") {
            meta.params = self.parse_params()?;
        }

        self.symbols.define_func(meta.clone());
        let (body, scope) = self.parse_scoped_block(ScopeKind::Function, &meta.params)?;
        let decl = Rc::new(FunctionDecl {
            meta,
            body,
            scope,
            span,
        });
        self.symbols.set_function_decl(&name, Rc::clone(&decl));
        Ok(Expr::function(decl).in_scope(self.scope()))
    }

    /// `(a, b, c)`
    pub(super) fn parse_params(&mut self) -> Result<Vec<String>, ScriptError> {
        self.tokens.expect("(", true)?;
        let mut params = Vec::new();
        while !self.tokens.is(")") {
            params.push(self.tokens.expect_id(true)?);
            if params.len() > self.limits.max_params {
                return Err(self.error(ErrorKind::TooMany {
                    what: "parameters",
                    max: self.limits.max_params,
                }));
            }
            if self.tokens.is(",") {
                self.tokens.advance(1, true)?;
            } else if !self.tokens.is(")") {
                return Err(self.expected(")"));
            }
        }
        self.tokens.expect(")", false)?;
        Ok(params)
    }

    pub(super) fn parse_block(&mut self, kind: ScopeKind) -> Result<Expr, ScriptError> {
        self.parse_block_with(kind, &[])
    }

    /// Block whose new scope starts out with `names` defined.
    fn parse_block_with(&mut self, kind: ScopeKind, names: &[String]) -> Result<Expr, ScriptError> {
        let span = self.span();
        let (statements, scope) = self.parse_scoped_block(kind, names)?;
        Ok(Expr::new(ExprKind::Block(statements), span, scope))
    }

    /// `{ statements }` in a fresh scope of `kind`.
    pub(super) fn parse_scoped_block(
        &mut self,
        kind: ScopeKind,
        names: &[String],
    ) -> Result<(Vec<Expr>, ScopeId), ScriptError> {
        if !self.skip_new_lines_before("{")? {
            return Err(self.expected("{"));
        }
        self.enter_block()?;
        self.tokens.advance(1, true)?;
        let scope = self.symbols.push_scope(kind);
        for name in names {
            self.symbols.define_var(name);
        }

        let mut statements = Vec::new();
        loop {
            self.skip_separators()?;
            if self.tokens.is("}") {
                break;
            }
            if self.tokens.is_ended() {
                return Err(self.expected("}"));
            }
            let before = self.position();
            let Some(statement) = self.parse_statement()? else {
                return Err(self.expected("}"));
            };
            self.check_progress(before)?;
            statements.push(statement);
        }

        self.pop_scope()?;
        self.statement_depth -= 1;
        self.tokens.advance(1, false)?;
        Ok((statements, scope))
    }

    fn enter_block(&mut self) -> Result<(), ScriptError> {
        self.statement_depth += 1;
        self.limit(
            self.statement_depth,
            self.limits.max_statement_depth,
            "statement",
        )
    }
}
