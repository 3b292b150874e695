use std::rc::Rc;

use crate::ast::{Expr, ExprKind, FunctionDecl, Operator, UnaryOp};
use crate::error::{ErrorKind, ScriptError};
use crate::registry::PluginKind;
use crate::scope::{FunctionMeta, ScopeKind};
use crate::token::{InterpolationPart, Span, Token, TokenData, TokenKind, TokenValue};
use crate::value::Value;

use super::Parser;

/// Shunting-yard output, in postfix order.
enum Postfix {
    Operand(Expr),
    Operator(Operator),
}

/// Shunting-yard operator stack entry.
enum Pending {
    Operator(Operator),
    /// Open `(`, with the output length when it was pushed.
    Paren(usize),
}

impl Parser<'_> {
    /// Parse one expression, stopping at the first token that cannot
    /// continue it.
    ///
    /// Operands are parsed by recursive descent; infix operators and
    /// grouping parentheses go through a shunting-yard. A `)` with no
    /// `(` open in this expression ends it, leaving the `)` for the
    /// enclosing call or statement.
    ///
    /// # Errors
    ///
    /// The first error met.
    pub fn parse_expression(&mut self) -> Result<Expr, ScriptError> {
        self.parse_expression_in(false)
    }

    /// `grouped` when the caller has consumed a `(`; new-lines are then
    /// skipped up to its `)`, as they are inside any open group.
    fn parse_expression_in(&mut self, grouped: bool) -> Result<Expr, ScriptError> {
        let mut output = Vec::new();
        let mut stack = Vec::new();
        let mut open = 0usize;
        let mut expect_operand = true;

        loop {
            if grouped || open > 0 {
                self.tokens.skip_new_lines()?;
            }
            self.apply_token_replacements()?;
            let current = self.tokens.current();
            let is_symbol = current.kind() == TokenKind::Symbol;

            if expect_operand {
                if is_symbol && current.is("(") {
                    self.open_paren()?;
                    open += 1;
                    stack.push(Pending::Paren(output.len()));
                    self.tokens.advance(1, true)?;
                } else {
                    output.push(Postfix::Operand(self.parse_operand()?));
                    expect_operand = false;
                }
                continue;
            }

            if is_symbol && current.is(")") && open > 0 {
                let mut start = output.len();
                while let Some(pending) = stack.pop() {
                    match pending {
                        Pending::Operator(op) => output.push(Postfix::Operator(op)),
                        Pending::Paren(mark) => {
                            start = mark;
                            break;
                        }
                    }
                }
                open -= 1;
                self.close_paren();
                self.tokens.advance(1, false)?;
                // A closed group is one operand and may start a chain.
                let group = self.reduce(output.split_off(start))?;
                let linked = self.nested(|parser| parser.parse_postfix(group, Vec::new()))?;
                output.push(Postfix::Operand(linked));
                continue;
            }

            let op = if is_symbol {
                Operator::from_symbol(current.text())
            } else {
                None
            };
            if let Some(op) = op {
                while let Some(Pending::Operator(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Postfix::Operator(*top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
                expect_operand = true;
                self.tokens.advance(1, true)?;
                continue;
            }

            if starts_operand(current) {
                let text = current.text().to_string();
                return Err(self.error(ErrorKind::MissingOperator(text)));
            }
            break;
        }

        if open > 0 {
            return Err(self.expected(")"));
        }
        while let Some(pending) = stack.pop() {
            if let Pending::Operator(op) = pending {
                output.push(Postfix::Operator(op));
            }
        }
        self.reduce(output)
    }

    /// Fold postfix output into a single tree.
    fn reduce(&self, output: Vec<Postfix>) -> Result<Expr, ScriptError> {
        let mut operands: Vec<Expr> = Vec::new();
        for item in output {
            match item {
                Postfix::Operand(expr) => operands.push(expr),
                Postfix::Operator(op) => {
                    let (Some(right), Some(left)) = (operands.pop(), operands.pop()) else {
                        return Err(self.expected("expression"));
                    };
                    operands.push(Expr::operation(op, left, right));
                }
            }
        }
        match (operands.pop(), operands.is_empty()) {
            (Some(expr), true) => Ok(expr),
            _ => Err(self.expected("expression")),
        }
    }

    /// One operand with its postfix chain: a literal, variable, call,
    /// array, map, lambda, interpolated string, unary expression or
    /// parenthesized expression. Expression plugins are asked first.
    ///
    /// Every operand nested inside another one counts against
    /// `max_expression_depth`.
    ///
    /// # Errors
    ///
    /// The first error met.
    pub fn parse_operand(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::operand)
    }

    /// Run `f` one expression level deeper.
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Expr, ScriptError>,
    ) -> Result<Expr, ScriptError> {
        self.expression_depth += 1;
        let result = self
            .limit(
                self.expression_depth,
                self.limits.max_expression_depth,
                "expression",
            )
            .and_then(|()| f(self));
        self.expression_depth -= 1;
        result
    }

    fn operand(&mut self) -> Result<Expr, ScriptError> {
        if let Some(expr) = self.try_plugin(PluginKind::Expression)? {
            return Ok(expr);
        }

        let span = self.span();
        let current = self.tokens.current().clone();
        let token = &current.token;

        if token.is_literal() {
            self.tokens.advance(1, false)?;
            let constant = self.node(ExprKind::Constant(literal_value(token)), span);
            return self.parse_postfix(constant, Vec::new());
        }

        match (token.kind, &*token.text) {
            (TokenKind::Interpolated, _) => self.parse_interpolated(&current),
            (TokenKind::Ident, name) => {
                self.tokens.advance(1, false)?;
                self.parse_id_expression(name, span)
            }
            (TokenKind::Keyword, "function") => self.parse_lambda(),
            (TokenKind::Symbol, "-") => {
                let next = self.tokens.peek(1, false)?;
                if let Some(n) = next.token.as_number() {
                    self.tokens.advance(2, false)?;
                    return Ok(self.node(ExprKind::Constant(Value::Number(-n)), span));
                }
                self.tokens.advance(1, false)?;
                let operand = self.parse_operand()?;
                Ok(self.unary(UnaryOp::Negate, operand, span))
            }
            (TokenKind::Symbol, "!") => {
                self.tokens.advance(1, false)?;
                let operand = self.parse_operand()?;
                Ok(self.unary(UnaryOp::Not, operand, span))
            }
            (TokenKind::Symbol, sym @ ("++" | "--")) => {
                let op = if sym == "++" {
                    UnaryOp::PreIncrement
                } else {
                    UnaryOp::PreDecrement
                };
                self.tokens.advance(1, false)?;
                let operand = self.parse_operand()?;
                if !operand.is_assignable() {
                    return Err(ScriptError::new(
                        ErrorKind::InvalidAssignmentTarget,
                        operand.span,
                    ));
                }
                Ok(self.unary(op, operand, span))
            }
            (TokenKind::Symbol, "(") => {
                self.open_paren()?;
                self.tokens.advance(1, true)?;
                let inner = self.parse_expression_in(true)?;
                self.tokens.expect(")", false)?;
                self.close_paren();
                self.parse_postfix(inner, Vec::new())
            }
            (TokenKind::Symbol, "[") => {
                let array = self.parse_array()?;
                self.parse_postfix(array, Vec::new())
            }
            (TokenKind::Symbol, "{") => self.parse_map(),
            (TokenKind::End, _) => Err(self.expected("expression")),
            (_, text) => Err(self.error(ErrorKind::UnexpectedToken(text.to_string()))),
        }
    }

    fn unary(&self, op: UnaryOp, operand: Expr, span: Span) -> Expr {
        self.node(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// An identifier that has just been consumed. Functions may be
    /// called without parentheses: `print a, b`.
    fn parse_id_expression(&mut self, name: &str, span: Span) -> Result<Expr, ScriptError> {
        if self.symbols.is_func(name) && !self.tokens.is("(") && !self.tokens.is(".") {
            let args = if starts_operand(self.tokens.current()) {
                self.parse_bare_args()?
            } else {
                Vec::new()
            };
            return Ok(Expr::call(name, args).at(span).in_scope(self.scope()));
        }
        let variable = self.node(ExprKind::Variable(name.to_string()), span);
        let qualified = if self.symbols.is_module(name) || self.symbols.is_func(name) {
            vec![name.to_string()]
        } else {
            Vec::new()
        };
        self.parse_postfix(variable, qualified)
    }

    /// `.name`, `[index]`, `(args)`, `++` and `--` after an operand.
    ///
    /// `qualified` collects `module.member` names; a call on such a
    /// chain becomes a named call (`math.min(a, b)`).
    fn parse_postfix(
        &mut self,
        mut expr: Expr,
        mut qualified: Vec<String>,
    ) -> Result<Expr, ScriptError> {
        let span = expr.span;
        let mut links = 0usize;
        loop {
            if self.tokens.kind() != TokenKind::Symbol {
                return Ok(expr);
            }
            let text = self.tokens.current().text().to_string();
            match text.as_str() {
                "." | "[" | "(" => {
                    links += 1;
                    self.limit(links, self.limits.max_member_depth, "member access")?;
                }
                "++" | "--" => {
                    if !expr.is_assignable() {
                        return Ok(expr);
                    }
                    let op = if text == "++" {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    self.tokens.advance(1, false)?;
                    return Ok(self.unary(op, expr, span));
                }
                _ => return Ok(expr),
            }
            match text.as_str() {
                "." => {
                    self.tokens.advance(1, true)?;
                    let name = self.tokens.expect_id(false)?;
                    if !qualified.is_empty() {
                        qualified.push(name.clone());
                    }
                    expr = self.node(
                        ExprKind::Member {
                            target: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                "[" => {
                    self.tokens.advance(1, true)?;
                    let index = self.parse_expression()?;
                    self.tokens.skip_new_lines()?;
                    self.tokens.expect("]", false)?;
                    qualified.clear();
                    expr = self.node(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => {
                    let args = self.parse_call_args()?;
                    let call = if qualified.is_empty() {
                        Expr::call_expr(expr, args)
                    } else {
                        Expr::call(qualified.join("."), args)
                    };
                    qualified.clear();
                    expr = call.at(span).in_scope(self.scope());
                }
            }
        }
    }

    /// `(a, b, ...)`
    pub(super) fn parse_call_args(&mut self) -> Result<Vec<Expr>, ScriptError> {
        self.tokens.expect("(", true)?;
        self.enter_call()?;
        let mut args = Vec::new();
        loop {
            self.tokens.skip_new_lines()?;
            if self.tokens.is(")") {
                break;
            }
            args.push(self.parse_expression()?);
            self.tokens.skip_new_lines()?;
            if self.tokens.is(",") {
                self.tokens.advance(1, true)?;
            } else if !self.tokens.is(")") {
                return Err(self.expected(")"));
            }
        }
        self.tokens.advance(1, false)?;
        self.call_depth -= 1;
        Ok(args)
    }

    /// `print a, b` style arguments, up to the end of the expression.
    fn parse_bare_args(&mut self) -> Result<Vec<Expr>, ScriptError> {
        self.enter_call()?;
        let mut args = vec![self.parse_expression()?];
        while self.tokens.is(",") {
            self.tokens.advance(1, true)?;
            args.push(self.parse_expression()?);
        }
        self.call_depth -= 1;
        Ok(args)
    }

    fn enter_call(&mut self) -> Result<(), ScriptError> {
        self.call_depth += 1;
        self.limit(self.call_depth, self.limits.max_call_depth, "call")
    }

    /// `[a, , b]`; an elided slot holds `null`.
    fn parse_array(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("[", true)?;
        let mut items = Vec::new();
        let mut expect_item = true;
        loop {
            self.tokens.skip_new_lines()?;
            if self.tokens.is("]") {
                break;
            }
            if self.tokens.is_ended() {
                return Err(self.expected("]"));
            }
            if self.tokens.is(",") {
                if expect_item {
                    let null = self.node(ExprKind::Constant(Value::Null), self.span());
                    items.push(null);
                }
                expect_item = true;
                self.tokens.advance(1, true)?;
                continue;
            }
            if !expect_item {
                return Err(self.expected("]"));
            }
            items.push(self.parse_expression()?);
            expect_item = false;
        }
        self.tokens.advance(1, false)?;
        Ok(self.node(ExprKind::Array(items), span))
    }

    /// `{ key: value, ... }` with string, identifier or number keys.
    fn parse_map(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("{", true)?;
        let mut entries = Vec::new();
        loop {
            self.tokens.skip_new_lines()?;
            if self.tokens.is("}") {
                break;
            }
            let current = self.tokens.current();
            let key = match current.kind() {
                TokenKind::Str => current.token.as_str().unwrap_or_default().to_string(),
                TokenKind::Ident | TokenKind::Number => current.text().to_string(),
                _ => return Err(self.expected("map key")),
            };
            self.tokens.advance(1, false)?;
            self.tokens.expect(":", true)?;
            entries.push((key, self.parse_expression()?));
            self.tokens.skip_new_lines()?;
            if self.tokens.is(",") {
                self.tokens.advance(1, true)?;
            } else if !self.tokens.is("}") {
                return Err(self.expected("}"));
            }
        }
        self.tokens.advance(1, false)?;
        Ok(self.node(ExprKind::Map(entries), span))
    }

    /// `function (a, b) { ... }`
    fn parse_lambda(&mut self) -> Result<Expr, ScriptError> {
        let span = self.span();
        self.tokens.expect("function", false)?;
        let mut meta = FunctionMeta::default();
        if self.tokens.is("(") {
            meta.params = self.parse_params()?;
        }
        let (body, scope) = self.parse_scoped_block(ScopeKind::Function, &meta.params)?;
        let decl = Rc::new(FunctionDecl {
            meta,
            body,
            scope,
            span,
        });
        Ok(Expr::lambda(decl).in_scope(self.scope()))
    }

    /// Each `#{...}` section is parsed against its own token iterator.
    fn parse_interpolated(&mut self, data: &TokenData) -> Result<Expr, ScriptError> {
        let span = data.span;
        let TokenValue::Parts(parts) = &data.token.value else {
            return Err(self.error(ErrorKind::UnexpectedToken(data.text().to_string())));
        };
        self.tokens.advance(1, false)?;
        let mut pieces = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                InterpolationPart::Text(text) => {
                    pieces.push(self.node(ExprKind::Constant(Value::Str(text.clone())), span));
                }
                InterpolationPart::Tokens(tokens) => {
                    let expr = self.with_tokens(tokens.clone(), |parser| {
                        let expr = parser.parse_expression()?;
                        if parser.tokens.is_ended() {
                            Ok(expr)
                        } else {
                            Err(parser.expected("}"))
                        }
                    })?;
                    pieces.push(expr);
                }
            }
        }
        Ok(self.node(ExprKind::Interpolated(pieces), span))
    }
}

/// Tokens that begin an operand; one of these right after a complete
/// operand means an operator is missing.
fn starts_operand(data: &TokenData) -> bool {
    data.token.is_literal()
        || matches!(data.kind(), TokenKind::Ident | TokenKind::Interpolated)
        || (data.kind() == TokenKind::Symbol && matches!(data.text(), "!" | "["))
}

fn literal_value(token: &Token) -> Value {
    match &token.value {
        TokenValue::Number(n) => Value::Number(*n),
        TokenValue::Str(s) => Value::Str(s.clone()),
        TokenValue::Bool(b) => Value::Bool(*b),
        TokenValue::None | TokenValue::Parts(_) => Value::Null,
    }
}
