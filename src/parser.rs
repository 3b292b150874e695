//! Scope-aware recursive-descent parser.
//!
//! Statement forms live in [`statements`], operands and the
//! shunting-yard operator parser in [`expressions`]. The parser pulls
//! tokens through a [`TokenIterator`] and updates a [`SymbolTable`] as
//! declarations go by, so how a name parses depends on what it resolves
//! to at that point of the script.

mod expressions;
mod statements;

use crate::ast::{Expr, ExprKind, Program};
use crate::config::{Limits, ParserConfig};
use crate::error::{ErrorKind, ScriptError};
use crate::lexer::{LexPlugin, LexRules, Lexer};
use crate::registry::{Plugin, PluginKind, Registry};
use crate::scope::{FunctionMeta, Resolve, ScopeId, SymbolTable};
use crate::token::{Span, TokenData, TokenKind};
use crate::token_iter::TokenIterator;

/// Parse a script with default settings and no plugins.
///
/// # Errors
///
/// Returns the first lexical, syntax or limit error.
pub fn parse_str(input: &str) -> Result<Program, ScriptError> {
    Frontend::default().parse(input)
}

/// Reusable parser setup: configuration, plugins, lexical rules and
/// host symbols shared by every script it parses.
#[derive(Debug, Default)]
pub struct Frontend {
    config: ParserConfig,
    registry: Registry,
    rules: LexRules,
    host: SymbolTable,
}

impl Frontend {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Add a grammar extension.
    ///
    /// # Errors
    ///
    /// `InvalidGrammar` when the plugin's pattern does not compile.
    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<&mut Self, ScriptError> {
        self.registry.register(plugin)?;
        Ok(self)
    }

    pub fn register_lex_plugin(&mut self, plugin: Box<dyn LexPlugin>) -> &mut Self {
        self.registry.register_lex(plugin);
        self
    }

    /// Token replace/remove/insert rules applied by the lexer.
    pub const fn rules_mut(&mut self) -> &mut LexRules {
        &mut self.rules
    }

    /// Make `name` resolve as a host module in every script.
    pub fn define_module(&mut self, name: &str) -> &mut Self {
        self.host.define_module(name);
        self
    }

    /// Make a host function callable from every script.
    pub fn define_function(&mut self, meta: FunctionMeta) -> &mut Self {
        self.host.define_func(meta);
        self
    }

    /// Significant tokens of `text` as the parser would see them,
    /// before token-replacement plugins.
    ///
    /// # Errors
    ///
    /// Lexical errors.
    pub fn tokenize(&self, text: &str) -> Result<Vec<TokenData>, ScriptError> {
        self.lexer(text)
            .tokenize()
            .map_err(|e| e.in_file(self.config.file.as_deref()))
    }

    /// Parse `text` into a [`Program`].
    ///
    /// # Errors
    ///
    /// The first lexical, syntax or limit error, tagged with the
    /// configured file name.
    pub fn parse(&self, text: &str) -> Result<Program, ScriptError> {
        let file = self.config.file.as_deref();
        let length = text.chars().count();
        let max = self.config.limits.max_script_length;
        if length > max {
            return Err(
                ScriptError::new(ErrorKind::ScriptTooLong { length, max }, Span::new(1, 1))
                    .in_file(file),
            );
        }
        log::debug!("parsing {length} characters of {}", file.unwrap_or("<script>"));

        let tokens = TokenIterator::new(Box::new(self.lexer(text)), self.config.lookahead)
            .map_err(|e| e.in_file(file))?;
        Parser::new(tokens, self.host.clone(), &self.registry, &self.config.limits)
            .parse_program()
            .map_err(|e| e.in_file(file))
    }

    fn lexer(&self, text: &str) -> Lexer<'_> {
        Lexer::new(text, self.config.interpolation_marker)
            .with_rules(&self.rules, self.registry.lex_plugins())
            .max_interpolation_depth(self.config.limits.max_interpolation_depth)
    }
}

/// Parser state for one script. Plugins receive it in
/// [`Plugin::build_expr`] to read further tokens or parse
/// sub-expressions.
pub struct Parser<'a> {
    tokens: TokenIterator<'a>,
    symbols: SymbolTable,
    registry: &'a Registry,
    limits: &'a Limits,
    statement_depth: usize,
    call_depth: usize,
    paren_depth: usize,
    expression_depth: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub const fn new(
        tokens: TokenIterator<'a>,
        symbols: SymbolTable,
        registry: &'a Registry,
        limits: &'a Limits,
    ) -> Self {
        Self {
            tokens,
            symbols,
            registry,
            limits,
            statement_depth: 0,
            call_depth: 0,
            paren_depth: 0,
            expression_depth: 0,
        }
    }

    /// Parse every statement up to the end of input.
    ///
    /// # Errors
    ///
    /// The first error met.
    pub fn parse_program(mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();
        loop {
            let before = self.position();
            let Some(statement) = self.parse_statement()? else {
                break;
            };
            self.check_progress(before)?;
            statements.push(statement);
        }
        log::debug!("parsed {} top-level statements", statements.len());
        Ok(Program {
            statements,
            symbols: self.symbols,
        })
    }

    pub const fn tokens(&mut self) -> &mut TokenIterator<'a> {
        &mut self.tokens
    }

    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub const fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Position of the current token.
    #[must_use]
    pub fn span(&self) -> Span {
        self.tokens.span()
    }

    /// Scope new nodes belong to.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.symbols.current_scope()
    }

    /// Error of `kind` at the current token.
    #[must_use]
    pub fn error(&self, kind: ErrorKind) -> ScriptError {
        self.tokens.error(kind)
    }

    /// Node of `kind` at `span` in the current scope.
    #[must_use]
    pub fn node(&self, kind: ExprKind, span: Span) -> Expr {
        Expr::new(kind, span, self.scope())
    }

    fn position(&self) -> (usize, usize) {
        let current = self.tokens.current();
        (current.index, current.offset)
    }

    fn check_progress(&self, before: (usize, usize)) -> Result<(), ScriptError> {
        if self.position() == before && !self.tokens.is_ended() {
            return Err(self.error(ErrorKind::NoProgress(
                self.tokens.current().text().to_string(),
            )));
        }
        Ok(())
    }

    fn limit(&self, depth: usize, max: usize, what: &'static str) -> Result<(), ScriptError> {
        if depth > max {
            return Err(self.error(ErrorKind::NestingTooDeep { what, max }));
        }
        Ok(())
    }

    fn open_paren(&mut self) -> Result<(), ScriptError> {
        self.paren_depth += 1;
        self.limit(
            self.paren_depth,
            self.limits.max_paren_depth,
            "parenthesis",
        )
    }

    const fn close_paren(&mut self) {
        self.paren_depth = self.paren_depth.saturating_sub(1);
    }

    fn pop_scope(&mut self) -> Result<ScopeId, ScriptError> {
        self.symbols.pop_scope().map_err(|kind| self.error(kind))
    }

    /// Run the first plugin of `kind` that claims the current tokens.
    fn try_plugin(&mut self, kind: PluginKind) -> Result<Option<Expr>, ScriptError> {
        if !self.registry.has_kind(kind) {
            return Ok(None);
        }
        let registry = self.registry;
        let Some(found) = registry.find(kind, &mut self.tokens, &self.symbols)? else {
            return Ok(None);
        };
        let Some(plugin) = registry.get(found.plugin) else {
            return Ok(None);
        };
        let (span, scope) = (self.span(), self.scope());
        self.tokens.advance(found.token_count, false)?;
        let expr = plugin.build_expr(self, &found)?;
        Ok(Some(expr.at(span).in_scope(scope)))
    }

    /// Let token-replacement plugins rewrite the tokens at the cursor.
    fn apply_token_replacements(&mut self) -> Result<(), ScriptError> {
        if !self.registry.has_kind(PluginKind::TokenReplace) {
            return Ok(());
        }
        let registry = self.registry;
        let Some(found) = registry.find(PluginKind::TokenReplace, &mut self.tokens, &self.symbols)?
        else {
            return Ok(());
        };
        let replacement = registry
            .get(found.plugin)
            .and_then(|p| p.replace_token(&found, self.tokens.current()));
        if let Some(token) = replacement {
            log::trace!(
                "replaced {} token(s) at '{}' with '{}'",
                found.token_count,
                self.tokens.current().text(),
                token.text
            );
            self.tokens.replace(found.token_count, token)?;
        }
        Ok(())
    }

    /// Run `f` against a nested iterator over `tokens`, restoring the
    /// outer iterator afterwards whether `f` succeeds or not.
    fn with_tokens<T>(
        &mut self,
        tokens: Vec<TokenData>,
        f: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        let nested = TokenIterator::from_tokens(tokens, self.tokens.lookahead());
        let outer = std::mem::replace(&mut self.tokens, nested);
        let result = f(self);
        self.tokens = outer;
        result
    }

    /// Consume the end of a simple statement.
    fn end_statement(&mut self) -> Result<(), ScriptError> {
        if self.tokens.is_explicit_end_of_stmt() {
            return self.tokens.advance(1, false);
        }
        if self.tokens.is_end_of_stmt_or_block() || self.tokens.is("else") {
            return Ok(());
        }
        Err(self.expected("end of statement"))
    }

    /// `Expected` error naming `what` and the current token.
    fn expected(&self, what: &str) -> ScriptError {
        let current = self.tokens.current();
        let found = match current.kind() {
            TokenKind::End => String::new(),
            TokenKind::NewLine => "new line".to_string(),
            _ => current.text().to_string(),
        };
        self.error(ErrorKind::Expected {
            expected: what.to_string(),
            found,
        })
    }
}
