//! Host-registered grammar extensions.
//!
//! A [`Plugin`] names the tokens it may start at and either a grammar
//! pattern (see [`crate::grammar`]) or [`Grammar::AutoMatch`]. Before
//! the parser tries its own forms it asks the [`Registry`] whether a
//! plugin of the wanted kind claims the upcoming tokens. The first
//! plugin, in registration order, that matches wins.

use std::collections::HashMap;
use std::fmt;

use crate::ast::Expr;
use crate::error::{ErrorKind, ScriptError};
use crate::grammar::{self, MatchNode, MatchType, TokenMatch};
use crate::lexer::LexPlugin;
use crate::parser::Parser;
use crate::scope::Resolve;
use crate::token::{Token, TokenData, TokenKind, TokenValue};
use crate::token_iter::TokenIterator;
use crate::value::Value;

/// Where in the parse a plugin takes part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Builds an operand inside expressions.
    Expression,
    /// Builds a whole statement.
    Statement,
    /// Rewrites tokens before the parser looks at them.
    TokenReplace,
}

/// Token a plugin may start at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartToken {
    /// Exact token text.
    Text(String),
    /// Any identifier.
    Ident,
    /// Any number literal.
    Number,
    /// Any string literal.
    Str,
    /// Any token except new-lines and end of input.
    Any,
}

impl StartToken {
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    #[must_use]
    pub fn matches(&self, data: &TokenData) -> bool {
        match self {
            Self::Text(text) => data.is(text),
            Self::Ident => data.kind() == TokenKind::Ident,
            Self::Number => data.kind() == TokenKind::Number,
            Self::Str => data.kind() == TokenKind::Str,
            Self::Any => !matches!(data.kind(), TokenKind::NewLine | TokenKind::End),
        }
    }
}

/// How a plugin recognizes its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grammar {
    /// Compiled with [`grammar::compile`].
    Pattern(String),
    /// Claim the input as soon as a start token is current; the builder
    /// consumes the tokens itself.
    AutoMatch,
}

/// A grammar extension.
pub trait Plugin {
    fn name(&self) -> &str;

    fn kind(&self) -> PluginKind;

    fn start_tokens(&self) -> Vec<StartToken>;

    fn grammar(&self) -> Grammar;

    /// Required matches after which an expression terminator may end
    /// the pattern early. Defaults to every required top-level match.
    fn min_required(&self) -> Option<usize> {
        None
    }

    /// Last say over a start token, e.g. to step aside when it names a
    /// defined variable.
    fn can_start(&self, _token: &TokenData, _resolver: &dyn Resolve) -> bool {
        true
    }

    /// Lookup behind `@tokenmap1` (`map == 1`) and `@tokenmap2`.
    fn token_map(&self, _map: u8, _text: &str) -> Option<Value> {
        None
    }

    /// Build the node for a match. The parser has already moved past
    /// the `found.token_count` matched tokens.
    fn build_expr(&self, parser: &mut Parser<'_>, found: &PluginMatch) -> Result<Expr, ScriptError> {
        let _ = found;
        Err(parser.error(ErrorKind::InvalidStatement(format!(
            "plugin '{}' does not build expressions",
            self.name()
        ))))
    }

    /// Token that replaces the matched tokens (token-replacement plugins).
    fn replace_token(&self, _found: &PluginMatch, _first: &TokenData) -> Option<Token> {
        None
    }
}

/// Successful plugin match.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginMatch {
    /// Significant tokens covered by the match.
    pub token_count: usize,
    /// `name` holds the matched text, `name + "Value"` its interpreted value.
    pub captures: HashMap<String, Value>,
    /// Registration index of the plugin.
    pub plugin: usize,
}

impl PluginMatch {
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&Value> {
        self.captures.get(name)
    }

    /// Matched text of capture `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.capture(name).and_then(Value::as_str)
    }

    /// Interpreted value of capture `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.captures.get(&format!("{name}Value"))
    }
}

struct Entry {
    plugin: Box<dyn Plugin>,
    kind: PluginKind,
    starts: Vec<StartToken>,
    /// `None` for auto-match plugins.
    matcher: Option<Vec<MatchNode>>,
    min_required: usize,
}

/// Registered plugins, in registration order.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
    lex_plugins: Vec<Box<dyn LexPlugin>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "plugins",
                &self.entries.iter().map(|e| e.plugin.name()).collect::<Vec<_>>(),
            )
            .field(
                "lex_plugins",
                &self.lex_plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `plugin`, compiling its grammar.
    ///
    /// # Errors
    ///
    /// `InvalidGrammar` when the pattern does not compile.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), ScriptError> {
        let (matcher, min_required) = match plugin.grammar() {
            Grammar::AutoMatch => (None, 0),
            Grammar::Pattern(pattern) => {
                let nodes = grammar::compile(&pattern)?;
                let min = plugin
                    .min_required()
                    .unwrap_or_else(|| grammar::required_count(&nodes));
                (Some(nodes), min)
            }
        };
        log::debug!(
            "registered {:?} plugin '{}' (min {min_required})",
            plugin.kind(),
            plugin.name()
        );
        let kind = plugin.kind();
        let starts = plugin.start_tokens();
        self.entries.push(Entry {
            plugin,
            kind,
            starts,
            matcher,
            min_required,
        });
        Ok(())
    }

    pub fn register_lex(&mut self, plugin: Box<dyn LexPlugin>) {
        log::debug!("registered lex plugin '{}'", plugin.name());
        self.lex_plugins.push(plugin);
    }

    #[must_use]
    pub fn lex_plugins(&self) -> &[Box<dyn LexPlugin>] {
        &self.lex_plugins
    }

    /// Plugin registered at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn Plugin> {
        self.entries.get(index).map(|e| e.plugin.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any plugin of `kind` is registered.
    #[must_use]
    pub fn has_kind(&self, kind: PluginKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// First plugin of `kind` claiming the tokens at the cursor.
    ///
    /// The cursor does not move. Patterns that would need to look past
    /// the lookahead window do not match.
    ///
    /// # Errors
    ///
    /// Errors raised while refilling the token window.
    pub fn find(
        &self,
        kind: PluginKind,
        tokens: &mut TokenIterator<'_>,
        resolver: &dyn Resolve,
    ) -> Result<Option<PluginMatch>, ScriptError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.kind != kind {
                continue;
            }
            let current = tokens.current();
            if !entry.starts.iter().any(|s| s.matches(current))
                || !entry.plugin.can_start(current, resolver)
            {
                continue;
            }

            let Some(matcher) = &entry.matcher else {
                log::debug!(
                    "plugin '{}' auto-matched at '{}'",
                    entry.plugin.name(),
                    current.text()
                );
                return Ok(Some(PluginMatch {
                    token_count: 0,
                    captures: HashMap::new(),
                    plugin: index,
                }));
            };

            let mut run = MatchRun {
                tokens: &mut *tokens,
                resolver,
                entry,
                offset: 0,
                captures: HashMap::new(),
                overflowed: false,
            };
            if run.list(matcher, entry.min_required)? && !run.overflowed && run.offset > 0 {
                log::debug!(
                    "plugin '{}' matched {} tokens",
                    entry.plugin.name(),
                    run.offset
                );
                return Ok(Some(PluginMatch {
                    token_count: run.offset,
                    captures: run.captures,
                    plugin: index,
                }));
            }
            log::trace!("plugin '{}' did not match", entry.plugin.name());
        }
        Ok(None)
    }
}

/// Tokens consumed by one successful leaf match.
struct Hit {
    consumed: usize,
    text: String,
    value: Option<Value>,
}

impl Hit {
    fn one(data: &TokenData, value: Option<Value>) -> Self {
        Self {
            consumed: 1,
            text: data.text().to_string(),
            value,
        }
    }
}

/// State of one pattern walk over the lookahead window.
struct MatchRun<'r, 't> {
    tokens: &'r mut TokenIterator<'t>,
    resolver: &'r dyn Resolve,
    entry: &'r Entry,
    /// Lookahead position of the next unmatched token.
    offset: usize,
    captures: HashMap<String, Value>,
    overflowed: bool,
}

impl MatchRun<'_, '_> {
    /// Token at `offset`, or `None` past the lookahead window.
    fn peek(&mut self, offset: usize) -> Result<Option<TokenData>, ScriptError> {
        match self.tokens.peek(offset, false) {
            Ok(data) => Ok(Some(data.clone())),
            Err(e) if matches!(e.kind, ErrorKind::LookaheadExceeded { .. }) => {
                self.overflowed = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn at_terminator(&mut self) -> Result<bool, ScriptError> {
        Ok(self
            .peek(self.offset)?
            .is_some_and(|data| data.token.ends_expression()))
    }

    fn list(&mut self, nodes: &[MatchNode], min_required: usize) -> Result<bool, ScriptError> {
        let mut matched = 0;
        for node in nodes {
            let (offset, captures) = (self.offset, self.captures.clone());
            if self.node(node)? {
                if node.is_required() {
                    matched += 1;
                }
                continue;
            }
            self.offset = offset;
            self.captures = captures;
            if self.overflowed {
                return Ok(false);
            }
            if !node.is_required() {
                continue;
            }
            return Ok(matched >= min_required && self.at_terminator()?);
        }
        Ok(true)
    }

    fn node(&mut self, node: &MatchNode) -> Result<bool, ScriptError> {
        match node {
            MatchNode::Token(m) => self.token(m),
            MatchNode::Group(group) => {
                self.list(&group.matches, grammar::required_count(&group.matches))
            }
            MatchNode::Or(or) => {
                let (offset, captures) = (self.offset, self.captures.clone());
                if self.node(&or.left)? {
                    return Ok(true);
                }
                self.offset = offset;
                self.captures = captures;
                if self.overflowed {
                    return Ok(false);
                }
                self.node(&or.right)
            }
        }
    }

    fn token(&mut self, m: &TokenMatch) -> Result<bool, ScriptError> {
        let Some(first) = self.peek(self.offset)? else {
            return Ok(false);
        };

        // Zero-width: asserts the pattern may end here.
        if m.token_type == Some(MatchType::ExprTerminators) {
            let ends = first.token.ends_expression();
            if let Some(name) = m.name.as_ref().filter(|_| ends) {
                self.captures
                    .insert(name.clone(), Value::Str(first.text().to_string()));
            }
            return Ok(ends);
        }
        if matches!(first.kind(), TokenKind::End | TokenKind::NewLine) {
            return Ok(false);
        }

        let hit = if m.back_reference {
            self.back_reference(m, &first)
        } else if let Some(text) = &m.text {
            first.is(text).then(|| Hit::one(&first, None))
        } else if !m.values.is_empty() {
            m.values
                .iter()
                .any(|v| v.eq_ignore_ascii_case(first.text()))
                .then(|| Hit::one(&first, None))
        } else if let Some(ty) = m.token_type {
            self.typed(ty, &first)?
        } else {
            None
        };

        let Some(hit) = hit else {
            return Ok(false);
        };
        self.offset += hit.consumed;
        if let Some(name) = &m.name {
            match (hit.value, m.token_type) {
                (Some(value), Some(ty)) if ty.records_value() => {
                    self.captures.insert(format!("{name}Value"), value);
                }
                _ => {}
            }
            self.captures.insert(name.clone(), Value::Str(hit.text));
        }
        Ok(true)
    }

    fn back_reference(&self, m: &TokenMatch, first: &TokenData) -> Option<Hit> {
        let previous = m
            .name
            .as_ref()
            .and_then(|name| self.captures.get(name))
            .and_then(Value::as_str);
        match previous {
            Some(text) if !first.is(text) => None,
            _ => Some(Hit::one(first, None)),
        }
    }

    fn typed(&mut self, ty: MatchType, first: &TokenData) -> Result<Option<Hit>, ScriptError> {
        let is_ident = first.kind() == TokenKind::Ident;
        let hit = match ty {
            MatchType::Number => first
                .token
                .as_number()
                .map(|n| Hit::one(first, Some(Value::Number(n)))),
            MatchType::Word => {
                is_ident.then(|| Hit::one(first, Some(Value::Str(first.text().to_string()))))
            }
            MatchType::Bool => bool_word(first).map(|b| Hit::one(first, Some(Value::Bool(b)))),
            MatchType::Uri => first
                .token
                .as_str()
                .filter(|s| looks_like_uri(s))
                .map(|s| Hit::one(first, Some(Value::Str(s.to_string())))),
            MatchType::StartToken => self
                .entry
                .starts
                .iter()
                .any(|s| s.matches(first))
                .then(|| Hit::one(first, Some(Value::Str(first.text().to_string())))),
            MatchType::IdentSymbol => {
                (is_ident && self.resolver.is_defined(first.text())).then(|| Hit::one(first, None))
            }
            MatchType::SingularSymbol => (is_ident
                && self.resolver.is_defined(&format!("{}s", first.text())))
            .then(|| Hit::one(first, None)),
            MatchType::TokenMap1 | MatchType::TokenMap2 => {
                let map = if ty == MatchType::TokenMap1 { 1 } else { 2 };
                self.entry
                    .plugin
                    .token_map(map, first.text())
                    .map(|value| Hit::one(first, Some(value)))
            }
            MatchType::ParamNames => {
                if is_ident {
                    Some(self.param_names(first)?)
                } else {
                    None
                }
            }
            MatchType::Time => self.time(first)?,
            MatchType::ExprTerminators => None,
        };
        Ok(hit)
    }

    /// `a, b, c`: identifiers separated by commas.
    fn param_names(&mut self, first: &TokenData) -> Result<Hit, ScriptError> {
        let mut names = vec![first.text().to_string()];
        let mut consumed = 1;
        loop {
            let comma = self.peek(self.offset + consumed)?;
            if !comma.is_some_and(|t| t.is(",")) {
                break;
            }
            let Some(next) = self.peek(self.offset + consumed + 1)? else {
                break;
            };
            if next.kind() != TokenKind::Ident {
                break;
            }
            names.push(next.text().to_string());
            consumed += 2;
        }
        Ok(Hit {
            consumed,
            text: names.join(", "),
            value: Some(Value::List(names.into_iter().map(Value::Str).collect())),
        })
    }

    /// `H`, `H:MM`, `H.MM`, each optionally followed by `am` or `pm`.
    fn time(&mut self, first: &TokenData) -> Result<Option<Hit>, ScriptError> {
        if first.kind() != TokenKind::Number {
            return Ok(None);
        }
        let mut text = first.text().to_string();
        let (hours, mut minutes) = match text.split_once('.') {
            Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok(), m.parse::<u32>().ok()),
            Some(_) => return Ok(None),
            None => (text.parse::<u32>().ok(), Some(0)),
        };
        let Some(mut hours) = hours else {
            return Ok(None);
        };
        let mut consumed = 1;

        if !text.contains('.') && self.peek(self.offset + 1)?.is_some_and(|t| t.is(":")) {
            let Some(min) = self.peek(self.offset + 2)? else {
                return Ok(None);
            };
            if min.kind() != TokenKind::Number || min.text().len() != 2 {
                return Ok(None);
            }
            minutes = min.text().parse::<u32>().ok();
            text.push(':');
            text.push_str(min.text());
            consumed = 3;
        }
        let Some(minutes) = minutes else {
            return Ok(None);
        };

        if let Some(suffix) = self.peek(self.offset + consumed)? {
            let lower = suffix.text().to_ascii_lowercase();
            if suffix.kind() == TokenKind::Ident && (lower == "am" || lower == "pm") {
                if hours == 0 || hours > 12 {
                    return Ok(None);
                }
                hours = match (lower.as_str(), hours) {
                    ("pm", h) if h < 12 => h + 12,
                    ("am", 12) => 0,
                    (_, h) => h,
                };
                text.push_str(&lower);
                consumed += 1;
            }
        }

        if hours > 23 || minutes > 59 {
            return Ok(None);
        }
        Ok(Some(Hit {
            consumed,
            text,
            value: Some(Value::Time(hours * 3600 + minutes * 60)),
        }))
    }
}

fn bool_word(data: &TokenData) -> Option<bool> {
    if let TokenValue::Bool(b) = data.token.value {
        return Some(b);
    }
    if data.kind() != TokenKind::Ident {
        return None;
    }
    match data.text().to_ascii_lowercase().as_str() {
        "yes" | "on" => Some(true),
        "no" | "off" => Some(false),
        _ => None,
    }
}

/// Absolute URLs, rooted or relative paths and Windows drive paths.
#[must_use]
pub fn looks_like_uri(s: &str) -> bool {
    let mut chars = s.chars();
    let drive = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some(':'), Some('\\' | '/')) if c.is_ascii_alphabetic()
    );
    drive
        || s.contains("://")
        || s.starts_with('/')
        || s.starts_with("./")
        || s.starts_with("../")
        || s.starts_with("www.")
}
