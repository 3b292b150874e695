use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{ErrorKind, ScriptError};
use crate::scanner::{Scanner, decode_escape, is_ident_start};
use crate::token::{InterpolationPart, Span, Token, TokenData, TokenKind};

/// Default character that introduces `#{...}` in double-quoted strings.
pub const DEFAULT_INTERPOLATION_MARKER: char = '#';

/// Default cap on `#{...}` sections nested inside one another.
pub const DEFAULT_INTERPOLATION_DEPTH: usize = 8;

/// Rewriting rules keyed by the literal text of a token.
#[derive(Debug, Clone, Default)]
pub struct LexRules {
    replacements: HashMap<String, Token>,
    removals: HashSet<String>,
    insertions: HashMap<String, Vec<Token>>,
}

impl LexRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every token spelled `text` with `token`.
    pub fn replace(&mut self, text: &str, token: Token) -> &mut Self {
        self.replacements.insert(text.to_string(), token);
        self
    }

    /// Drop every token spelled `text`.
    pub fn remove(&mut self, text: &str) -> &mut Self {
        self.removals.insert(text.to_string());
        self
    }

    /// Emit `token` right after every token spelled `text`.
    pub fn insert_after(&mut self, text: &str, token: Token) -> &mut Self {
        self.insertions
            .entry(text.to_string())
            .or_default()
            .push(token);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty() && self.removals.is_empty() && self.insertions.is_empty()
    }
}

/// A lexer-level extension that takes over a freshly lexed token.
pub trait LexPlugin {
    fn name(&self) -> &str;

    /// Whether the plugin claims `token`; `scanner` sits just past it.
    fn claims(&self, token: &TokenData, scanner: &Scanner) -> bool;

    /// Build the replacement token, consuming more input if needed.
    ///
    /// # Errors
    ///
    /// Any lexical error the plugin detects.
    fn lex(&self, token: &TokenData, scanner: &mut Scanner) -> Result<Token, ScriptError>;
}

/// Tokenize a script with default settings and no rules.
///
/// The result holds every significant token (whitespace dropped,
/// comments and new-lines kept) followed by an `End` token.
///
/// # Errors
///
/// Returns `ScriptError` on unterminated strings or comments and on
/// characters that cannot start a token.
pub fn tokenize(input: &str) -> Result<Vec<TokenData>, ScriptError> {
    Lexer::new(input, DEFAULT_INTERPOLATION_MARKER).tokenize()
}

/// Turns script text into tokens on demand.
pub struct Lexer<'a> {
    scanner: Scanner,
    marker: char,
    rules: Option<&'a LexRules>,
    plugins: &'a [Box<dyn LexPlugin>],
    base_offset: usize,
    /// Interpolated sections enclosing this lexer's input.
    depth: usize,
    max_depth: usize,
    index: usize,
    pending: VecDeque<TokenData>,
    ended: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &str, marker: char) -> Self {
        Self {
            scanner: Scanner::new(input),
            marker,
            rules: None,
            plugins: &[],
            base_offset: 0,
            depth: 0,
            max_depth: DEFAULT_INTERPOLATION_DEPTH,
            index: 0,
            pending: VecDeque::new(),
            ended: false,
        }
    }

    /// Apply `rules` and `plugins` to every significant token.
    #[must_use]
    pub fn with_rules(mut self, rules: &'a LexRules, plugins: &'a [Box<dyn LexPlugin>]) -> Self {
        self.rules = Some(rules);
        self.plugins = plugins;
        self
    }

    /// Reject `#{...}` sections nested more than `max` deep.
    #[must_use]
    pub const fn max_interpolation_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    fn nested(&self, input: &str, span: Span, offset: usize) -> Self {
        Self {
            scanner: Scanner::with_position(input, span.line, span.column),
            marker: self.marker,
            rules: self.rules,
            plugins: self.plugins,
            base_offset: offset,
            depth: self.depth + 1,
            max_depth: self.max_depth,
            index: 0,
            pending: VecDeque::new(),
            ended: false,
        }
    }

    /// All significant tokens, ending with `End`.
    ///
    /// # Errors
    ///
    /// See [`tokenize`].
    pub fn tokenize(mut self) -> Result<Vec<TokenData>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            let batch = self.token_batch(64)?;
            if batch.is_empty() {
                break;
            }
            tokens.extend(batch);
        }
        Ok(tokens)
    }

    /// Every raw token including whitespace, with no rules applied.
    /// Concatenating the token texts reproduces the input.
    ///
    /// # Errors
    ///
    /// See [`tokenize`].
    pub fn tokenize_with_trivia(mut self) -> Result<Vec<TokenData>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            let mut data = self.next_token()?;
            data.index = self.index;
            self.index += 1;
            let end = data.kind() == TokenKind::End;
            tokens.push(data);
            if end {
                return Ok(tokens);
            }
        }
    }

    /// Up to `count` significant tokens. The batch that reaches the end
    /// of input includes the `End` token; later calls return nothing.
    ///
    /// # Errors
    ///
    /// See [`tokenize`].
    pub fn token_batch(&mut self, count: usize) -> Result<Vec<TokenData>, ScriptError> {
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            if let Some(data) = self.pending.pop_front() {
                batch.push(data);
                continue;
            }
            if self.ended {
                break;
            }
            let data = self.next_token()?;
            if data.kind() == TokenKind::Whitespace {
                continue;
            }
            self.apply_rules(data)?;
        }
        Ok(batch)
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended && self.pending.is_empty()
    }

    fn queue(&mut self, mut data: TokenData) {
        data.index = self.index;
        self.index += 1;
        self.pending.push_back(data);
    }

    fn apply_rules(&mut self, data: TokenData) -> Result<(), ScriptError> {
        if data.kind() == TokenKind::End {
            self.ended = true;
            self.queue(data);
            return Ok(());
        }

        let plugins = self.plugins;
        if let Some(plugin) = plugins.iter().find(|p| p.claims(&data, &self.scanner)) {
            log::trace!("lex plugin '{}' claimed '{}'", plugin.name(), data.text());
            let token = plugin.lex(&data, &mut self.scanner)?;
            self.queue(TokenData { token, ..data });
            return Ok(());
        }

        let Some(rules) = self.rules else {
            self.queue(data);
            return Ok(());
        };

        let text = data.text().to_string();
        if let Some(replacement) = rules.replacements.get(&text) {
            self.queue(TokenData {
                token: replacement.clone(),
                ..data.clone()
            });
        } else if rules.removals.contains(&text) {
            return Ok(());
        } else {
            self.queue(data.clone());
        }

        if let Some(extra) = rules.insertions.get(&text) {
            for token in extra {
                self.queue(TokenData {
                    token: token.clone(),
                    ..data.clone()
                });
            }
        }
        Ok(())
    }

    /// Produce exactly one raw token, whitespace included.
    ///
    /// # Errors
    ///
    /// See [`tokenize`].
    pub fn next_token(&mut self) -> Result<TokenData, ScriptError> {
        let span = self.scanner.span();
        let start = self.scanner.pos();
        let offset = self.base_offset + start;

        let Some(ch) = self.scanner.current() else {
            return Ok(TokenData::new(Token::end(), span, offset, 0));
        };

        let token = match ch {
            ' ' | '\t' => Token::whitespace(self.scanner.scan_whitespace(false, false).text),
            '\n' => {
                self.scanner.scan_new_line();
                Token::new_line("\n")
            }
            '\r' => {
                self.scanner.scan_new_line();
                if self.scanner.pos() - start == 2 {
                    Token::new_line("\r\n")
                } else {
                    Token::new_line("\r")
                }
            }
            '/' if self.scanner.peek() == Some('/') => {
                Token::comment(self.scanner.scan_to_end_of_line(false, false).text)
            }
            '/' if self.scanner.peek() == Some('*') => self.lex_block_comment(span)?,
            '"' => self.lex_double_quoted(span, start)?,
            '\'' => {
                let value = self
                    .scanner
                    .scan_quoted_string('\'', '\\', true, false)?
                    .text;
                Token::quoted(self.scanner.text_between(start, self.scanner.pos()), value)
            }
            c if c.is_ascii_digit() => {
                let text = self.scanner.scan_number(false, false).text;
                let value = text.parse::<f64>().unwrap_or_default();
                Token::number(text, value)
            }
            c if is_ident_start(c) => {
                let text = self.scanner.scan_id(false, false).text;
                classify_word(text)
            }
            _ => {
                let probe: String = [Some(ch), self.scanner.peek()]
                    .into_iter()
                    .flatten()
                    .collect();
                let token = Token::longest_symbol(&probe).ok_or_else(|| {
                    ScriptError::new(ErrorKind::UnexpectedCharacter(ch), span)
                })?;
                for _ in 0..token.text.chars().count() {
                    self.scanner.advance();
                }
                token
            }
        };

        Ok(TokenData::new(token, span, offset, 0))
    }

    fn lex_block_comment(&mut self, span: Span) -> Result<Token, ScriptError> {
        self.scanner.advance();
        let result = self.scanner.scan_until('*', '/', true, false);
        if !result.success {
            return Err(ScriptError::new(ErrorKind::UnterminatedComment, span));
        }
        Ok(Token::comment(format!("/*{}*/", result.text)))
    }

    fn lex_double_quoted(&mut self, span: Span, start: usize) -> Result<Token, ScriptError> {
        self.scanner.advance();
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut interpolated = false;

        loop {
            match self.scanner.current() {
                None => return Err(ScriptError::new(ErrorKind::UnterminatedString, span)),
                Some('\\') => {
                    self.scanner.advance();
                    let Some(next) = self.scanner.read_char() else {
                        return Err(ScriptError::new(ErrorKind::UnterminatedString, span));
                    };
                    text.push(decode_escape(next));
                }
                Some('"') => {
                    self.scanner.advance();
                    break;
                }
                Some(c) if c == self.marker && self.scanner.peek() == Some('{') => {
                    interpolated = true;
                    if !text.is_empty() {
                        parts.push(InterpolationPart::Text(std::mem::take(&mut text)));
                    }
                    if self.depth >= self.max_depth {
                        return Err(ScriptError::new(
                            ErrorKind::NestingTooDeep {
                                what: "interpolation",
                                max: self.max_depth,
                            },
                            self.scanner.span(),
                        ));
                    }
                    self.scanner.advance();
                    self.scanner.advance();
                    let section_span = self.scanner.span();
                    let section_offset = self.base_offset + self.scanner.pos();
                    let body = self.scan_section_body(span)?;
                    let tokens = self
                        .nested(&body, section_span, section_offset)
                        .tokenize()?;
                    parts.push(InterpolationPart::Tokens(tokens));
                }
                Some(c) => {
                    text.push(c);
                    self.scanner.advance();
                }
            }
        }

        let raw = self.scanner.text_between(start, self.scanner.pos());
        if !interpolated {
            return Ok(Token::quoted(raw, text));
        }
        if !text.is_empty() {
            parts.push(InterpolationPart::Text(text));
        }
        Ok(Token::interpolated(raw, parts))
    }

    /// Raw text up to the `}` matching an already consumed `#{`.
    fn scan_section_body(&mut self, span: Span) -> Result<String, ScriptError> {
        let mut body = String::new();
        let mut depth = 1usize;
        while let Some(c) = self.scanner.current() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.scanner.advance();
                        return Ok(body);
                    }
                }
                '"' | '\'' => {
                    self.copy_quoted(c, &mut body);
                    continue;
                }
                _ => {}
            }
            body.push(c);
            self.scanner.advance();
        }
        Err(ScriptError::new(ErrorKind::UnterminatedInterpolation, span))
    }

    fn copy_quoted(&mut self, quote: char, body: &mut String) {
        body.push(quote);
        self.scanner.advance();
        while let Some(c) = self.scanner.read_char() {
            body.push(c);
            if c == '\\' {
                if let Some(escaped) = self.scanner.read_char() {
                    body.push(escaped);
                }
            } else if c == quote {
                return;
            }
        }
    }
}

fn classify_word(text: String) -> Token {
    match text.as_str() {
        "true" => Token::boolean(true),
        "false" => Token::boolean(false),
        "null" => Token::null(),
        _ => Token::keyword(&text).unwrap_or_else(|| Token::ident(text)),
    }
}
