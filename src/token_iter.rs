//! Bounded lookahead over lexer output.
//!
//! The iterator holds at most `2k` significant tokens. When the cursor
//! crosses the midpoint of the window the consumed half is dropped and
//! `k` more tokens are pulled from the [`TokenSource`]. Looking further
//! than `k` tokens ahead is refused outright.

use std::collections::VecDeque;

use crate::error::{ErrorKind, ScriptError};
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenData, TokenKind};

/// Smallest accepted lookahead depth.
pub const MIN_LOOKAHEAD: usize = 4;

/// Pull-based supplier of tokens.
pub trait TokenSource {
    /// Up to `count` more tokens; the batch reaching end of input ends
    /// with an `End` token.
    ///
    /// # Errors
    ///
    /// Any error raised while producing the tokens.
    fn next_batch(&mut self, count: usize) -> Result<Vec<TokenData>, ScriptError>;
}

impl TokenSource for Lexer<'_> {
    fn next_batch(&mut self, count: usize) -> Result<Vec<TokenData>, ScriptError> {
        self.token_batch(count)
    }
}

/// Cursor over a token stream with a fixed lookahead window.
pub struct TokenIterator<'a> {
    window: VecDeque<TokenData>,
    cursor: usize,
    lookahead: usize,
    source: Option<Box<dyn TokenSource + 'a>>,
    exhausted: bool,
}

impl<'a> TokenIterator<'a> {
    /// Iterator pulling from `source`, with `lookahead` (at least
    /// [`MIN_LOOKAHEAD`]) tokens of lookahead.
    ///
    /// # Errors
    ///
    /// Errors from the first fetch.
    pub fn new(source: Box<dyn TokenSource + 'a>, lookahead: usize) -> Result<Self, ScriptError> {
        let lookahead = lookahead.max(MIN_LOOKAHEAD);
        let mut iter = Self {
            window: VecDeque::with_capacity(lookahead * 2),
            cursor: 0,
            lookahead,
            source: Some(source),
            exhausted: false,
        };
        iter.fill(lookahead * 2)?;
        iter.skip_trivia(false)?;
        Ok(iter)
    }

    /// Iterator over an already tokenized sequence.
    #[must_use]
    pub fn from_tokens(tokens: Vec<TokenData>, lookahead: usize) -> Self {
        let mut window: VecDeque<TokenData> = tokens.into();
        if window.back().is_none_or(|t| t.kind() != TokenKind::End) {
            let (span, offset, index) = window
                .back()
                .map_or((Span::new(1, 1), 0, 0), |t| (t.span, t.offset, t.index + 1));
            window.push_back(TokenData::new(Token::end(), span, offset, index));
        }
        let mut cursor = 0;
        while window[cursor].token.is_trivia() {
            cursor += 1;
        }
        Self {
            window,
            cursor,
            lookahead: lookahead.max(MIN_LOOKAHEAD),
            source: None,
            exhausted: true,
        }
    }

    #[must_use]
    pub const fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Number of tokens currently held.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn current(&self) -> &TokenData {
        &self.window[self.cursor]
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.current().span
    }

    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.current().is(text)
    }

    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.current().kind()
    }

    /// `true` once the `End` token is current; stays `true`.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.kind() == TokenKind::End
    }

    /// `;`, a new-line, or end of input.
    #[must_use]
    pub fn is_end_of_stmt(&self) -> bool {
        self.is_explicit_end_of_stmt() || self.is_ended()
    }

    /// `;` or a new-line.
    #[must_use]
    pub fn is_explicit_end_of_stmt(&self) -> bool {
        self.is(";") || self.kind() == TokenKind::NewLine
    }

    /// End of statement, or the `}` closing a block.
    #[must_use]
    pub fn is_end_of_stmt_or_block(&self) -> bool {
        self.is_end_of_stmt() || self.is("}")
    }

    /// Error of `kind` located at the current token.
    #[must_use]
    pub fn error(&self, kind: ErrorKind) -> ScriptError {
        ScriptError::new(kind, self.span())
    }

    /// Move over `count` significant tokens. Comments are always
    /// skipped, new-lines only with `pass_new_line`. A no-op at the end.
    ///
    /// # Errors
    ///
    /// Errors raised while refilling the window.
    pub fn advance(&mut self, count: usize, pass_new_line: bool) -> Result<(), ScriptError> {
        for _ in 0..count {
            if self.is_ended() {
                break;
            }
            self.cursor += 1;
            self.ensure(self.cursor)?;
            self.skip_trivia(pass_new_line)?;
        }
        self.compact()
    }

    /// Skip new-line tokens (and comments) at the cursor.
    ///
    /// # Errors
    ///
    /// Errors raised while refilling the window.
    pub fn skip_new_lines(&mut self) -> Result<(), ScriptError> {
        self.skip_trivia(true)?;
        self.compact()
    }

    /// The significant token `count` places ahead; `peek(0)` is the
    /// current token. Past the end the `End` token is returned.
    ///
    /// # Errors
    ///
    /// `LookaheadExceeded` when `count` is larger than the window.
    pub fn peek(&mut self, count: usize, pass_new_line: bool) -> Result<&TokenData, ScriptError> {
        let index = self.peek_index(count, pass_new_line)?;
        Ok(&self.window[index])
    }

    /// Whether the token `count` places ahead is spelled `text`.
    ///
    /// # Errors
    ///
    /// See [`Self::peek`].
    pub fn peek_is(&mut self, count: usize, text: &str) -> Result<bool, ScriptError> {
        Ok(self.peek(count, false)?.is(text))
    }

    /// Require the current token to be `text` and move past it.
    ///
    /// # Errors
    ///
    /// `Expected` naming `text` when the current token differs.
    pub fn expect(&mut self, text: &str, pass_new_line: bool) -> Result<(), ScriptError> {
        if !self.is(text) {
            return Err(self.error(ErrorKind::Expected {
                expected: text.to_string(),
                found: self.current().text().to_string(),
            }));
        }
        self.advance(1, pass_new_line)
    }

    /// Require an identifier, returning its text.
    ///
    /// # Errors
    ///
    /// `Expected` when the current token is not an identifier.
    pub fn expect_id(&mut self, pass_new_line: bool) -> Result<String, ScriptError> {
        self.expect_kind(TokenKind::Ident, "identifier", pass_new_line)
            .map(|t| t.text().to_string())
    }

    /// Require a token of `kind` (described as `what` in errors),
    /// returning it.
    ///
    /// # Errors
    ///
    /// `Expected` when the kind differs.
    pub fn expect_kind(
        &mut self,
        kind: TokenKind,
        what: &str,
        pass_new_line: bool,
    ) -> Result<TokenData, ScriptError> {
        if self.kind() != kind {
            return Err(self.error(ErrorKind::Expected {
                expected: what.to_string(),
                found: self.current().text().to_string(),
            }));
        }
        let data = self.current().clone();
        self.advance(1, pass_new_line)?;
        Ok(data)
    }

    /// Collapse `count` significant tokens starting at the cursor into
    /// `token`, which takes the position of the first one. A `count` of
    /// zero still replaces the current token.
    ///
    /// # Errors
    ///
    /// See [`Self::peek`].
    pub fn replace(&mut self, count: usize, token: Token) -> Result<(), ScriptError> {
        let last = self.peek_index(count.max(1) - 1, false)?;
        let first = self.window[self.cursor].clone();
        self.window.drain(self.cursor..=last);
        self.window
            .insert(self.cursor, TokenData { token, ..first });
        Ok(())
    }

    fn peek_index(&mut self, count: usize, pass_new_line: bool) -> Result<usize, ScriptError> {
        if count > self.lookahead {
            return Err(self.error(ErrorKind::LookaheadExceeded {
                requested: count,
                window: self.lookahead,
            }));
        }
        let mut index = self.cursor;
        let mut remaining = count;
        while remaining > 0 {
            if self.window[index].kind() == TokenKind::End {
                break;
            }
            index += 1;
            self.ensure(index)?;
            if !skippable(&self.window[index], pass_new_line) {
                remaining -= 1;
            }
        }
        Ok(index)
    }

    fn skip_trivia(&mut self, pass_new_line: bool) -> Result<(), ScriptError> {
        while skippable(self.current(), pass_new_line) {
            self.cursor += 1;
            self.ensure(self.cursor)?;
        }
        Ok(())
    }

    /// Make `index` valid, pulling more tokens if needed.
    fn ensure(&mut self, index: usize) -> Result<(), ScriptError> {
        while index >= self.window.len() && !self.exhausted {
            self.fill(self.lookahead)?;
        }
        if index >= self.window.len() {
            // The stream always ends with `End`; never step past it.
            self.cursor = self.cursor.min(self.window.len() - 1);
        }
        Ok(())
    }

    fn fill(&mut self, count: usize) -> Result<(), ScriptError> {
        if self.exhausted {
            return Ok(());
        }
        let Some(source) = self.source.as_mut() else {
            self.exhausted = true;
            return Ok(());
        };
        let batch = source.next_batch(count)?;
        log::trace!("token window refilled with {} tokens", batch.len());
        if batch.is_empty() || batch.iter().any(|t| t.kind() == TokenKind::End) {
            self.exhausted = true;
        }
        self.window.extend(batch);
        if self.window.back().is_none_or(|t| t.kind() != TokenKind::End) && self.exhausted {
            let (span, offset, index) = self
                .window
                .back()
                .map_or((Span::new(1, 1), 0, 0), |t| (t.span, t.offset, t.index + 1));
            self.window
                .push_back(TokenData::new(Token::end(), span, offset, index));
        }
        Ok(())
    }

    /// Drop the consumed half once the cursor crosses the midpoint.
    fn compact(&mut self) -> Result<(), ScriptError> {
        while self.cursor >= self.lookahead {
            self.window.drain(..self.lookahead);
            self.cursor -= self.lookahead;
            self.fill(self.lookahead)?;
        }
        Ok(())
    }
}

fn skippable(data: &TokenData, pass_new_line: bool) -> bool {
    data.token.is_trivia() || (pass_new_line && data.kind() == TokenKind::NewLine)
}
