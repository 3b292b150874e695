//! Character-level scanning primitives.
//!
//! The scanner knows nothing about tokens. It hands out characters,
//! runs of characters matching simple shapes, and keeps the line and
//! column of the cursor current as it crosses `\n`, `\r` and `\r\n`.
//!
//! Every `scan_*` primitive takes two positioning flags:
//!
//! * `advance_first` consumes the character under the cursor before
//!   scanning (used when the caller has only inspected an opening
//!   character such as a quote).
//! * `stop_at_end` leaves the cursor on the last character of the match
//!   instead of just past it.

use crate::error::{ErrorKind, ScriptError};
use crate::token::Span;

/// Outcome of a scan primitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    pub text: String,
    /// `false` when input ended before the expected terminator.
    pub success: bool,
    /// Number of line breaks crossed.
    pub lines: usize,
}

/// Cursor over the characters of a script.
#[derive(Debug, Clone)]
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Scanner {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::with_position(text, 1, 1)
    }

    /// Scanner whose first character sits at `line`/`column` of some
    /// enclosing text (nested interpolation sections).
    #[must_use]
    pub fn with_position(text: &str, line: usize, column: usize) -> Self {
        let mut chars: Vec<char> = text.chars().collect();
        if chars.first() == Some(&'\u{FEFF}') {
            chars.remove(0);
        }
        Self {
            chars,
            pos: 0,
            line,
            col: column,
        }
    }

    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.col
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Character under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Character after the cursor.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.peek_at(1)
    }

    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Characters in `start..end`, clamped to the input.
    #[must_use]
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        self.chars[start.min(end)..end].iter().collect()
    }

    /// Consume and return the character under the cursor.
    pub fn read_char(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.advance();
        Some(ch)
    }

    /// Move past the character under the cursor, counting line breaks.
    /// Returns `true` when a line break was completed.
    pub fn advance(&mut self) -> bool {
        let Some(ch) = self.current() else {
            return false;
        };
        self.pos += 1;
        match ch {
            '\n' => {
                self.line += 1;
                self.col = 1;
                true
            }
            '\r' if self.current() != Some('\n') => {
                self.line += 1;
                self.col = 1;
                true
            }
            _ => {
                self.col += 1;
                false
            }
        }
    }

    /// Step back onto the last consumed character. Only valid when that
    /// character was not a line break.
    fn retreat(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
            self.col = self.col.saturating_sub(1).max(1);
        }
    }

    fn finish(&mut self, stop_at_end: bool, matched: bool) {
        if stop_at_end && matched {
            self.retreat();
        }
    }

    /// Consume `\n`, `\r` or `\r\n`. Returns `false` if the cursor is
    /// not on a line break.
    pub fn scan_new_line(&mut self) -> bool {
        match self.current() {
            Some('\r') => {
                self.advance();
                if self.current() == Some('\n') {
                    self.advance();
                }
                true
            }
            Some('\n') => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Run of spaces and tabs.
    pub fn scan_whitespace(&mut self, advance_first: bool, stop_at_end: bool) -> ScanResult {
        if advance_first {
            self.advance();
        }
        let text = self.take_while(|c| c == ' ' || c == '\t');
        self.finish(stop_at_end, !text.is_empty());
        ScanResult {
            text,
            success: true,
            lines: 0,
        }
    }

    /// Identifier: letters, digits and `_`.
    pub fn scan_id(&mut self, advance_first: bool, stop_at_end: bool) -> ScanResult {
        if advance_first {
            self.advance();
        }
        let text = self.take_while(is_ident_continue);
        self.finish(stop_at_end, !text.is_empty());
        ScanResult {
            success: !text.is_empty(),
            text,
            lines: 0,
        }
    }

    /// Digits with at most one decimal point that is followed by a digit.
    pub fn scan_number(&mut self, advance_first: bool, stop_at_end: bool) -> ScanResult {
        if advance_first {
            self.advance();
        }
        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        self.finish(stop_at_end, !text.is_empty());
        ScanResult {
            success: !text.is_empty(),
            text,
            lines: 0,
        }
    }

    /// Quoted string with `escape` escapes; the cursor must be on the
    /// opening quote when `advance_first` is set, or just past it
    /// otherwise. The returned text is the decoded content.
    ///
    /// # Errors
    ///
    /// `UnterminatedString` if input ends before the closing quote.
    pub fn scan_quoted_string(
        &mut self,
        quote: char,
        escape: char,
        advance_first: bool,
        stop_at_end: bool,
    ) -> Result<ScanResult, ScriptError> {
        let start = self.span();
        if advance_first {
            self.advance();
        }
        let mut text = String::new();
        let mut lines = 0;
        loop {
            match self.current() {
                None => return Err(ScriptError::new(ErrorKind::UnterminatedString, start)),
                Some(c) if c == escape => {
                    self.advance();
                    let Some(next) = self.current() else {
                        return Err(ScriptError::new(ErrorKind::UnterminatedString, start));
                    };
                    text.push(decode_escape(next));
                    if self.advance() {
                        lines += 1;
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    text.push(c);
                    if self.advance() {
                        lines += 1;
                    }
                }
            }
        }
        self.finish(stop_at_end, true);
        Ok(ScanResult {
            text,
            success: true,
            lines,
        })
    }

    /// Everything up to (not including) the next line break.
    pub fn scan_to_end_of_line(&mut self, advance_first: bool, stop_at_end: bool) -> ScanResult {
        if advance_first {
            self.advance();
        }
        let text = self.take_while(|c| c != '\n' && c != '\r');
        self.finish(stop_at_end, !text.is_empty());
        ScanResult {
            text,
            success: true,
            lines: 0,
        }
    }

    /// Everything up to the two-character sequence `first second`. The
    /// returned text excludes the terminator; the cursor ends past it,
    /// or on its second character with `stop_at_end`.
    pub fn scan_until(
        &mut self,
        first: char,
        second: char,
        advance_first: bool,
        stop_at_end: bool,
    ) -> ScanResult {
        if advance_first {
            self.advance();
        }
        let mut text = String::new();
        let mut lines = 0;
        while let Some(c) = self.current() {
            if c == first && self.peek() == Some(second) {
                self.advance();
                self.advance();
                self.finish(stop_at_end, true);
                return ScanResult {
                    text,
                    success: true,
                    lines,
                };
            }
            text.push(c);
            if self.advance() {
                lines += 1;
            }
        }
        ScanResult {
            text,
            success: false,
            lines,
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }
}

/// Character produced by an escape sequence. Anything other than
/// `n`, `t` and `r` (the quote, the escape itself) stands for itself.
#[must_use]
pub const fn decode_escape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        c => c,
    }
}

#[must_use]
pub fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

#[must_use]
pub fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
