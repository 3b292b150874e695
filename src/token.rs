use std::borrow::Cow;

use serde::Serialize;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Reserved word (`var`, `if`, `function`, ...).
    Keyword,
    /// Identifier.
    Ident,
    /// Operator or punctuation.
    Symbol,
    /// Numeric literal.
    Number,
    /// Quoted string without interpolation.
    Str,
    /// `true` / `false`.
    Bool,
    /// `null`.
    Null,
    /// Quoted string containing `#{...}` sections.
    Interpolated,
    /// Line (`// ...`) or block (`/* ... */`) comment.
    Comment,
    /// Line separator.
    NewLine,
    /// Run of spaces and tabs.
    Whitespace,
    /// End of input.
    End,
}

/// One section of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InterpolationPart {
    /// Literal text between sections.
    Text(String),
    /// Tokens of an embedded `#{...}` expression, terminated by `End`.
    Tokens(Vec<TokenData>),
}

/// Interpreted value of a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenValue {
    None,
    Number(f64),
    Str(String),
    Bool(bool),
    Parts(Vec<InterpolationPart>),
}

/// An immutable lexical descriptor.
///
/// Keywords and operators borrow their text from a static table, so
/// every occurrence of `+` or `while` shares the same text. Literals
/// and identifiers own theirs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Cow<'static, str>,
    pub value: TokenValue,
}

/// A token together with where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenData {
    pub token: Token,
    pub span: Span,
    /// Character offset of the first character.
    pub offset: usize,
    /// Position in the token stream.
    pub index: usize,
}

const KEYWORDS: &[&str] = &[
    "var", "if", "else", "then", "for", "in", "while", "function", "return", "break",
    "continue", "try", "catch", "throw",
];

const SYMBOLS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "+", "-",
    "*", "/", "%", "<", ">", "!", "=", "(", ")", "[", "]", "{", "}", ",", ";", ":", ".",
];

impl Token {
    /// Look up a pooled keyword.
    #[must_use]
    pub fn keyword(text: &str) -> Option<Self> {
        KEYWORDS.iter().find(|k| **k == text).map(|k| Self {
            kind: TokenKind::Keyword,
            text: Cow::Borrowed(k),
            value: TokenValue::None,
        })
    }

    /// Look up a pooled operator or punctuation token.
    #[must_use]
    pub fn symbol(text: &str) -> Option<Self> {
        SYMBOLS.iter().find(|s| **s == text).map(|s| Self {
            kind: TokenKind::Symbol,
            text: Cow::Borrowed(s),
            value: TokenValue::None,
        })
    }

    /// Longest pooled symbol that `input` starts with.
    #[must_use]
    pub fn longest_symbol(input: &str) -> Option<Self> {
        SYMBOLS
            .iter()
            .filter(|s| input.starts_with(**s))
            .max_by_key(|s| s.len())
            .and_then(|s| Self::symbol(s))
    }

    #[must_use]
    pub fn ident(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Ident,
            text: Cow::Owned(text.into()),
            value: TokenValue::None,
        }
    }

    #[must_use]
    pub fn number(text: impl Into<String>, value: f64) -> Self {
        Self {
            kind: TokenKind::Number,
            text: Cow::Owned(text.into()),
            value: TokenValue::Number(value),
        }
    }

    /// Synthesized string literal; the text is the value in double quotes.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            kind: TokenKind::Str,
            text: Cow::Owned(format!("\"{value}\"")),
            value: TokenValue::Str(value),
        }
    }

    /// String literal as written in source (`raw` keeps the quotes).
    #[must_use]
    pub fn quoted(raw: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Str,
            text: Cow::Owned(raw.into()),
            value: TokenValue::Str(value.into()),
        }
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self {
            kind: TokenKind::Bool,
            text: Cow::Borrowed(if value { "true" } else { "false" }),
            value: TokenValue::Bool(value),
        }
    }

    #[must_use]
    pub const fn null() -> Self {
        Self {
            kind: TokenKind::Null,
            text: Cow::Borrowed("null"),
            value: TokenValue::None,
        }
    }

    #[must_use]
    pub const fn end() -> Self {
        Self {
            kind: TokenKind::End,
            text: Cow::Borrowed(""),
            value: TokenValue::None,
        }
    }

    /// Line break token; `text` is `"\n"`, `"\r\n"` or `"\r"`.
    #[must_use]
    pub const fn new_line(text: &'static str) -> Self {
        Self {
            kind: TokenKind::NewLine,
            text: Cow::Borrowed(text),
            value: TokenValue::None,
        }
    }

    #[must_use]
    pub fn whitespace(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Whitespace,
            text: Cow::Owned(text.into()),
            value: TokenValue::None,
        }
    }

    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Comment,
            text: Cow::Owned(text.into()),
            value: TokenValue::None,
        }
    }

    /// String literal with `#{...}` sections.
    #[must_use]
    pub fn interpolated(raw: impl Into<String>, parts: Vec<InterpolationPart>) -> Self {
        Self {
            kind: TokenKind::Interpolated,
            text: Cow::Owned(raw.into()),
            value: TokenValue::Parts(parts),
        }
    }

    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    /// `true` for literal constants (number, string, bool, null).
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number | TokenKind::Str | TokenKind::Bool | TokenKind::Null
        )
    }

    /// `true` for tokens the iterator never stops on.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }

    /// `true` for tokens that close an expression: separators, closing
    /// brackets, `{`, keywords, new-lines and end of input.
    #[must_use]
    pub fn ends_expression(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::NewLine | TokenKind::End | TokenKind::Keyword
        ) || (self.kind == TokenKind::Symbol
            && matches!(&*self.text, ";" | "," | ")" | "]" | "}" | "{" | ":"))
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self.value {
            TokenValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Decoded content of a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl TokenData {
    #[must_use]
    pub const fn new(token: Token, span: Span, offset: usize, index: usize) -> Self {
        Self {
            token,
            span,
            offset,
            index,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.token.text
    }

    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.token.kind
    }

    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.token.is(text)
    }
}
