use std::fmt;

use crate::token::Span;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Limit,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "Lexical"),
            Self::Syntax => write!(f, "Syntax"),
            Self::Limit => write!(f, "Limit"),
        }
    }
}

/// Classifies an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// End of input before the closing quote.
    UnterminatedString,
    /// End of input before the `}` closing a `#{` section.
    UnterminatedInterpolation,
    /// End of input inside `/* ... */`.
    UnterminatedComment,
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// Lookahead request past the token window.
    LookaheadExceeded { requested: usize, window: usize },
    /// Attempt to pop the global scope.
    ScopeUnderflow,
    /// A specific token was required.
    Expected { expected: String, found: String },
    /// Token that cannot appear here.
    UnexpectedToken(String),
    /// Two expressions with no operator between them.
    MissingOperator(String),
    /// A statement loop iteration consumed nothing.
    NoProgress(String),
    /// Statement form was recognized but is malformed.
    InvalidStatement(String),
    /// Left side of an assignment is not assignable.
    InvalidAssignmentTarget,
    /// Grammar pattern could not be compiled.
    InvalidGrammar { pattern: String, message: String },
    /// Script text longer than allowed.
    ScriptTooLong { length: usize, max: usize },
    /// A nesting counter passed its maximum.
    NestingTooDeep { what: &'static str, max: usize },
    /// Too many items of one kind (parameters, aliases).
    TooMany { what: &'static str, max: usize },
}

impl ErrorKind {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnterminatedString
            | Self::UnterminatedInterpolation
            | Self::UnterminatedComment
            | Self::UnexpectedCharacter(_)
            | Self::LookaheadExceeded { .. }
            | Self::ScopeUnderflow => ErrorCategory::Lexical,
            Self::Expected { .. }
            | Self::UnexpectedToken(_)
            | Self::MissingOperator(_)
            | Self::NoProgress(_)
            | Self::InvalidStatement(_)
            | Self::InvalidAssignmentTarget
            | Self::InvalidGrammar { .. } => ErrorCategory::Syntax,
            Self::ScriptTooLong { .. } | Self::NestingTooDeep { .. } | Self::TooMany { .. } => {
                ErrorCategory::Limit
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::UnterminatedInterpolation => {
                write!(f, "unterminated interpolation, expected '}}'")
            }
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::UnexpectedCharacter(ch) => write!(f, "unexpected character: {ch}"),
            Self::LookaheadExceeded { requested, window } => {
                write!(
                    f,
                    "cannot peek {requested} tokens ahead, \
                     lookahead window is {window}"
                )
            }
            Self::ScopeUnderflow => write!(f, "cannot pop the global scope"),
            Self::Expected { expected, found } if found.is_empty() => {
                write!(f, "expected '{expected}', reached end of script")
            }
            Self::Expected { expected, found } => {
                write!(f, "expected '{expected}', got '{found}'")
            }
            Self::UnexpectedToken(t) if t.is_empty() => write!(f, "unexpected end of script"),
            Self::UnexpectedToken(t) => write!(f, "unexpected token '{t}'"),
            Self::MissingOperator(t) => {
                write!(f, "expected an operator or end of expression before '{t}'")
            }
            Self::NoProgress(t) => write!(f, "parser did not advance at '{t}'"),
            Self::InvalidStatement(msg) => write!(f, "{msg}"),
            Self::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            Self::InvalidGrammar { pattern, message } => {
                write!(f, "invalid grammar '{pattern}': {message}")
            }
            Self::ScriptTooLong { length, max } => {
                write!(f, "script length {length} exceeds the limit of {max}")
            }
            Self::NestingTooDeep { what, max } => {
                write!(f, "{what} nesting exceeds the limit of {max}")
            }
            Self::TooMany { what, max } => write!(f, "more than {max} {what}"),
        }
    }
}

/// Error produced while lexing or parsing a script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{} error: {kind} at line {}, column {}{}",
    kind.category(),
    span.line,
    span.column,
    file.as_deref().map(|f| format!(" in {f}")).unwrap_or_default()
)]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub file: Option<String>,
    pub span: Span,
}

impl ScriptError {
    #[must_use]
    pub const fn new(kind: ErrorKind, span: Span) -> Self {
        Self {
            kind,
            file: None,
            span,
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Attach the script path, keeping one already set.
    #[must_use]
    pub fn in_file(mut self, file: Option<&str>) -> Self {
        if self.file.is_none() {
            self.file = file.map(str::to_string);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_location() {
        let err = ScriptError::new(ErrorKind::UnterminatedString, Span::new(3, 7))
            .in_file(Some("main.fs"));
        assert_eq!(
            err.to_string(),
            "Lexical error: unterminated string at line 3, column 7 in main.fs"
        );
    }

    #[test]
    fn categories() {
        assert_eq!(
            ErrorKind::TooMany {
                what: "parameters",
                max: 2
            }
            .category(),
            ErrorCategory::Limit
        );
        assert_eq!(
            ErrorKind::InvalidAssignmentTarget.category(),
            ErrorCategory::Syntax
        );
    }

    #[test]
    fn expected_at_end_of_script() {
        let kind = ErrorKind::Expected {
            expected: ")".to_string(),
            found: String::new(),
        };
        assert_eq!(kind.to_string(), "expected ')', reached end of script");
    }
}
