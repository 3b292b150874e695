use serde::{Deserialize, Serialize};

use crate::lexer::{DEFAULT_INTERPOLATION_DEPTH, DEFAULT_INTERPOLATION_MARKER};
use crate::token_iter::MIN_LOOKAHEAD;

/// Default lookahead window.
pub const DEFAULT_LOOKAHEAD: usize = 8;

/// Resource caps that turn pathological input into `Limit` errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Script length in characters.
    pub max_script_length: usize,
    /// Nested blocks.
    pub max_statement_depth: usize,
    /// Calls nested inside call arguments.
    pub max_call_depth: usize,
    /// Links in one `a.b[c](d)` chain.
    pub max_member_depth: usize,
    /// Open parentheses at once.
    pub max_paren_depth: usize,
    /// Operands nested inside other operands: unary operators, groups,
    /// array items, map values, call arguments, interpolated sections.
    pub max_expression_depth: usize,
    /// `#{...}` sections nested inside strings of other sections.
    pub max_interpolation_depth: usize,
    pub max_params: usize,
    pub max_aliases: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_script_length: 1_000_000,
            max_statement_depth: 64,
            max_call_depth: 32,
            max_member_depth: 32,
            max_paren_depth: 32,
            max_expression_depth: 64,
            max_interpolation_depth: DEFAULT_INTERPOLATION_DEPTH,
            max_params: 16,
            max_aliases: 8,
        }
    }
}

impl Limits {
    #[must_use]
    pub const fn max_script_length(mut self, n: usize) -> Self {
        self.max_script_length = n;
        self
    }

    #[must_use]
    pub const fn max_statement_depth(mut self, n: usize) -> Self {
        self.max_statement_depth = n;
        self
    }

    #[must_use]
    pub const fn max_call_depth(mut self, n: usize) -> Self {
        self.max_call_depth = n;
        self
    }

    #[must_use]
    pub const fn max_member_depth(mut self, n: usize) -> Self {
        self.max_member_depth = n;
        self
    }

    #[must_use]
    pub const fn max_paren_depth(mut self, n: usize) -> Self {
        self.max_paren_depth = n;
        self
    }

    #[must_use]
    pub const fn max_expression_depth(mut self, n: usize) -> Self {
        self.max_expression_depth = n;
        self
    }

    #[must_use]
    pub const fn max_interpolation_depth(mut self, n: usize) -> Self {
        self.max_interpolation_depth = n;
        self
    }

    #[must_use]
    pub const fn max_params(mut self, n: usize) -> Self {
        self.max_params = n;
        self
    }

    #[must_use]
    pub const fn max_aliases(mut self, n: usize) -> Self {
        self.max_aliases = n;
        self
    }
}

/// Settings for one [`Frontend`](crate::Frontend).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Character that, followed by `{`, opens an interpolated section.
    pub interpolation_marker: char,
    /// Tokens of lookahead; raised to the minimum of 4.
    pub lookahead: usize,
    pub limits: Limits,
    /// Script path reported in errors.
    pub file: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            interpolation_marker: DEFAULT_INTERPOLATION_MARKER,
            lookahead: DEFAULT_LOOKAHEAD,
            limits: Limits::default(),
            file: None,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub const fn interpolation_marker(mut self, marker: char) -> Self {
        self.interpolation_marker = marker;
        self
    }

    #[must_use]
    pub fn lookahead(mut self, k: usize) -> Self {
        self.lookahead = k.max(MIN_LOOKAHEAD);
        self
    }

    #[must_use]
    pub const fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }
}
