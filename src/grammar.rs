//! Compiler for the one-line grammar patterns plugins use to describe
//! the token sequences they recognize.
//!
//! ```text
//! print $msg:@word (to $target:@word)?
//! $month:(jan|feb|mar) $day:@number (, $year:@number)?
//! ```
//!
//! * bare words match their literal text; `\x` escapes one character
//! * `$name:type` is a named, typed, required capture; `type` is one of
//!   the [`MatchType`] names (with or without a leading `@`) or a
//!   literal set `(a|b|c)`
//! * `#name` captures any single token; a second `#name` must repeat it
//! * `?` makes the preceding atom optional
//! * `( ... )` groups a sequence, `|` joins its two neighbours into an
//!   alternation

use crate::error::{ErrorKind, ScriptError};
use crate::token::Span;

/// Typed placeholder kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Numeric literal.
    Number,
    /// Identifier-like word.
    Word,
    /// `H`, `H:MM`, optionally followed by `am`/`pm`.
    Time,
    /// `true false yes no on off`.
    Bool,
    /// String literal shaped like a URI or path.
    Uri,
    /// One of the plugin's own start tokens.
    StartToken,
    /// Identifier that names a defined symbol.
    IdentSymbol,
    /// Identifier whose plural (`name + "s"`) is a defined symbol.
    SingularSymbol,
    /// Comma-separated run of identifiers.
    ParamNames,
    /// Key of the plugin's first token map.
    TokenMap1,
    /// Key of the plugin's second token map.
    TokenMap2,
    /// Token that ends an expression.
    ExprTerminators,
}

impl MatchType {
    /// Parse a type name; case, `@`, `-` and `_` are ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim_start_matches('@')
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        let ty = match normalized.as_str() {
            "number" => Self::Number,
            "word" => Self::Word,
            "time" => Self::Time,
            "bool" => Self::Bool,
            "uri" => Self::Uri,
            "starttoken" => Self::StartToken,
            "identsymbol" => Self::IdentSymbol,
            "singularsymbol" => Self::SingularSymbol,
            "paramnames" => Self::ParamNames,
            "tokenmap1" => Self::TokenMap1,
            "tokenmap2" => Self::TokenMap2,
            "exprterminators" => Self::ExprTerminators,
            _ => return None,
        };
        Some(ty)
    }

    /// Whether a successful match also records `name + "Value"`.
    #[must_use]
    pub const fn records_value(self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::Time
                | Self::Word
                | Self::Bool
                | Self::StartToken
                | Self::ParamNames
                | Self::TokenMap1
                | Self::TokenMap2
        )
    }
}

/// Leaf matcher for one token (or one typed run of tokens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Literal text to match.
    pub text: Option<String>,
    pub token_type: Option<MatchType>,
    /// Literal set from `$name:(a|b)`.
    pub values: Vec<String>,
    pub required: bool,
    /// Capture name.
    pub name: Option<String>,
    /// `#name`: any token the first time, the same text afterwards.
    pub back_reference: bool,
}

impl TokenMatch {
    fn literal(text: String) -> Self {
        Self {
            text: Some(text),
            token_type: None,
            values: Vec::new(),
            required: true,
            name: None,
            back_reference: false,
        }
    }
}

/// Sequence matched as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGroup {
    pub matches: Vec<MatchNode>,
    pub required: bool,
}

/// Either of two matchers, tried left first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGroupOr {
    pub left: Box<MatchNode>,
    pub right: Box<MatchNode>,
    pub required: bool,
}

/// Node of a compiled grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchNode {
    Token(TokenMatch),
    Group(TokenGroup),
    Or(TokenGroupOr),
}

impl MatchNode {
    #[must_use]
    pub const fn is_required(&self) -> bool {
        match self {
            Self::Token(m) => m.required,
            Self::Group(g) => g.required,
            Self::Or(o) => o.required,
        }
    }

    fn set_required(&mut self, required: bool) {
        match self {
            Self::Token(m) => m.required = required,
            Self::Group(g) => g.required = required,
            Self::Or(o) => o.required = required,
        }
    }
}

/// Number of required nodes at the top level of `nodes`.
#[must_use]
pub fn required_count(nodes: &[MatchNode]) -> usize {
    nodes.iter().filter(|n| n.is_required()).count()
}

/// Compile `pattern` into its match tree.
///
/// # Errors
///
/// `InvalidGrammar` for unbalanced groups, dangling `|` or `?`,
/// unknown placeholder types and empty capture names.
pub fn compile(pattern: &str) -> Result<Vec<MatchNode>, ScriptError> {
    let mut compiler = Compiler {
        pattern,
        chars: pattern.chars().collect(),
        pos: 0,
    };
    let nodes = compiler.sequence(0)?;
    if nodes.is_empty() {
        return Err(compiler.error("pattern is empty"));
    }
    Ok(nodes)
}

struct Compiler<'p> {
    pattern: &'p str,
    chars: Vec<char>,
    pos: usize,
}

impl Compiler<'_> {
    fn error(&self, message: &str) -> ScriptError {
        ScriptError::new(
            ErrorKind::InvalidGrammar {
                pattern: self.pattern.to_string(),
                message: message.to_string(),
            },
            Span::new(1, self.pos + 1),
        )
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Nodes up to end of input (`depth == 0`) or the `)` closing the
    /// current group, which is consumed.
    fn sequence(&mut self, depth: usize) -> Result<Vec<MatchNode>, ScriptError> {
        let mut nodes: Vec<MatchNode> = Vec::new();
        let mut pending_or = false;

        loop {
            self.skip_spaces();
            let node = match self.current() {
                None if depth > 0 => return Err(self.error("unclosed group, expected ')'")),
                None => break,
                Some(')') if depth == 0 => return Err(self.error("unmatched ')'")),
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('|') => {
                    if nodes.is_empty() || pending_or {
                        return Err(self.error("'|' needs a match on its left"));
                    }
                    pending_or = true;
                    self.pos += 1;
                    continue;
                }
                Some('?') => {
                    let Some(last) = nodes.last_mut().filter(|_| !pending_or) else {
                        return Err(self.error("'?' must follow a match"));
                    };
                    last.set_required(false);
                    self.pos += 1;
                    continue;
                }
                Some(_) => self.atom(depth)?,
            };

            if pending_or {
                pending_or = false;
                let Some(left) = nodes.pop() else {
                    return Err(self.error("'|' needs a match on its left"));
                };
                nodes.push(MatchNode::Or(TokenGroupOr {
                    left: Box::new(left),
                    right: Box::new(node),
                    required: true,
                }));
            } else {
                nodes.push(node);
            }
        }

        if pending_or {
            return Err(self.error("'|' needs a match on its right"));
        }
        Ok(nodes)
    }

    fn atom(&mut self, depth: usize) -> Result<MatchNode, ScriptError> {
        let mut node = match self.current() {
            Some('(') => {
                self.pos += 1;
                let mut inner = self.sequence(depth + 1)?;
                match inner.len() {
                    0 => return Err(self.error("empty group")),
                    1 => inner.remove(0),
                    _ => MatchNode::Group(TokenGroup {
                        matches: inner,
                        required: true,
                    }),
                }
            }
            Some('$') => {
                self.pos += 1;
                self.capture()?
            }
            Some('#') if self.chars.get(self.pos + 1).is_some_and(|c| is_name_char(*c)) => {
                self.pos += 1;
                let name = self.name();
                MatchNode::Token(TokenMatch {
                    text: None,
                    token_type: None,
                    values: Vec::new(),
                    required: true,
                    name: Some(name),
                    back_reference: true,
                })
            }
            _ => {
                let word = self.word()?;
                MatchNode::Token(TokenMatch::literal(word))
            }
        };

        if self.current() == Some('?') {
            self.pos += 1;
            node.set_required(false);
        }
        Ok(node)
    }

    /// `name:type` or `name:(a|b)` after a `$`.
    fn capture(&mut self) -> Result<MatchNode, ScriptError> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.error("capture name expected after '$'"));
        }
        if self.current() != Some(':') {
            return Err(self.error("':' expected after capture name"));
        }
        self.pos += 1;

        let mut capture = TokenMatch {
            text: None,
            token_type: None,
            values: Vec::new(),
            required: true,
            name: Some(name),
            back_reference: false,
        };

        if self.current() == Some('(') {
            self.pos += 1;
            let start = self.pos;
            while self.current().is_some_and(|c| c != ')') {
                self.pos += 1;
            }
            if self.current().is_none() {
                return Err(self.error("unclosed value set, expected ')'"));
            }
            let body: String = self.chars[start..self.pos].iter().collect();
            self.pos += 1;
            capture.values = body
                .split('|')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if capture.values.is_empty() {
                return Err(self.error("empty value set"));
            }
        } else {
            if self.current() == Some('@') {
                self.pos += 1;
            }
            let start = self.pos;
            while self
                .current()
                .is_some_and(|c| is_name_char(c) || c == '-')
            {
                self.pos += 1;
            }
            let type_name: String = self.chars[start..self.pos].iter().collect();
            capture.token_type = Some(
                MatchType::from_name(&type_name)
                    .ok_or_else(|| self.error(&format!("unknown type '{type_name}'")))?,
            );
        }
        Ok(MatchNode::Token(capture))
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self.current().is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn word(&mut self) -> Result<String, ScriptError> {
        let mut word = String::new();
        while let Some(c) = self.current() {
            match c {
                '\\' => {
                    self.pos += 1;
                    let Some(escaped) = self.current() else {
                        return Err(self.error("dangling '\\'"));
                    };
                    word.push(escaped);
                    self.pos += 1;
                }
                '(' | ')' | '|' | '?' => break,
                c if c.is_whitespace() => break,
                c => {
                    word.push(c);
                    self.pos += 1;
                }
            }
        }
        if word.is_empty() {
            return Err(self.error("match expected"));
        }
        Ok(word)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(node: &MatchNode) -> &TokenMatch {
        match node {
            MatchNode::Token(m) => m,
            other => panic!("expected a token match, got {other:?}"),
        }
    }

    #[test]
    fn typed_captures() {
        let nodes = compile("$m:@number $d:@number $y:@number?").expect("compile");
        assert_eq!(nodes.len(), 3);
        for node in &nodes {
            assert_eq!(leaf(node).token_type, Some(MatchType::Number));
        }
        assert!(nodes[0].is_required());
        assert!(nodes[1].is_required());
        assert!(!nodes[2].is_required());
        assert_eq!(leaf(&nodes[2]).name.as_deref(), Some("y"));
        assert_eq!(required_count(&nodes), 2);
    }

    #[test]
    fn grouped_alternation_collapses() {
        let nodes = compile("(a|b) c").expect("compile");
        assert_eq!(nodes.len(), 2);
        let MatchNode::Or(or) = &nodes[0] else {
            panic!("expected alternation");
        };
        assert_eq!(leaf(&or.left).text.as_deref(), Some("a"));
        assert_eq!(leaf(&or.right).text.as_deref(), Some("b"));
        assert_eq!(leaf(&nodes[1]).text.as_deref(), Some("c"));
    }

    #[test]
    fn unclosed_group_is_an_error() {
        let err = compile("(a b").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidGrammar { .. }));
        assert!(err.to_string().contains("expected ')'"));
    }

    #[test]
    fn dangling_alternation_is_an_error() {
        assert!(compile("a |").is_err());
        assert!(compile("| a").is_err());
        assert!(compile("a | | b").is_err());
        assert!(compile("a )").is_err());
        assert!(compile("?").is_err());
    }

    #[test]
    fn optional_group() {
        let nodes = compile("print (to $who:word)?").expect("compile");
        assert_eq!(nodes.len(), 2);
        let MatchNode::Group(group) = &nodes[1] else {
            panic!("expected group");
        };
        assert!(!group.required);
        assert_eq!(group.matches.len(), 2);
        assert_eq!(leaf(&group.matches[1]).token_type, Some(MatchType::Word));
    }

    #[test]
    fn value_sets_and_escapes() {
        let nodes = compile(r"$dir:(asc | desc) \( \|").expect("compile");
        assert_eq!(leaf(&nodes[0]).values, ["asc", "desc"]);
        assert_eq!(leaf(&nodes[1]).text.as_deref(), Some("("));
        assert_eq!(leaf(&nodes[2]).text.as_deref(), Some("|"));
    }

    #[test]
    fn chained_alternation_is_left_nested() {
        let nodes = compile("a|b|c").expect("compile");
        assert_eq!(nodes.len(), 1);
        let MatchNode::Or(outer) = &nodes[0] else {
            panic!("expected alternation");
        };
        assert!(matches!(*outer.left, MatchNode::Or(_)));
    }

    #[test]
    fn back_reference_and_type_spellings() {
        let nodes = compile("#tag $p:param-names $s:@singularSymbol").expect("compile");
        assert!(leaf(&nodes[0]).back_reference);
        assert_eq!(leaf(&nodes[1]).token_type, Some(MatchType::ParamNames));
        assert_eq!(leaf(&nodes[2]).token_type, Some(MatchType::SingularSymbol));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let err = compile("$x:@color").unwrap_err();
        assert!(err.to_string().contains("unknown type 'color'"));
    }
}
