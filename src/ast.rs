use std::rc::Rc;

use serde::Serialize;

use crate::scope::{FunctionMeta, ScopeId, SymbolTable};
use crate::token::Span;
use crate::value::Value;

/// Parsed script: top-level statements plus the symbols they defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Expr>,
    pub symbols: SymbolTable,
}

/// Expression node. Statements are expressions too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Scope the node was parsed in.
    pub scope: ScopeId,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Relational and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

/// Short-circuit logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Any infix operator the expression parser knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Math(MathOp),
    Compare(CompareOp),
    Logical(LogicalOp),
}

impl Operator {
    #[must_use]
    pub fn from_symbol(text: &str) -> Option<Self> {
        let op = match text {
            "*" => Self::Math(MathOp::Mul),
            "/" => Self::Math(MathOp::Div),
            "%" => Self::Math(MathOp::Mod),
            "+" => Self::Math(MathOp::Add),
            "-" => Self::Math(MathOp::Sub),
            "<" => Self::Compare(CompareOp::Less),
            "<=" => Self::Compare(CompareOp::LessEq),
            ">" => Self::Compare(CompareOp::Greater),
            ">=" => Self::Compare(CompareOp::GreaterEq),
            "==" => Self::Compare(CompareOp::Eq),
            "!=" => Self::Compare(CompareOp::NotEq),
            "&&" => Self::Logical(LogicalOp::And),
            "||" => Self::Logical(LogicalOp::Or),
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Math(MathOp::Mul | MathOp::Div | MathOp::Mod) => 5,
            Self::Math(MathOp::Add | MathOp::Sub) => 4,
            Self::Compare(
                CompareOp::Less | CompareOp::LessEq | CompareOp::Greater | CompareOp::GreaterEq,
            ) => 3,
            Self::Compare(CompareOp::Eq | CompareOp::NotEq) => 2,
            Self::Logical(LogicalOp::And) => 1,
            Self::Logical(LogicalOp::Or) => 0,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Math(MathOp::Add) => "+",
            Self::Math(MathOp::Sub) => "-",
            Self::Math(MathOp::Mul) => "*",
            Self::Math(MathOp::Div) => "/",
            Self::Math(MathOp::Mod) => "%",
            Self::Compare(CompareOp::Eq) => "==",
            Self::Compare(CompareOp::NotEq) => "!=",
            Self::Compare(CompareOp::Less) => "<",
            Self::Compare(CompareOp::LessEq) => "<=",
            Self::Compare(CompareOp::Greater) => ">",
            Self::Compare(CompareOp::GreaterEq) => ">=",
            Self::Logical(LogicalOp::And) => "&&",
            Self::Logical(LogicalOp::Or) => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Negate,
    Not,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// `=` and the compound assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    #[must_use]
    pub fn from_symbol(text: &str) -> Option<Self> {
        let op = match text {
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Sub,
            "*=" => Self::Mul,
            "/=" => Self::Div,
            "%=" => Self::Mod,
            _ => return None,
        };
        Some(op)
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
        }
    }
}

/// What a call invokes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Callee {
    /// Function or module member by (qualified) name: `print`, `math.min`.
    Named(String),
    /// Result of an expression: `obj.method`, `handlers[0]`.
    Expr(Box<Expr>),
}

/// A named function or lambda.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub meta: FunctionMeta,
    pub body: Vec<Expr>,
    /// Scope holding the parameters.
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Constant(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: MathOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `&&` / `||`.
    Condition {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Option<Box<Expr>>,
        /// Introduced by `var`.
        declare: bool,
    },
    /// `var a = 1, b = 2`; every entry is an `Assign`.
    MultiAssign(Vec<Expr>),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        target: Box<Expr>,
        name: String,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Block(Vec<Expr>),
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },
    For {
        init: Box<Expr>,
        condition: Box<Expr>,
        step: Box<Expr>,
        body: Box<Expr>,
    },
    ForEach {
        variable: String,
        source: Box<Expr>,
        body: Box<Expr>,
    },
    TryCatch {
        body: Box<Expr>,
        error_name: String,
        handler: Box<Expr>,
    },
    FunctionDeclare(Rc<FunctionDecl>),
    Lambda(Rc<FunctionDecl>),
    Return(Option<Box<Expr>>),
    Break,
    Continue,
    Throw(Box<Expr>),
    /// String with `#{...}` sections; text parts are string constants.
    Interpolated(Vec<Expr>),
    /// Call into a host binding produced by a plugin.
    BindingCall {
        binding: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span, scope: ScopeId) -> Self {
        Self { kind, span, scope }
    }

    /// `true` for nodes that may appear left of `=`.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Variable(_) | ExprKind::Index { .. } | ExprKind::Member { .. }
        )
    }

    /// The constant value, if this node is a constant.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// Name of a variable reference.
    #[must_use]
    pub fn as_variable(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Variable(name) => Some(name),
            _ => None,
        }
    }
}
