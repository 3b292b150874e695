//! Shorthand constructors for syntax trees.
//!
//! Plugins and tests build nodes with these; every node starts at
//! line 1, column 1 in the global scope until moved with [`Expr::at`]
//! and [`Expr::in_scope`].
//!
//! ```
//! use fscript::ast::{Expr, MathOp};
//!
//! let sum = Expr::binary(MathOp::Add, Expr::number(1.0), Expr::var("x"));
//! assert_eq!(fscript::formatter::format_expr(&sum), "(1 + x)");
//! ```

use std::rc::Rc;

use crate::ast::{
    AssignOp, Callee, CompareOp, Expr, ExprKind, FunctionDecl, LogicalOp, MathOp, Operator,
    UnaryOp,
};
use crate::scope::{GLOBAL_SCOPE, ScopeId};
use crate::token::Span;
use crate::value::Value;

impl Expr {
    fn bare(kind: ExprKind) -> Self {
        Self::new(kind, Span::new(1, 1), GLOBAL_SCOPE)
    }

    /// Move the node to `span`.
    #[must_use]
    pub const fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Attach the node to `scope`.
    #[must_use]
    pub const fn in_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self::bare(ExprKind::Constant(value))
    }

    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::constant(Value::Number(n))
    }

    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::constant(Value::Str(s.into()))
    }

    #[must_use]
    pub fn boolean(b: bool) -> Self {
        Self::constant(Value::Bool(b))
    }

    #[must_use]
    pub fn null() -> Self {
        Self::constant(Value::Null)
    }

    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::bare(ExprKind::Variable(name.into()))
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::bare(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn binary(op: MathOp, left: Self, right: Self) -> Self {
        Self::bare(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn compare(op: CompareOp, left: Self, right: Self) -> Self {
        Self::bare(ExprKind::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[must_use]
    pub fn condition(op: LogicalOp, left: Self, right: Self) -> Self {
        Self::bare(ExprKind::Condition {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Binary, compare or condition node, whichever `op` calls for.
    /// The node takes the position of `left`.
    #[must_use]
    pub fn operation(op: Operator, left: Self, right: Self) -> Self {
        let (span, scope) = (left.span, left.scope);
        let node = match op {
            Operator::Math(op) => Self::binary(op, left, right),
            Operator::Compare(op) => Self::compare(op, left, right),
            Operator::Logical(op) => Self::condition(op, left, right),
        };
        node.at(span).in_scope(scope)
    }

    /// `target op value`; `declare` for `var` declarations.
    #[must_use]
    pub fn assign(target: Self, op: AssignOp, value: Option<Self>, declare: bool) -> Self {
        Self::bare(ExprKind::Assign {
            target: Box::new(target),
            op,
            value: value.map(Box::new),
            declare,
        })
    }

    #[must_use]
    pub fn index(target: Self, index: Self) -> Self {
        Self::bare(ExprKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    #[must_use]
    pub fn member(target: Self, name: impl Into<String>) -> Self {
        Self::bare(ExprKind::Member {
            target: Box::new(target),
            name: name.into(),
        })
    }

    /// Call of a function by (qualified) name.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::bare(ExprKind::Call {
            callee: Callee::Named(name.into()),
            args,
        })
    }

    /// Call of whatever `callee` evaluates to.
    #[must_use]
    pub fn call_expr(callee: Self, args: Vec<Self>) -> Self {
        Self::bare(ExprKind::Call {
            callee: Callee::Expr(Box::new(callee)),
            args,
        })
    }

    #[must_use]
    pub fn array(items: Vec<Self>) -> Self {
        Self::bare(ExprKind::Array(items))
    }

    #[must_use]
    pub fn map(entries: Vec<(String, Self)>) -> Self {
        Self::bare(ExprKind::Map(entries))
    }

    #[must_use]
    pub fn block(statements: Vec<Self>) -> Self {
        Self::bare(ExprKind::Block(statements))
    }

    #[must_use]
    pub fn function(decl: Rc<FunctionDecl>) -> Self {
        let span = decl.span;
        Self::bare(ExprKind::FunctionDeclare(decl)).at(span)
    }

    #[must_use]
    pub fn lambda(decl: Rc<FunctionDecl>) -> Self {
        let span = decl.span;
        Self::bare(ExprKind::Lambda(decl)).at(span)
    }

    /// Call into the host binding `binding`.
    #[must_use]
    pub fn binding_call(binding: impl Into<String>, args: Vec<Self>) -> Self {
        Self::bare(ExprKind::BindingCall {
            binding: binding.into(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_picks_node_kind() {
        let left = Expr::var("a").at(Span::new(2, 3)).in_scope(4);
        let node = Expr::operation(
            Operator::Logical(LogicalOp::Or),
            left,
            Expr::boolean(true),
        );
        assert!(matches!(node.kind, ExprKind::Condition { .. }));
        assert_eq!(node.span, Span::new(2, 3));
        assert_eq!(node.scope, 4);

        let node = Expr::operation(
            Operator::Compare(CompareOp::Less),
            Expr::number(1.0),
            Expr::number(2.0),
        );
        assert!(matches!(node.kind, ExprKind::Compare { .. }));
    }

    #[test]
    fn assignable_targets() {
        assert!(Expr::var("x").is_assignable());
        assert!(Expr::index(Expr::var("x"), Expr::number(0.0)).is_assignable());
        assert!(Expr::member(Expr::var("x"), "y").is_assignable());
        assert!(!Expr::number(1.0).is_assignable());
        assert!(!Expr::call("f", vec![]).is_assignable());
    }
}
