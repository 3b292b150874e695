//! Pretty-printer that writes a syntax tree back out as script text.
//!
//! Every infix operation is parenthesized so the output shows exactly
//! how the parser grouped it. Blocks are tab-indented.

use std::fmt::Write as _;

use crate::ast::{Callee, Expr, ExprKind, FunctionDecl, Operator, Program, UnaryOp};
use crate::value::Value;

/// Format a whole program, one statement per line.
#[must_use]
pub fn format(program: &Program) -> String {
    let mut out = String::new();
    for statement in &program.statements {
        write_expr(&mut out, statement, 0);
        out.push('\n');
    }
    out
}

/// Format a single node.
#[must_use]
pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out
}

fn write_expr(out: &mut String, expr: &Expr, indent: usize) {
    match &expr.kind {
        ExprKind::Constant(value) => {
            let _ = write!(out, "{value}");
        }
        ExprKind::Variable(name) => out.push_str(name),
        ExprKind::Unary { op, operand } => {
            let (prefix, suffix) = match op {
                UnaryOp::Negate => ("-", ""),
                UnaryOp::Not => ("!", ""),
                UnaryOp::PreIncrement => ("++", ""),
                UnaryOp::PreDecrement => ("--", ""),
                UnaryOp::PostIncrement => ("", "++"),
                UnaryOp::PostDecrement => ("", "--"),
            };
            out.push_str(prefix);
            write_expr(out, operand, indent);
            out.push_str(suffix);
        }
        ExprKind::Binary { op, left, right } => {
            write_infix(out, left, Operator::Math(*op).symbol(), right, indent);
        }
        ExprKind::Compare { op, left, right } => {
            write_infix(out, left, Operator::Compare(*op).symbol(), right, indent);
        }
        ExprKind::Condition { op, left, right } => {
            write_infix(out, left, Operator::Logical(*op).symbol(), right, indent);
        }
        ExprKind::Assign { declare, .. } => {
            if *declare {
                out.push_str("var ");
            }
            write_assign(out, expr, indent);
        }
        ExprKind::MultiAssign(entries) => {
            out.push_str("var ");
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_assign(out, entry, indent);
            }
        }
        ExprKind::Index { target, index } => {
            write_target(out, target, indent);
            out.push('[');
            write_expr(out, index, indent);
            out.push(']');
        }
        ExprKind::Member { target, name } => {
            write_target(out, target, indent);
            out.push('.');
            out.push_str(name);
        }
        ExprKind::Call { callee, args } => {
            match callee {
                Callee::Named(name) => out.push_str(name),
                Callee::Expr(target) => write_target(out, target, indent),
            }
            write_args(out, args, indent);
        }
        ExprKind::BindingCall { binding, args } => {
            out.push_str(binding);
            write_args(out, args, indent);
        }
        ExprKind::Array(items) => {
            out.push('[');
            write_list(out, items, indent);
            out.push(']');
        }
        ExprKind::Map(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    out.push_str(key);
                } else {
                    let _ = write!(out, "{}", Value::Str(key.clone()));
                }
                out.push_str(": ");
                write_expr(out, value, indent);
            }
            out.push('}');
        }
        ExprKind::Block(statements) => write_block(out, statements, indent),
        ExprKind::If {
            condition,
            then,
            otherwise,
        } => {
            out.push_str("if ");
            write_expr(out, condition, indent);
            out.push(' ');
            write_expr(out, then, indent);
            if let Some(otherwise) = otherwise {
                out.push_str(" else ");
                write_expr(out, otherwise, indent);
            }
        }
        ExprKind::While { condition, body } => {
            out.push_str("while ");
            write_expr(out, condition, indent);
            out.push(' ');
            write_expr(out, body, indent);
        }
        ExprKind::For {
            init,
            condition,
            step,
            body,
        } => {
            out.push_str("for (");
            write_expr(out, init, indent);
            out.push_str("; ");
            write_expr(out, condition, indent);
            out.push_str("; ");
            write_expr(out, step, indent);
            out.push_str(") ");
            write_expr(out, body, indent);
        }
        ExprKind::ForEach {
            variable,
            source,
            body,
        } => {
            let _ = write!(out, "for ({variable} in ");
            write_expr(out, source, indent);
            out.push_str(") ");
            write_expr(out, body, indent);
        }
        ExprKind::TryCatch {
            body,
            error_name,
            handler,
        } => {
            out.push_str("try ");
            write_expr(out, body, indent);
            let _ = write!(out, " catch ({error_name}) ");
            write_expr(out, handler, indent);
        }
        ExprKind::FunctionDeclare(decl) => write_function(out, decl, indent, true),
        ExprKind::Lambda(decl) => write_function(out, decl, indent, false),
        ExprKind::Return(value) => {
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                write_expr(out, value, indent);
            }
        }
        ExprKind::Break => out.push_str("break"),
        ExprKind::Continue => out.push_str("continue"),
        ExprKind::Throw(value) => {
            out.push_str("throw ");
            write_expr(out, value, indent);
        }
        ExprKind::Interpolated(parts) => {
            out.push('"');
            for part in parts {
                if let ExprKind::Constant(Value::Str(text)) = &part.kind {
                    let quoted = Value::Str(text.clone()).to_string();
                    out.push_str(&quoted[1..quoted.len() - 1]);
                } else {
                    out.push_str("#{");
                    write_expr(out, part, indent);
                    out.push('}');
                }
            }
            out.push('"');
        }
    }
}

/// Target of a member, index or call link. Operands that cannot take a
/// link of their own are wrapped in parentheses.
fn write_target(out: &mut String, target: &Expr, indent: usize) {
    let wrap = match &target.kind {
        ExprKind::Unary { .. }
        | ExprKind::Lambda(_)
        | ExprKind::Map(_)
        | ExprKind::Interpolated(_) => true,
        ExprKind::Constant(Value::Number(n)) => n.is_sign_negative(),
        _ => false,
    };
    if wrap {
        out.push('(');
        write_expr(out, target, indent);
        out.push(')');
    } else {
        write_expr(out, target, indent);
    }
}

fn write_infix(out: &mut String, left: &Expr, symbol: &str, right: &Expr, indent: usize) {
    out.push('(');
    write_expr(out, left, indent);
    let _ = write!(out, " {symbol} ");
    write_expr(out, right, indent);
    out.push(')');
}

/// `target op value` without the `var` keyword.
fn write_assign(out: &mut String, expr: &Expr, indent: usize) {
    let ExprKind::Assign {
        target, op, value, ..
    } = &expr.kind
    else {
        write_expr(out, expr, indent);
        return;
    };
    write_expr(out, target, indent);
    if let Some(value) = value {
        let _ = write!(out, " {} ", op.symbol());
        write_expr(out, value, indent);
    }
}

fn write_list(out: &mut String, items: &[Expr], indent: usize) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item, indent);
    }
}

fn write_args(out: &mut String, args: &[Expr], indent: usize) {
    out.push('(');
    write_list(out, args, indent);
    out.push(')');
}

fn write_block(out: &mut String, statements: &[Expr], indent: usize) {
    if statements.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for statement in statements {
        out.push_str(&"\t".repeat(indent + 1));
        write_expr(out, statement, indent + 1);
        out.push('\n');
    }
    out.push_str(&"\t".repeat(indent));
    out.push('}');
}

fn write_function(out: &mut String, decl: &FunctionDecl, indent: usize, named: bool) {
    let meta = &decl.meta;
    out.push_str("function");
    if named {
        let _ = write!(out, " {}", meta.name);
        if meta.has_wildcard {
            out.push('*');
        }
        for alias in &meta.aliases {
            let _ = write!(out, ", {alias}");
        }
    }
    if !named || !meta.params.is_empty() {
        let _ = write!(out, "({})", meta.params.join(", "));
    }
    out.push(' ');
    write_block(out, &decl.body, indent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, CompareOp, MathOp};
    use crate::parser::parse_str;

    #[test]
    fn infix_is_fully_parenthesized() {
        let expr = Expr::binary(
            MathOp::Mul,
            Expr::binary(MathOp::Add, Expr::number(2.0), Expr::number(3.0)),
            Expr::var("x"),
        );
        assert_eq!(format_expr(&expr), "((2 + 3) * x)");
        let cmp = Expr::compare(CompareOp::LessEq, Expr::var("a"), Expr::string("b"));
        assert_eq!(format_expr(&cmp), "(a <= \"b\")");
    }

    #[test]
    fn declarations() {
        let decl = Expr::assign(Expr::var("x"), AssignOp::Assign, Some(Expr::number(1.0)), true);
        assert_eq!(format_expr(&decl), "var x = 1");
        let bare = Expr::assign(Expr::var("y"), AssignOp::Assign, None, true);
        assert_eq!(format_expr(&bare), "var y");
        let add = Expr::assign(Expr::var("y"), AssignOp::Add, Some(Expr::number(2.0)), false);
        assert_eq!(format_expr(&add), "y += 2");
    }

    #[test]
    fn blocks_are_tab_indented() {
        let program = parse_str("if a { while b { c = 1 } } else { d = 2 }").expect("should parse");
        assert_eq!(
            format(&program),
            "if a {\n\twhile b {\n\t\tc = 1\n\t}\n} else {\n\td = 2\n}\n"
        );
    }

    #[test]
    fn functions_and_interpolation() {
        let program = parse_str(
            "function greet, hello(name) {\n  return \"hi #{name}!\"\n}\ngreet(\"bob\")",
        )
        .expect("should parse");
        assert_eq!(
            format(&program),
            "function greet, hello(name) {\n\treturn \"hi #{name}!\"\n}\ngreet(\"bob\")\n"
        );
    }

    #[test]
    fn output_parses_back_to_the_same_text() {
        let source = "var total = 0\nfor (var i = 0; i < 10; i++) {\n\ttotal += i * 2\n}\n\
                      for (item in [1, 2]) {\n\tprint(item)\n}\n\
                      try {\n\tthrow \"x\"\n} catch (e) {\n\tlog = e\n}\n";
        let first = format(&parse_str(source).expect("should parse"));
        let second = format(&parse_str(&first).expect("should parse again"));
        assert_eq!(first, second);
    }
}
