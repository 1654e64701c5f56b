//! Diagnostic rendering of an expression subtree as infix notation, used by
//! trace logging (`spec.md`'s (NEW) tracing component) and test failure
//! messages. Not part of any spec.md operation; purely a debugging aid, so
//! it stays terse rather than round-trip-parseable.

use std::fmt;

use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, NodeId};

/// Wraps a `(&NodeArena, NodeId)` pair so it can be used with `{}`/`write!`.
pub struct DisplayNode<'a> {
    pub arena: &'a NodeArena,
    pub node: NodeId,
}

impl<'a> fmt::Display for DisplayNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.arena, self.arena.resolve(self.node))
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, arena: &NodeArena, node: NodeId) -> fmt::Result {
    match arena.get(node) {
        ExprKind::Const(v) => write!(f, "{v}"),
        ExprKind::Var(i) => write!(f, "x{}", i.id()),
        ExprKind::LowerBound(i) => write!(f, "L(x{})", i.id()),
        ExprKind::UpperBound(i) => write!(f, "U(x{})", i.id()),
        ExprKind::Opp(a) => {
            f.write_str("-(")?;
            write_node(f, arena, *a)?;
            f.write_str(")")
        }
        ExprKind::Abs(a) => {
            f.write_str("|")?;
            write_node(f, arena, *a)?;
            f.write_str("|")
        }
        ExprKind::Exp(a) => write_unary_fn(f, arena, "exp", *a),
        ExprKind::Log(a) => write_unary_fn(f, arena, "log", *a),
        ExprKind::Sin(a) => write_unary_fn(f, arena, "sin", *a),
        ExprKind::Cos(a) => write_unary_fn(f, arena, "cos", *a),
        ExprKind::Sum(args) => write_infix_list(f, arena, "+", args),
        ExprKind::Sub(a, b) => write_infix_pair(f, arena, "-", *a, *b),
        ExprKind::Mul(args) => write_infix_list(f, arena, "*", args),
        ExprKind::Div(a, b) => write_infix_pair(f, arena, "/", *a, *b),
        ExprKind::Pow(a, b) => write_infix_pair(f, arena, "^", *a, *b),
        ExprKind::Min(args) => write_fn_list(f, arena, "min", args),
        ExprKind::Max(args) => write_fn_list(f, arena, "max", args),
        ExprKind::Group(g) => {
            write!(f, "{}", g.const0)?;
            for (v, c) in &g.linear {
                write!(f, " + {c}*x{}", v.id())?;
            }
            for n in &g.nonlinear {
                f.write_str(" + ")?;
                write_node(f, arena, *n)?;
            }
            Ok(())
        }
        ExprKind::Quad(g, q) => {
            write!(f, "{}", g.const0)?;
            for (v, c) in &g.linear {
                write!(f, " + {c}*x{}", v.id())?;
            }
            for n in &g.nonlinear {
                f.write_str(" + ")?;
                write_node(f, arena, *n)?;
            }
            for (i, j, c) in q {
                write!(f, " + {c}*x{}*x{}", i.id(), j.id())?;
            }
            Ok(())
        }
        ExprKind::Ref(a) => write_node(f, arena, *a),
    }
}

fn write_unary_fn(f: &mut fmt::Formatter<'_>, arena: &NodeArena, name: &str, a: NodeId) -> fmt::Result {
    write!(f, "{name}(")?;
    write_node(f, arena, a)?;
    f.write_str(")")
}

fn write_fn_list(f: &mut fmt::Formatter<'_>, arena: &NodeArena, name: &str, args: &[NodeId]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_node(f, arena, *a)?;
    }
    f.write_str(")")
}

fn write_infix_list(f: &mut fmt::Formatter<'_>, arena: &NodeArena, op: &str, args: &[NodeId]) -> fmt::Result {
    f.write_str("(")?;
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write_node(f, arena, *a)?;
    }
    f.write_str(")")
}

fn write_infix_pair(f: &mut fmt::Formatter<'_>, arena: &NodeArena, op: &str, a: NodeId, b: NodeId) -> fmt::Result {
    f.write_str("(")?;
    write_node(f, arena, a)?;
    write!(f, " {op} ")?;
    write_node(f, arena, b)?;
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::VarIndex;

    #[test]
    fn renders_sum_of_var_and_const() {
        let mut arena = NodeArena::new();
        let x = arena.intern(ExprKind::Var(VarIndex(0)));
        let c = arena.intern(ExprKind::Const(2.0));
        let s = arena.intern(ExprKind::Sum(vec![x, c]));
        let rendered = format!("{}", DisplayNode { arena: &arena, node: s });
        assert_eq!("(x0 + 2)", rendered);
    }

    #[test]
    fn renders_nested_unary() {
        let mut arena = NodeArena::new();
        let x = arena.intern(ExprKind::Var(VarIndex(0)));
        let e = arena.intern(ExprKind::Exp(x));
        let rendered = format!("{}", DisplayNode { arena: &arena, node: e });
        assert_eq!("exp(x0)", rendered);
    }
}
