//! Deterministic simplification, per `spec.md` §4.A "Simplify": a small set
//! of algebraic identities (`x+0=x`, `x*1=x`, `x*0=0`, constant folding,
//! `-(-x)=x`, `x^1=x`) applied bottom-up. `spec.md` §8's property P5 requires
//! simplification to be idempotent — `simplify(simplify(e)) == simplify(e)`
//! — which holds here because every rule rewrites into a strictly smaller or
//! already-simplified shape and [`NodeArena::intern`] means a second pass
//! over an already-simplified tree finds every subtree already in its
//! simplified form and rewrites nothing further.

use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, NodeId};

/// Returns a simplified node equivalent to `node`, rebuilding bottom-up
/// through `intern` so that structurally-equal results are shared.
pub fn simplify(arena: &mut NodeArena, node: NodeId) -> NodeId {
    let node = arena.resolve(node);
    let kind = arena.get(node).clone();
    match kind {
        ExprKind::Const(_) | ExprKind::Var(_) | ExprKind::LowerBound(_) | ExprKind::UpperBound(_) => node,
        ExprKind::Opp(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(-v)),
                ExprKind::Opp(inner) => *inner,
                _ => arena.intern(ExprKind::Opp(a)),
            }
        }
        ExprKind::Abs(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(v.abs())),
                ExprKind::Abs(_) => a,
                _ => arena.intern(ExprKind::Abs(a)),
            }
        }
        ExprKind::Exp(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(v.exp())),
                _ => arena.intern(ExprKind::Exp(a)),
            }
        }
        ExprKind::Log(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(v.ln())),
                _ => arena.intern(ExprKind::Log(a)),
            }
        }
        ExprKind::Sin(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(v.sin())),
                _ => arena.intern(ExprKind::Sin(a)),
            }
        }
        ExprKind::Cos(a) => {
            let a = simplify(arena, a);
            match arena.get(a) {
                ExprKind::Const(v) => arena.intern(ExprKind::Const(v.cos())),
                _ => arena.intern(ExprKind::Cos(a)),
            }
        }
        ExprKind::Sum(args) => simplify_sum(arena, &args),
        ExprKind::Sub(a, b) => {
            let a = simplify(arena, a);
            let b = simplify(arena, b);
            match (arena.get(a), arena.get(b)) {
                (ExprKind::Const(x), ExprKind::Const(y)) => arena.intern(ExprKind::Const(x - y)),
                (_, ExprKind::Const(y)) if *y == 0.0 => a,
                _ if a == b => arena.intern(ExprKind::Const(0.0)),
                _ => arena.intern(ExprKind::Sub(a, b)),
            }
        }
        ExprKind::Mul(args) => simplify_mul(arena, &args),
        ExprKind::Div(a, b) => {
            let a = simplify(arena, a);
            let b = simplify(arena, b);
            match (arena.get(a), arena.get(b)) {
                (ExprKind::Const(x), ExprKind::Const(y)) => arena.intern(ExprKind::Const(x / y)),
                (_, ExprKind::Const(y)) if *y == 1.0 => a,
                _ => arena.intern(ExprKind::Div(a, b)),
            }
        }
        ExprKind::Pow(a, b) => {
            let a = simplify(arena, a);
            let b = simplify(arena, b);
            match (arena.get(a), arena.get(b)) {
                (ExprKind::Const(x), ExprKind::Const(y)) => arena.intern(ExprKind::Const(x.powf(*y))),
                (_, ExprKind::Const(y)) if *y == 1.0 => a,
                (_, ExprKind::Const(y)) if *y == 0.0 => arena.intern(ExprKind::Const(1.0)),
                _ => arena.intern(ExprKind::Pow(a, b)),
            }
        }
        ExprKind::Min(args) => simplify_list(arena, &args, ExprKind::Min as fn(Vec<NodeId>) -> ExprKind),
        ExprKind::Max(args) => simplify_list(arena, &args, ExprKind::Max as fn(Vec<NodeId>) -> ExprKind),
        ExprKind::Group(g) => {
            let mut g = g.clone();
            g.nonlinear = g.nonlinear.iter().map(|n| simplify(arena, *n)).collect();
            g.linear.retain(|(_, c)| *c != 0.0);
            if g.linear.is_empty() && g.nonlinear.is_empty() {
                arena.intern(ExprKind::Const(g.const0))
            } else {
                arena.intern(ExprKind::Group(g))
            }
        }
        ExprKind::Quad(g, q) => {
            let mut g = g.clone();
            g.nonlinear = g.nonlinear.iter().map(|n| simplify(arena, *n)).collect();
            g.linear.retain(|(_, c)| *c != 0.0);
            let q: Vec<_> = q.into_iter().filter(|(_, _, c)| *c != 0.0).collect();
            if g.linear.is_empty() && g.nonlinear.is_empty() && q.is_empty() {
                arena.intern(ExprKind::Const(g.const0))
            } else {
                arena.intern(ExprKind::Quad(g, q))
            }
        }
        ExprKind::Ref(_) => unreachable!("arena.resolve already followed Ref chains"),
    }
}

fn simplify_sum(arena: &mut NodeArena, args: &[NodeId]) -> NodeId {
    let mut const_acc = 0.0;
    let mut rest = Vec::new();
    for a in args {
        let a = simplify(arena, *a);
        match arena.get(a) {
            ExprKind::Const(v) => const_acc += v,
            _ => rest.push(a),
        }
    }
    if rest.is_empty() {
        return arena.intern(ExprKind::Const(const_acc));
    }
    if const_acc != 0.0 {
        rest.push(arena.intern(ExprKind::Const(const_acc)));
    }
    if rest.len() == 1 {
        rest[0]
    } else {
        arena.intern(ExprKind::Sum(rest))
    }
}

fn simplify_mul(arena: &mut NodeArena, args: &[NodeId]) -> NodeId {
    let mut const_acc = 1.0;
    let mut rest = Vec::new();
    for a in args {
        let a = simplify(arena, *a);
        match arena.get(a) {
            ExprKind::Const(v) => const_acc *= v,
            _ => rest.push(a),
        }
    }
    if const_acc == 0.0 {
        return arena.intern(ExprKind::Const(0.0));
    }
    if rest.is_empty() {
        return arena.intern(ExprKind::Const(const_acc));
    }
    if const_acc != 1.0 {
        rest.push(arena.intern(ExprKind::Const(const_acc)));
    }
    if rest.len() == 1 {
        rest[0]
    } else {
        arena.intern(ExprKind::Mul(rest))
    }
}

fn simplify_list(arena: &mut NodeArena, args: &[NodeId], rebuild: fn(Vec<NodeId>) -> ExprKind) -> NodeId {
    let simplified: Vec<NodeId> = args.iter().map(|a| simplify(arena, *a)).collect();
    if simplified.len() == 1 {
        simplified[0]
    } else {
        arena.intern(rebuild(simplified))
    }
}
