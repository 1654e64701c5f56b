//! Symbolic differentiation, per `spec.md` §4.A "Differentiate(i)": returns
//! a new expression tree for `d/dx_i` of the given subtree, built from the
//! elementary per-operator rules with sums/products expanded via the chain
//! rule. Results are produced through
//! [`crate::expr::arena::NodeArena::intern`], so a derivative that
//! structurally coincides with an existing node (very common — `d/dx Sin(x)`
//! against a problem that already contains `Cos(x)` elsewhere) is folded
//! rather than duplicated.

use crate::common::VarIndex;
use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, GroupData, NodeId};

/// Returns `d(expr)/dx_wrt`, with `wrt` identified by variable index.
pub fn differentiate(arena: &mut NodeArena, expr: NodeId, wrt: VarIndex) -> NodeId {
    let expr = arena.resolve(expr);
    match arena.get(expr).clone() {
        ExprKind::Const(_) => arena.intern(ExprKind::Const(0.0)),
        ExprKind::Var(i) => {
            arena.intern(ExprKind::Const(if i == wrt { 1.0 } else { 0.0 }))
        }
        ExprKind::LowerBound(_) | ExprKind::UpperBound(_) => arena.intern(ExprKind::Const(0.0)),
        ExprKind::Opp(a) => {
            let da = differentiate(arena, a, wrt);
            arena.intern(ExprKind::Opp(da))
        }
        ExprKind::Abs(a) => {
            // d/dx |a| = sign(a) * da; represented as (a / |a|) * da to stay
            // within the closed operator set, per spec.md's operator list.
            let da = differentiate(arena, a, wrt);
            let abs_a = arena.intern(ExprKind::Abs(a));
            let sign = arena.intern(ExprKind::Div(a, abs_a));
            arena.intern(ExprKind::Mul(vec![sign, da]))
        }
        ExprKind::Exp(a) => {
            let da = differentiate(arena, a, wrt);
            let exp_a = arena.intern(ExprKind::Exp(a));
            arena.intern(ExprKind::Mul(vec![exp_a, da]))
        }
        ExprKind::Log(a) => {
            let da = differentiate(arena, a, wrt);
            arena.intern(ExprKind::Div(da, a))
        }
        ExprKind::Sin(a) => {
            let da = differentiate(arena, a, wrt);
            let cos_a = arena.intern(ExprKind::Cos(a));
            arena.intern(ExprKind::Mul(vec![cos_a, da]))
        }
        ExprKind::Cos(a) => {
            let da = differentiate(arena, a, wrt);
            let sin_a = arena.intern(ExprKind::Sin(a));
            let neg_sin = arena.intern(ExprKind::Opp(sin_a));
            arena.intern(ExprKind::Mul(vec![neg_sin, da]))
        }
        ExprKind::Sum(args) => {
            let dargs: Vec<NodeId> = args.iter().map(|a| differentiate(arena, *a, wrt)).collect();
            arena.intern(ExprKind::Sum(dargs))
        }
        ExprKind::Sub(a, b) => {
            let da = differentiate(arena, a, wrt);
            let db = differentiate(arena, b, wrt);
            arena.intern(ExprKind::Sub(da, db))
        }
        ExprKind::Mul(args) => differentiate_product(arena, &args, wrt),
        ExprKind::Div(a, b) => {
            // (a/b)' = (a'b - ab') / b^2
            let da = differentiate(arena, a, wrt);
            let db = differentiate(arena, b, wrt);
            let da_b = arena.intern(ExprKind::Mul(vec![da, b]));
            let a_db = arena.intern(ExprKind::Mul(vec![a, db]));
            let num = arena.intern(ExprKind::Sub(da_b, a_db));
            let two = arena.intern(ExprKind::Const(2.0));
            let b2 = arena.intern(ExprKind::Pow(b, two));
            arena.intern(ExprKind::Div(num, b2))
        }
        ExprKind::Pow(a, b) => differentiate_pow(arena, a, b, wrt),
        ExprKind::Min(args) | ExprKind::Max(args) => {
            // Subgradient convention: differentiate through the first
            // argument. Min/Max nodes only ever appear in *bound*
            // expressions in this crate (spec.md §4.A), which are never
            // themselves differentiated, so this branch exists only for
            // completeness against the closed operator set.
            differentiate(arena, args[0], wrt)
        }
        ExprKind::Group(g) => differentiate_group(arena, &g, wrt),
        ExprKind::Quad(g, q) => differentiate_quad(arena, &g, &q, wrt),
        ExprKind::Ref(_) => unreachable!("arena.resolve already followed Ref chains"),
    }
}

fn differentiate_product(arena: &mut NodeArena, args: &[NodeId], wrt: VarIndex) -> NodeId {
    // Generalized product rule: sum over i of (d arg_i) * prod_{j != i} arg_j.
    let mut terms = Vec::with_capacity(args.len());
    for i in 0..args.len() {
        let di = differentiate(arena, args[i], wrt);
        let mut factors = vec![di];
        for (j, aj) in args.iter().enumerate() {
            if i != j {
                factors.push(*aj);
            }
        }
        terms.push(arena.intern(ExprKind::Mul(factors)));
    }
    arena.intern(ExprKind::Sum(terms))
}

fn differentiate_pow(arena: &mut NodeArena, a: NodeId, b: NodeId, wrt: VarIndex) -> NodeId {
    // General rule for a^b: a^b * (b' * ln(a) + b * a'/a). When b is a
    // constant this degenerates algebraically to the familiar n*a^(n-1)*a',
    // but we do not special-case it here: simplification (see simplify.rs)
    // is the layer responsible for recognizing d/dx of a constant exponent
    // and cancelling the log(a) term.
    let db = differentiate(arena, b, wrt);
    let da = differentiate(arena, a, wrt);
    let ln_a = arena.intern(ExprKind::Log(a));
    let term1 = arena.intern(ExprKind::Mul(vec![db, ln_a]));
    let da_over_a = arena.intern(ExprKind::Div(da, a));
    let term2 = arena.intern(ExprKind::Mul(vec![b, da_over_a]));
    let bracket = arena.intern(ExprKind::Sum(vec![term1, term2]));
    let pow_ab = arena.intern(ExprKind::Pow(a, b));
    arena.intern(ExprKind::Mul(vec![pow_ab, bracket]))
}

fn differentiate_group(arena: &mut NodeArena, g: &GroupData, wrt: VarIndex) -> NodeId {
    let mut terms = Vec::new();
    if let Some((_, c)) = g.linear.iter().find(|(v, _)| *v == wrt) {
        terms.push(arena.intern(ExprKind::Const(*c)));
    }
    for n in &g.nonlinear {
        terms.push(differentiate(arena, *n, wrt));
    }
    if terms.is_empty() {
        return arena.intern(ExprKind::Const(0.0));
    }
    arena.intern(ExprKind::Sum(terms))
}

fn differentiate_quad(
    arena: &mut NodeArena,
    g: &GroupData,
    q: &[(VarIndex, VarIndex, f64)],
    wrt: VarIndex,
) -> NodeId {
    let group_part = differentiate_group(arena, g, wrt);
    let mut terms = vec![group_part];
    for (i, j, c) in q {
        // d/dx_wrt (c * x_i * x_j):
        if *i == wrt && *j == wrt {
            let two_c = arena.intern(ExprKind::Const(2.0 * c));
            let xi = arena.intern(ExprKind::Var(*i));
            terms.push(arena.intern(ExprKind::Mul(vec![two_c, xi])));
        } else if *i == wrt {
            let cc = arena.intern(ExprKind::Const(*c));
            let xj = arena.intern(ExprKind::Var(*j));
            terms.push(arena.intern(ExprKind::Mul(vec![cc, xj])));
        } else if *j == wrt {
            let cc = arena.intern(ExprKind::Const(*c));
            let xi = arena.intern(ExprKind::Var(*i));
            terms.push(arena.intern(ExprKind::Mul(vec![cc, xi])));
        }
    }
    arena.intern(ExprKind::Sum(terms))
}
