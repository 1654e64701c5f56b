//! Bound-expression construction, per `spec.md` §4.A "Bounds": for every
//! operator, a pair `(lb_expr, ub_expr)` built once from the arguments' own
//! bound expressions, then re-evaluated by the forward-propagation pass
//! (`spec.md` §4.E) every time the arguments' numeric bounds change.
//!
//! `Sin`/`Cos` are the one exception. Their envelope must be anchored at
//! the nearest period crossing (`spec.md` §9), which needs a `floor`-like
//! operation that is not in the closed primitive set of `spec.md` §3. This
//! module still returns a `(NodeId, NodeId)` pair for them so every `Aux`
//! uniformly carries bound-expression node ids, but the pair is a
//! placeholder (`Const(0.0)`, never read): the actual envelope is computed
//! procedurally by [`crate::periodic`] and invoked directly by the bound
//! engine (`spec.md` §4.E already special-cases `sin`/`cos` in its implied-
//! bound table, so this mirrors that operator-specific treatment rather
//! than inventing a symbolic formula the primitive set cannot express).

use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, GroupData, NodeId};

/// `true` for the operators whose bound expression is a placeholder,
/// because their real envelope is computed procedurally — see the module
/// doc comment. The bound engine (`spec.md` §4.E) checks this before
/// trusting `Aux::lb_expr`/`ub_expr`.
pub fn is_periodic_placeholder(kind: &ExprKind) -> bool {
    matches!(kind, ExprKind::Sin(_) | ExprKind::Cos(_))
}

/// Builds `(lb_expr, ub_expr)` for a node of shape `kind`, given the
/// already-built bound-expression pairs of its direct children (parallel to
/// `kind.children()`).
pub fn bounds(arena: &mut NodeArena, kind: &ExprKind, child_bounds: &[(NodeId, NodeId)]) -> (NodeId, NodeId) {
    match kind {
        ExprKind::Const(v) => {
            let c = arena.intern(ExprKind::Const(*v));
            (c, c)
        }
        ExprKind::Var(i) => (
            arena.intern(ExprKind::LowerBound(*i)),
            arena.intern(ExprKind::UpperBound(*i)),
        ),
        ExprKind::LowerBound(_) | ExprKind::UpperBound(_) => {
            // Bound expressions do not themselves need bounds in this crate.
            let zero = arena.intern(ExprKind::Const(0.0));
            (zero, zero)
        }
        ExprKind::Opp(_) => {
            let (lb_a, ub_a) = child_bounds[0];
            (arena.intern(ExprKind::Opp(ub_a)), arena.intern(ExprKind::Opp(lb_a)))
        }
        ExprKind::Abs(_) => {
            let (lb_a, ub_a) = child_bounds[0];
            // [L,U] ⊆ [-max(|L|,|U|), max(|L|,|U|)] always holds; tightened
            // to [0, max] when the interval cannot straddle zero favorably.
            let abs_lb = arena.intern(ExprKind::Abs(lb_a));
            let abs_ub = arena.intern(ExprKind::Abs(ub_a));
            let upper = arena.intern(ExprKind::Max(vec![abs_lb, abs_ub]));
            let zero = arena.intern(ExprKind::Const(0.0));
            // lower bound: 0 if the interval can straddle zero, else the
            // smaller absolute endpoint. Expressed generically as
            // max(0, min(L, -U)) is not quite right for all cases, so this
            // crate defers the precise case split to the implied-bound
            // routine (spec.md §4.E) and seeds the symbolic lower bound
            // conservatively at 0, which is always valid for |x|.
            (zero, upper)
        }
        ExprKind::Exp(_) => {
            let (lb_a, ub_a) = child_bounds[0];
            (arena.intern(ExprKind::Exp(lb_a)), arena.intern(ExprKind::Exp(ub_a)))
        }
        ExprKind::Log(_) => {
            let (lb_a, ub_a) = child_bounds[0];
            (arena.intern(ExprKind::Log(lb_a)), arena.intern(ExprKind::Log(ub_a)))
        }
        ExprKind::Sin(_) | ExprKind::Cos(_) => {
            let zero = arena.intern(ExprKind::Const(0.0));
            (zero, zero)
        }
        ExprKind::Sum(_) => {
            let lbs: Vec<NodeId> = child_bounds.iter().map(|(l, _)| *l).collect();
            let ubs: Vec<NodeId> = child_bounds.iter().map(|(_, u)| *u).collect();
            (arena.intern(ExprKind::Sum(lbs)), arena.intern(ExprKind::Sum(ubs)))
        }
        ExprKind::Sub(_, _) => {
            let (lb_a, ub_a) = child_bounds[0];
            let (lb_b, ub_b) = child_bounds[1];
            (arena.intern(ExprKind::Sub(lb_a, ub_b)), arena.intern(ExprKind::Sub(ub_a, lb_b)))
        }
        ExprKind::Mul(_) => mul_bounds(arena, child_bounds),
        ExprKind::Div(_, _) => {
            // x / y via McCormick on (w, y): bounds seeded as the interval
            // product x * (1/y) would require y bounded away from 0; the
            // convexifier (spec.md §4.G) is responsible for requesting a
            // branch when y straddles zero. Here we seed conservatively.
            let (lb_a, ub_a) = child_bounds[0];
            let (lb_b, ub_b) = child_bounds[1];
            let cands = [
                arena.intern(ExprKind::Div(lb_a, lb_b)),
                arena.intern(ExprKind::Div(lb_a, ub_b)),
                arena.intern(ExprKind::Div(ub_a, lb_b)),
                arena.intern(ExprKind::Div(ub_a, ub_b)),
            ];
            (
                arena.intern(ExprKind::Min(cands.to_vec())),
                arena.intern(ExprKind::Max(cands.to_vec())),
            )
        }
        ExprKind::Pow(_, b) => {
            let (lb_a, ub_a) = child_bounds[0];
            let (lb_b, ub_b) = child_bounds[1];
            let cands = [
                arena.intern(ExprKind::Pow(lb_a, lb_b)),
                arena.intern(ExprKind::Pow(lb_a, ub_b)),
                arena.intern(ExprKind::Pow(ub_a, lb_b)),
                arena.intern(ExprKind::Pow(ub_a, ub_b)),
            ];
            let mut lower_cands = cands.to_vec();
            // The four corners are only sound lower-bound candidates when
            // x -> x^n is monotone over [lb_a, ub_a]. For a constant even n
            // that fails whenever the interval straddles 0 (e.g. x^4 on
            // [-1,1] has corner value 1 at both ends, but the true minimum
            // is 0 at x=0). x^n >= 0 always holds for even n, so 0 is a
            // sound (if not always tight) extra lower-bound candidate.
            if let ExprKind::Const(n) = arena.get(*b) {
                if n.fract() == 0.0 && (*n as i64).rem_euclid(2) == 0 {
                    lower_cands.push(arena.intern(ExprKind::Const(0.0)));
                }
            }
            (
                arena.intern(ExprKind::Min(lower_cands)),
                arena.intern(ExprKind::Max(cands.to_vec())),
            )
        }
        ExprKind::Min(_) => {
            let lbs: Vec<NodeId> = child_bounds.iter().map(|(l, _)| *l).collect();
            let ubs: Vec<NodeId> = child_bounds.iter().map(|(_, u)| *u).collect();
            (arena.intern(ExprKind::Min(lbs)), arena.intern(ExprKind::Min(ubs)))
        }
        ExprKind::Max(_) => {
            let lbs: Vec<NodeId> = child_bounds.iter().map(|(l, _)| *l).collect();
            let ubs: Vec<NodeId> = child_bounds.iter().map(|(_, u)| *u).collect();
            (arena.intern(ExprKind::Max(lbs)), arena.intern(ExprKind::Max(ubs)))
        }
        ExprKind::Group(g) => group_bounds(arena, g, child_bounds),
        ExprKind::Quad(g, q) => {
            let (glb, gub) = group_bounds(arena, g, &child_bounds[..g.nonlinear.len()]);
            let mut lbs = vec![glb];
            let mut ubs = vec![gub];
            for (i, j, c) in q {
                let li = arena.intern(ExprKind::LowerBound(*i));
                let ui = arena.intern(ExprKind::UpperBound(*i));
                let lj = arena.intern(ExprKind::LowerBound(*j));
                let uj = arena.intern(ExprKind::UpperBound(*j));
                let cc = arena.intern(ExprKind::Const(*c));
                let products = [(li, lj), (li, uj), (ui, lj), (ui, uj)]
                    .map(|(a, b)| arena.intern(ExprKind::Mul(vec![cc, a, b])));
                lbs.push(arena.intern(ExprKind::Min(products.to_vec())));
                ubs.push(arena.intern(ExprKind::Max(products.to_vec())));
            }
            (arena.intern(ExprKind::Sum(lbs)), arena.intern(ExprKind::Sum(ubs)))
        }
        ExprKind::Ref(_) => unreachable!("bounds() is called on resolved nodes only"),
    }
}

fn mul_bounds(arena: &mut NodeArena, child_bounds: &[(NodeId, NodeId)]) -> (NodeId, NodeId) {
    // Fold pairwise: bounds of a product of intervals is the min/max of the
    // four corner products, generalized left-to-right. This is exact
    // interval arithmetic for a chain of independent factors (the McCormick
    // envelope in convexify/mccormick.rs handles the *linear* relaxation;
    // this is only the numeric interval used to seed/propagate bounds).
    let mut acc = child_bounds[0];
    for &(lb, ub) in &child_bounds[1..] {
        let (alb, aub) = acc;
        let cands = [
            arena.intern(ExprKind::Mul(vec![alb, lb])),
            arena.intern(ExprKind::Mul(vec![alb, ub])),
            arena.intern(ExprKind::Mul(vec![aub, lb])),
            arena.intern(ExprKind::Mul(vec![aub, ub])),
        ];
        acc = (
            arena.intern(ExprKind::Min(cands.to_vec())),
            arena.intern(ExprKind::Max(cands.to_vec())),
        );
    }
    acc
}

fn group_bounds(
    arena: &mut NodeArena,
    g: &GroupData,
    nonlinear_bounds: &[(NodeId, NodeId)],
) -> (NodeId, NodeId) {
    let mut lbs = vec![arena.intern(ExprKind::Const(g.const0))];
    let mut ubs = vec![arena.intern(ExprKind::Const(g.const0))];
    for (v, c) in &g.linear {
        let lo = arena.intern(ExprKind::LowerBound(*v));
        let hi = arena.intern(ExprKind::UpperBound(*v));
        let cc = arena.intern(ExprKind::Const(*c));
        if *c >= 0.0 {
            lbs.push(arena.intern(ExprKind::Mul(vec![cc, lo])));
            ubs.push(arena.intern(ExprKind::Mul(vec![cc, hi])));
        } else {
            lbs.push(arena.intern(ExprKind::Mul(vec![cc, hi])));
            ubs.push(arena.intern(ExprKind::Mul(vec![cc, lo])));
        }
    }
    for (lb, ub) in nonlinear_bounds {
        lbs.push(*lb);
        ubs.push(*ub);
    }
    (arena.intern(ExprKind::Sum(lbs)), arena.intern(ExprKind::Sum(ubs)))
}
