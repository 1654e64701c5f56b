//! Structural classification of expression subtrees: `Linearity` and `Rank`,
//! per `spec.md` §4.A.

use crate::common::{Linearity, VarIndex};
use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, NodeId};

/// Classifies `node` into one of the five linearity classes of
/// `spec.md` §4.A, looking only at operator structure (never at numeric
/// bound values). `Group`/`Quad` report their own class directly from their
/// shape: empty nonlinear list and no quadratic terms means `Linear` (or
/// `Constant`/`Zero` if the affine part is trivial too); any quadratic term
/// or nonempty nonlinear list promotes the class accordingly.
pub fn classify(arena: &NodeArena, node: NodeId) -> Linearity {
    let node = arena.resolve(node);
    match arena.get(node) {
        ExprKind::Const(v) => {
            if *v == 0.0 {
                Linearity::Zero
            } else {
                Linearity::Constant
            }
        }
        ExprKind::Var(_) => Linearity::Linear,
        ExprKind::LowerBound(_) | ExprKind::UpperBound(_) => Linearity::Constant,
        ExprKind::Opp(a) => classify(arena, *a),
        ExprKind::Abs(_) | ExprKind::Exp(_) | ExprKind::Log(_) | ExprKind::Sin(_)
        | ExprKind::Cos(_) | ExprKind::Div(_, _) | ExprKind::Pow(_, _) | ExprKind::Min(_)
        | ExprKind::Max(_) => Linearity::Nonlinear,
        ExprKind::Sum(args) => args
            .iter()
            .map(|a| classify(arena, *a))
            .fold(Linearity::Zero, Linearity::join),
        ExprKind::Sub(a, b) => classify(arena, *a).join(classify(arena, *b)),
        ExprKind::Mul(args) => classify_mul(arena, args),
        ExprKind::Group(g) => classify_group_shape(g.linear.is_empty(), g.const0, &g.nonlinear),
        ExprKind::Quad(g, q) => {
            if q.is_empty() {
                classify_group_shape(g.linear.is_empty(), g.const0, &g.nonlinear)
            } else if g.nonlinear.is_empty() {
                Linearity::Quadratic
            } else {
                Linearity::Nonlinear
            }
        }
        ExprKind::Ref(_) => unreachable!("arena.resolve already followed Ref chains"),
    }
}

fn classify_group_shape(linear_empty: bool, const0: f64, nonlinear: &[NodeId]) -> Linearity {
    if !nonlinear.is_empty() {
        Linearity::Nonlinear
    } else if !linear_empty {
        Linearity::Linear
    } else if const0 != 0.0 {
        Linearity::Constant
    } else {
        Linearity::Zero
    }
}

fn classify_mul(arena: &NodeArena, args: &[NodeId]) -> Linearity {
    // A product is linear only in the degenerate case of a single linear
    // factor times constants; two or more non-constant factors make it at
    // least quadratic, and `spec.md`'s standardize() never lets a `Mul` with
    // more than 2 non-constant factors survive past standardization anyway
    // (see standardize.rs's flattenMul).
    let mut non_const = 0;
    let mut result = Linearity::Constant;
    for a in args {
        match classify(arena, *a) {
            Linearity::Zero => return Linearity::Zero,
            Linearity::Constant => {}
            Linearity::Linear => {
                non_const += 1;
                result = result.join(Linearity::Linear);
            }
            _ => {
                non_const += 2;
                result = Linearity::Nonlinear;
            }
        }
    }
    if non_const >= 2 {
        if non_const == 2 && result != Linearity::Nonlinear {
            Linearity::Quadratic
        } else {
            Linearity::Nonlinear
        }
    } else {
        result
    }
}

/// The rank of `node`, per `spec.md` §3/§4.A: constants have rank 0,
/// originals rank 1, and every other node takes `1 + max(rank(children))`.
/// `var_rank` supplies the rank already assigned to a variable (1 for an
/// original, `1 + max(rank(deps))` for an auxiliary, per the dependency
/// graph's topological order) — this function never needs to know which
/// kind of variable it is looking at, only its previously-computed rank.
pub fn rank(arena: &NodeArena, node: NodeId, var_rank: &impl Fn(VarIndex) -> usize) -> usize {
    let node = arena.resolve(node);
    match arena.get(node) {
        ExprKind::Const(_) => 0,
        ExprKind::Var(i) => var_rank(*i),
        ExprKind::LowerBound(i) | ExprKind::UpperBound(i) => var_rank(*i),
        ExprKind::Opp(a) | ExprKind::Abs(a) | ExprKind::Exp(a) | ExprKind::Log(a)
        | ExprKind::Sin(a) | ExprKind::Cos(a) => 1 + rank(arena, *a, var_rank),
        ExprKind::Sum(args) | ExprKind::Mul(args) | ExprKind::Min(args) | ExprKind::Max(args) => {
            1 + args.iter().map(|a| rank(arena, *a, var_rank)).max().unwrap_or(0)
        }
        ExprKind::Sub(a, b) | ExprKind::Div(a, b) | ExprKind::Pow(a, b) => {
            1 + rank(arena, *a, var_rank).max(rank(arena, *b, var_rank))
        }
        ExprKind::Group(g) => 1 + group_rank(arena, g, var_rank),
        ExprKind::Quad(g, q) => {
            let mut m = group_rank(arena, g, var_rank);
            for (i, j, _) in q {
                m = m.max(var_rank(*i)).max(var_rank(*j));
            }
            1 + m
        }
        ExprKind::Ref(_) => unreachable!("arena.resolve already followed Ref chains"),
    }
}

fn group_rank(
    arena: &NodeArena,
    g: &crate::expr::node::GroupData,
    var_rank: &impl Fn(VarIndex) -> usize,
) -> usize {
    let lin = g.linear.iter().map(|(v, _)| var_rank(*v)).max().unwrap_or(0);
    let nl = g.nonlinear.iter().map(|n| rank(arena, *n, var_rank)).max().unwrap_or(0);
    lin.max(nl)
}
