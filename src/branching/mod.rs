//! Branching, component H of `spec.md` §4.H: infeasibility scoring to pick a
//! variable, a pluggable branch-point strategy to pick where to split it,
//! and the machinery to materialize the resulting two children.

pub mod object;
pub mod score;
pub mod strategy;

use crate::common::VarIndex;
use crate::config::{BranchPtSelect, SolverConfig};
use crate::depgraph::DependencyGraph;
use crate::domain::Domain;
use crate::expr::arena::NodeArena;
use crate::variable::VariableStore;

pub use object::{apply_and_tighten, split, strong_branch_score, materialize_child, BranchChild, BranchChildren, ChildOutcome};
pub use score::{score, ScoreWeights};

/// Picks the branch point for `var` per `config.branch_pt_select`.
/// `MinArea`/`Balanced` need the shape of the univariate operator the
/// variable directly feeds; `shape` supplies it (`None` when `var` is not
/// the sole argument of a single univariate Aux, in which case both fall
/// back to `LpCentral`, same as the teacher's default fallback behaviour for
/// an unrecognized branching candidate).
pub fn select_point(
    config: &SolverConfig,
    l: f64,
    u: f64,
    lp_value: f64,
    shape: Option<&dyn Fn(f64) -> f64>,
) -> f64 {
    let c = config.lp_clamp_fraction;
    match config.branch_pt_select {
        BranchPtSelect::MidPoint => strategy::mid_point(l, u, c),
        BranchPtSelect::LpClamped => strategy::lp_clamped(lp_value, l, u, c),
        BranchPtSelect::LpCentral => strategy::lp_central(lp_value, l, u, c),
        BranchPtSelect::MinArea => match shape {
            Some(f) => strategy::min_area(l, u, f, config.convexification_points.max(3)),
            None => strategy::lp_central(lp_value, l, u, c),
        },
        BranchPtSelect::Balanced => match shape {
            Some(f) => strategy::balanced(l, u, f, config.convexification_points.max(3)),
            None => strategy::lp_central(lp_value, l, u, c),
        },
    }
}

/// Picks the variable with the highest `spec.md` §4.H infeasibility score
/// among `candidates`, returning `None` if every candidate scores below
/// `feas_tolerance` ("Variables with score < feasTol report zero — no
/// branching needed here").
pub fn most_fractional(
    arena: &NodeArena,
    vars: &VariableStore,
    domain: &Domain,
    deps: &DependencyGraph,
    weights: &ScoreWeights,
    feas_tolerance: f64,
    candidates: &[VarIndex],
) -> Option<VarIndex> {
    candidates
        .iter()
        .map(|&k| (k, score(arena, vars, domain, deps, weights, k)))
        .filter(|&(_, s)| s >= feas_tolerance)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(k, _)| k)
}
