//! Two-way branching execution, `spec.md` §4.H: split one variable's bounds
//! in two, optionally re-tighten and re-convexify each child, and let a
//! fatal-free [`SolverError`] stand for an immediately pruned child.

use crate::bounds_engine::BoundEngine;
use crate::common::VarIndex;
use crate::convexify::cuts::RowCut;
use crate::error::Result;
use crate::problem::Problem;

/// The two bound splits a two-way branch on `var` produces.
#[derive(Clone, Copy, Debug)]
pub struct BranchChild {
    pub var: VarIndex,
    pub new_lower: f64,
    pub new_upper: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct BranchChildren {
    pub left: BranchChild,
    pub right: BranchChild,
}

/// Splits `[l, u]` at `point` into the two children `[l, point]` and
/// `[point(+1), u]`. Integer variables split on either side of the nearest
/// integer below `point` so neither child can re-admit the cut-off value.
pub fn split(var: VarIndex, point: f64, is_integer: bool, l: f64, u: f64) -> BranchChildren {
    let p = if is_integer { point.floor() } else { point };
    let right_lower = if is_integer { p + 1.0 } else { p };
    BranchChildren {
        left: BranchChild { var, new_lower: l, new_upper: p },
        right: BranchChild { var, new_lower: right_lower, new_upper: u },
    }
}

/// Applies one child's bound change to `problem`'s domain and re-runs FBBT.
/// Returns `Ok(true)` if the child is still feasible, `Ok(false)` if FBBT
/// fathomed it (`spec.md` §4.H: "report +∞ and prune"), or `Err` only for a
/// fatal [`crate::error::SolverError`].
pub fn apply_and_tighten(problem: &mut Problem, engine: &mut BoundEngine, child: &BranchChild) -> Result<bool> {
    if child.new_lower > child.new_upper + crate::common::DEFAULT_EPS {
        return Ok(false);
    }
    problem.domain_mut().set_lower(child.var, child.new_lower);
    problem.domain_mut().set_upper(child.var, child.new_upper);
    match engine.tighten(problem) {
        Ok(()) => Ok(true),
        Err(e) if !e.is_fatal() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Outcome of materializing one branch child: either it survives FBBT with
/// a fresh set of local cuts, or it is pruned on the spot.
pub enum ChildOutcome {
    Active { cuts: Vec<RowCut> },
    Pruned,
}

/// Full per-child pipeline of `spec.md` §5's fixed node order steps 1-4,
/// restricted to the single changed variable: apply the bound, tighten, and
/// (if still feasible) regenerate cuts for every Aux depending on it.
pub fn materialize_child(problem: &mut Problem, engine: &mut BoundEngine, child: &BranchChild) -> Result<ChildOutcome> {
    if !apply_and_tighten(problem, engine, child)? {
        return Ok(ChildOutcome::Pruned);
    }
    let cuts = crate::convexify::refresh_convexify(problem, &[child.var]);
    Ok(ChildOutcome::Active { cuts })
}

/// Strong-branching hook, `spec.md` §4.H: evaluate both children of a
/// candidate split under a caller-supplied cheap objective estimate and
/// return the minimum of the two — the quantity a caller picking among
/// several candidate variables should maximize. `problem`'s domain is left
/// exactly as it was found (both children are explored under
/// [`crate::domain::Domain::push`]/`pop`).
pub fn strong_branch_score(
    problem: &mut Problem,
    engine: &mut BoundEngine,
    children: &BranchChildren,
    estimate: impl Fn(&Problem) -> f64,
) -> Result<f64> {
    problem.domain_mut().push();
    let left_ok = apply_and_tighten(problem, engine, &children.left)?;
    let left_val = if left_ok { estimate(problem) } else { f64::INFINITY };
    problem.domain_mut().pop();

    problem.domain_mut().push();
    let right_ok = apply_and_tighten(problem, engine, &children.right)?;
    let right_val = if right_ok { estimate(problem) } else { f64::INFINITY };
    problem.domain_mut().pop();

    Ok(left_val.min(right_val))
}
