//! OBBT, component F of `spec.md` §4.F: optimality-based bound tightening
//! by solving a min/max LP per variable against the current relaxation.

use tracing::{debug, debug_span, trace};

use crate::bounds_engine::BoundEngine;
use crate::common::{VarIndex, DEFAULT_EPS};
use crate::error::Result;
use crate::external::lp::{LpSolver, LpStatus, ObjSense};
use crate::problem::Problem;

/// Per-variable "this bound is already provably tight" flags, `spec.md`
/// §4.F: "Maintain exact-bound flags so the algorithm can skip variables
/// whose bounds are already known tight."
#[derive(Clone, Debug, Default)]
pub struct ExactFlags {
    lower_exact: Vec<bool>,
    upper_exact: Vec<bool>,
}

impl ExactFlags {
    pub fn new(n: usize) -> Self {
        ExactFlags { lower_exact: vec![false; n], upper_exact: vec![false; n] }
    }

    pub fn mark_exact(&mut self, i: VarIndex, lower: bool, upper: bool) {
        if lower {
            self.lower_exact[i.id()] = true;
        }
        if upper {
            self.upper_exact[i.id()] = true;
        }
    }

    pub fn is_tight(&self, i: VarIndex) -> bool {
        self.lower_exact[i.id()] && self.upper_exact[i.id()]
    }
}

/// `spec.md` §4.F "Scheduling": root and shallow nodes always run OBBT;
/// deeper nodes run it with probability `2^(logObbtLev-depth-1)`. A negative
/// `log_num_obbt_per_level` disables the depth cap (always run); zero
/// disables OBBT entirely. The coin flip itself is supplied by the caller
/// as `rand01` rather than drawn internally, keeping this crate's behaviour
/// a pure function of its inputs (`spec.md` §5: "no operation suspends
/// internally", extended here to "no operation is a hidden source of
/// nondeterminism").
pub fn should_run(log_num_obbt_per_level: i32, depth: usize, rand01: f64) -> bool {
    if log_num_obbt_per_level == 0 {
        return false;
    }
    if log_num_obbt_per_level < 0 {
        return true;
    }
    let depth = depth as i32;
    if depth <= log_num_obbt_per_level {
        return true;
    }
    let exponent = log_num_obbt_per_level - depth - 1;
    rand01 < 2f64.powi(exponent)
}

fn solve_bound(lp: &mut dyn LpSolver, i: VarIndex, sense: ObjSense) -> Option<f64> {
    let n_cols = lp.col_solution().len();
    if i.id() >= n_cols {
        return None;
    }
    let mut coeffs = vec![0.0; n_cols];
    coeffs[i.id()] = 1.0;
    lp.set_objective(&coeffs);
    lp.set_obj_sense(sense);
    match lp.resolve() {
        LpStatus::Optimal if lp.is_proven_optimal() => Some(lp.col_solution()[i.id()]),
        _ => None,
    }
}

/// One OBBT pass over every non-tight variable: minimize then maximize it
/// against `lp`, tightening the domain and re-running FBBT (`engine`)
/// whenever a bound improves by more than `spec.md`'s `ε`. Returns the
/// number of bounds improved, or propagates a fatal/routine error from the
/// FBBT re-run (`spec.md` §4.F: "if it reports infeasible, return
/// infeasible").
pub fn run(problem: &mut Problem, lp: &mut dyn LpSolver, flags: &mut ExactFlags, engine: &mut BoundEngine) -> Result<usize> {
    let _span = debug_span!("obbt").entered();
    let mut n_tightened = 0;
    for idx in 0..problem.vars().len() {
        let i = VarIndex(idx);
        if flags.is_tight(i) {
            continue;
        }
        if let Some(new_l) = solve_bound(lp, i, ObjSense::Minimize) {
            if new_l > problem.domain().lower(i) + DEFAULT_EPS {
                problem.domain_mut().set_lower(i, new_l);
                trace!(var = i.id(), new_l, "obbt tightened lower bound");
                n_tightened += 1;
                engine.tighten(problem)?;
            }
            flags.mark_exact(i, true, false);
        }
        if let Some(new_u) = solve_bound(lp, i, ObjSense::Maximize) {
            if new_u < problem.domain().upper(i) - DEFAULT_EPS {
                problem.domain_mut().set_upper(i, new_u);
                trace!(var = i.id(), new_u, "obbt tightened upper bound");
                n_tightened += 1;
                engine.tighten(problem)?;
            }
            flags.mark_exact(i, false, true);
        }
    }
    debug!(n_tightened, "obbt pass complete");
    Ok(n_tightened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::convexify::cuts::RowCut;
    use crate::expr::node::ExprKind;
    use crate::problem::Sense;

    #[test]
    fn scheduling_always_runs_at_or_above_the_depth_cap() {
        assert!(should_run(2, 0, 0.99));
        assert!(should_run(2, 2, 0.99));
        assert!(!should_run(0, 0, 0.0));
        assert!(should_run(-1, 50, 0.99));
    }

    #[test]
    fn scheduling_is_probabilistic_below_the_cap() {
        // logObbtLev=2, depth=4 => exponent = 2-4-1 = -3 => prob = 1/8
        assert!(should_run(2, 4, 0.01));
        assert!(!should_run(2, 4, 0.99));
    }

    struct MockLp {
        lower: Vec<f64>,
        upper: Vec<f64>,
        solution: Vec<f64>,
    }

    impl LpSolver for MockLp {
        fn add_col(&mut self, lower: f64, upper: f64) -> usize {
            self.lower.push(lower);
            self.upper.push(upper);
            self.solution.push(lower);
            self.lower.len() - 1
        }
        fn add_row(&mut self, _lower: f64, _upper: f64, _coeffs: &[(usize, f64)]) -> usize {
            0
        }
        fn set_col_lower(&mut self, col: usize, lower: f64) {
            self.lower[col] = lower;
        }
        fn set_col_upper(&mut self, col: usize, upper: f64) {
            self.upper[col] = upper;
        }
        fn set_objective(&mut self, coeffs: &[f64]) {
            // Solve trivially: the LP optimum over a box for a single unit
            // objective coefficient is that column's bound.
            for (c, &coeff) in coeffs.iter().enumerate() {
                if coeff > 0.0 {
                    self.solution[c] = self.lower[c];
                } else if coeff < 0.0 {
                    self.solution[c] = self.upper[c];
                }
            }
        }
        fn set_obj_sense(&mut self, sense: ObjSense) {
            if sense == ObjSense::Maximize {
                for i in 0..self.solution.len() {
                    self.solution[i] = self.upper[i];
                }
            } else {
                for i in 0..self.solution.len() {
                    self.solution[i] = self.lower[i];
                }
            }
        }
        fn resolve(&mut self) -> LpStatus {
            LpStatus::Optimal
        }
        fn col_solution(&self) -> &[f64] {
            &self.solution
        }
        fn col_lower(&self) -> &[f64] {
            &self.lower
        }
        fn col_upper(&self) -> &[f64] {
            &self.upper
        }
        fn reduced_cost(&self, _col: usize) -> f64 {
            0.0
        }
        fn obj_value(&self) -> f64 {
            0.0
        }
        fn is_proven_optimal(&self) -> bool {
            true
        }
        fn is_proven_primal_infeasible(&self) -> bool {
            false
        }
        fn mark_hot_start(&mut self) {}
        fn solve_from_hot_start(&mut self) -> LpStatus {
            LpStatus::Optimal
        }
        fn unmark_hot_start(&mut self) {}
        fn apply_cuts(&mut self, _cuts: &[RowCut]) {}
        fn clone_box(&self) -> Box<dyn LpSolver> {
            Box::new(MockLp { lower: self.lower.clone(), upper: self.upper.clone(), solution: self.solution.clone() })
        }
    }

    #[test]
    fn obbt_never_widens_and_marks_tight_after_two_passes() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-5.0, 5.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        p.set_objective(xn, Sense::Minimize);
        p.standardize().unwrap();

        let mut lp = MockLp { lower: vec![-1.0], upper: vec![1.0], solution: vec![-1.0] };
        let mut flags = ExactFlags::new(p.vars().len());
        let mut engine = BoundEngine::new(p.vars().len());
        let n = obbt_run_twice(&mut p, &mut lp, &mut flags, &mut engine);
        assert!(n > 0);
        assert_eq!(-1.0, p.domain().lower(x));
        assert_eq!(1.0, p.domain().upper(x));
        assert!(flags.is_tight(x));
    }

    fn obbt_run_twice(p: &mut Problem, lp: &mut MockLp, flags: &mut ExactFlags, engine: &mut BoundEngine) -> usize {
        let a = run(p, lp, flags, engine).unwrap();
        let b = run(p, lp, flags, engine).unwrap();
        a + b
    }
}
