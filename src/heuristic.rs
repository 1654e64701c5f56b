//! The rounding heuristic, component I of `spec.md` §4.I: "Given an
//! LP-feasible point `y`, round each integer original to the nearest
//! integer, fix those, and call the external NLP solver on the continuous
//! restriction. If NLP returns `optimal` and its objective beats the
//! incumbent, and the point is feasible to within `εfeas`, update the
//! incumbent."

use tracing::{debug, debug_span, trace};

use crate::common::VarIndex;
use crate::external::nlp::{NlpSolver, NlpStatus};
use crate::problem::{Problem, Sense};

/// A heuristic candidate that passed both the NLP-optimality check and the
/// feasibility check.
#[derive(Clone, Debug)]
pub struct HeuristicResult {
    pub objective: f64,
    pub point: Vec<f64>,
}

/// One heuristic attempt at the problem's current LP point (read off
/// `problem.domain()`). `nlp`'s columns are assumed to already be the
/// problem's original variables in `Problem::add_original` creation order —
/// this crate never constructs an `NlpSolver` itself, so that mapping is the
/// caller's responsibility.
///
/// Returns `None` whenever the candidate should be discarded: NLP failure is
/// swallowed here exactly as `spec.md` §7 prescribes for `NLPSolverError`
/// ("the heuristic discards its candidate and continues").
pub fn try_round(problem: &Problem, nlp: &mut dyn NlpSolver, incumbent: Option<f64>) -> Option<HeuristicResult> {
    let _span = debug_span!("heuristic_round").entered();
    let n_originals = problem.vars().iter().take_while(|v| !v.is_aux()).count();

    for idx in 0..n_originals {
        let k = VarIndex(idx);
        let var = problem.vars().get(k);
        if var.is_integer {
            let v = problem.domain().value(k).round().clamp(problem.domain().lower(k), problem.domain().upper(k));
            nlp.set_col_lower(idx, v);
            nlp.set_col_upper(idx, v);
        } else {
            nlp.set_col_lower(idx, problem.domain().lower(k));
            nlp.set_col_upper(idx, problem.domain().upper(k));
        }
    }

    let status = if incumbent.is_some() { nlp.resolve() } else { nlp.initial_solve() };
    if status != NlpStatus::Optimal {
        trace!(?status, "heuristic nlp call did not return optimal");
        return None;
    }

    let objective = nlp.obj_value();
    if let Some(inc) = incumbent {
        let improves = match problem.sense() {
            Sense::Minimize => objective < inc - problem.config().cutoff_decr,
            Sense::Maximize => objective > inc + problem.config().cutoff_decr,
        };
        if !improves {
            trace!(objective, incumbent = inc, "heuristic candidate does not improve the incumbent");
            return None;
        }
    }

    let point = nlp.col_solution().to_vec();
    if !is_feasible(problem, &point, problem.config().feas_tolerance) {
        trace!("heuristic candidate violates a constraint beyond feas_tolerance");
        return None;
    }

    debug!(objective, "heuristic produced a new incumbent candidate");
    Some(HeuristicResult { objective, point })
}

/// Recomputes every Aux bottom-up from `point`'s original values, then
/// checks every constraint body against its `[lower, upper]` range.
fn is_feasible(problem: &Problem, point: &[f64], eps: f64) -> bool {
    let mut domain = problem.domain().clone();
    for (idx, &v) in point.iter().enumerate() {
        domain.set_value(VarIndex(idx), v);
    }
    for &k in problem.deps().order() {
        if let Some(image) = problem.vars().get(k).image() {
            let val = crate::expr::eval::evaluate(problem.arena(), image, &domain);
            domain.set_value(k, val);
        }
    }
    for c in problem.constraints() {
        let val = domain.value(c.body);
        if val < c.lower - eps || val > c.upper + eps {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::expr::node::ExprKind;
    use crate::problem::Problem;

    struct MockNlp {
        lower: Vec<f64>,
        upper: Vec<f64>,
        solution: Vec<f64>,
        status: NlpStatus,
        objective: f64,
    }

    impl NlpSolver for MockNlp {
        fn initial_solve(&mut self) -> NlpStatus {
            self.status
        }
        fn resolve(&mut self) -> NlpStatus {
            self.status
        }
        fn set_col_solution(&mut self, values: &[f64]) {
            self.solution = values.to_vec();
        }
        fn set_col_lower(&mut self, col: usize, lower: f64) {
            self.lower[col] = lower;
        }
        fn set_col_upper(&mut self, col: usize, upper: f64) {
            self.upper[col] = upper;
        }
        fn col_solution(&self) -> &[f64] {
            &self.solution
        }
        fn obj_value(&self) -> f64 {
            self.objective
        }
    }

    fn sum_problem() -> Problem {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(0.0, 2.0, true, None);
        let y = p.add_original(-1.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let sum = p.arena_mut().intern(ExprKind::Sum(vec![xn, yn]));
        p.set_objective(sum, crate::problem::Sense::Minimize);
        p.add_constraint(xn, 0.0, 2.0);
        p.standardize().unwrap();
        p
    }

    #[test]
    fn rejects_a_non_optimal_nlp_status() {
        let p = sum_problem();
        let mut nlp = MockNlp {
            lower: vec![0.0, 0.0],
            upper: vec![2.0, 1.0],
            solution: vec![0.0, 0.0],
            status: NlpStatus::Infeasible,
            objective: 0.0,
        };
        assert!(try_round(&p, &mut nlp, None).is_none());
    }

    #[test]
    fn accepts_a_feasible_improving_candidate() {
        let mut p = sum_problem();
        p.domain_mut().set_value(VarIndex(0), 1.6);
        let mut nlp = MockNlp {
            lower: vec![0.0, 0.0],
            upper: vec![2.0, 1.0],
            solution: vec![2.0, -1.0],
            status: NlpStatus::Optimal,
            objective: 1.0,
        };
        let result = try_round(&p, &mut nlp, Some(10.0)).expect("should accept a better feasible point");
        assert_eq!(1.0, result.objective);
        assert_eq!(vec![2.0, -1.0], result.point);
    }

    #[test]
    fn rejects_a_candidate_that_does_not_improve_the_incumbent() {
        let p = sum_problem();
        let mut nlp = MockNlp {
            lower: vec![0.0, 0.0],
            upper: vec![2.0, 1.0],
            solution: vec![2.0, -1.0],
            status: NlpStatus::Optimal,
            objective: 1.0,
        };
        assert!(try_round(&p, &mut nlp, Some(-5.0)).is_none());
    }

    #[test]
    fn rejects_a_candidate_that_violates_a_constraint() {
        let p = sum_problem();
        let mut nlp = MockNlp {
            lower: vec![0.0, 0.0],
            upper: vec![2.0, 1.0],
            solution: vec![5.0, -1.0],
            status: NlpStatus::Optimal,
            objective: 4.0,
        };
        assert!(try_round(&p, &mut nlp, None).is_none());
    }
}
