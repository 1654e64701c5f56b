//! The bound engine, component E of `spec.md` §4.E: forward propagation of
//! numeric bounds over the dependency DAG, backward/implied tightening of
//! argument bounds from a tightened Aux, and the bound-tightening loop.

use tracing::{debug_span, trace};

use crate::common::{VarIndex, DEFAULT_EPS, MAX_BT_ITER};
use crate::error::{Result, SolverError};
use crate::expr::bounds::{self, is_periodic_placeholder};
use crate::expr::eval::evaluate;
use crate::expr::node::{ExprKind, NodeId};
use crate::periodic;
use crate::problem::Problem;

/// `spec.md` §4.E: "a pair `(lower_status, upper_status)` with values
/// `Unchanged | Changed | Exact`".
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChangeStatus {
    Unchanged,
    Changed,
    Exact,
}

/// Owns the dense `chg[n]` array of `spec.md` §4.E.
pub struct BoundEngine {
    chg: Vec<(ChangeStatus, ChangeStatus)>,
}

impl BoundEngine {
    pub fn new(n: usize) -> Self {
        BoundEngine { chg: vec![(ChangeStatus::Unchanged, ChangeStatus::Unchanged); n] }
    }

    pub fn status(&self, i: VarIndex) -> (ChangeStatus, ChangeStatus) {
        self.chg[i.id()]
    }

    fn reset(&mut self) {
        for c in &mut self.chg {
            *c = (ChangeStatus::Unchanged, ChangeStatus::Unchanged);
        }
    }

    fn mark_lower(&mut self, i: VarIndex) {
        self.chg[i.id()].0 = ChangeStatus::Changed;
    }

    fn mark_upper(&mut self, i: VarIndex) {
        self.chg[i.id()].1 = ChangeStatus::Changed;
    }

    /// `spec.md` §4.E "Forward propagation": recomputes every Aux's bound
    /// expressions in topological order. Returns the number of tightenings
    /// applied, or a fatal/routine error on infeasibility.
    pub fn propagate(&mut self, problem: &mut Problem) -> Result<usize> {
        let _span = debug_span!("fbbt_forward").entered();
        let order = problem.deps().order().to_vec();
        let mut n_changed = 0;
        for k in order {
            let image = match problem.vars().get(k).image() {
                Some(i) => i,
                None => continue,
            };
            let kind = problem.arena().get(image).clone();
            let (new_l, new_u) = if is_periodic_placeholder(&kind) {
                let arg = kind.children()[0];
                let (lb_e, ub_e) = node_bounds(problem.arena_mut(), arg);
                let al = evaluate(problem.arena(), lb_e, problem.domain());
                let au = evaluate(problem.arena(), ub_e, problem.domain());
                match kind {
                    ExprKind::Sin(_) => periodic::sin_envelope(al, au),
                    ExprKind::Cos(_) => periodic::cos_envelope(al, au),
                    _ => unreachable!(),
                }
            } else {
                let var = problem.vars().get(k);
                let l = evaluate(problem.arena(), var.lb_expr, problem.domain());
                let u = evaluate(problem.arena(), var.ub_expr, problem.domain());
                (l, u)
            };

            let cur_l = problem.domain().lower(k);
            let cur_u = problem.domain().upper(k);
            if new_l > cur_l + DEFAULT_EPS {
                problem.domain_mut().set_lower(k, new_l);
                self.mark_lower(k);
                n_changed += 1;
                trace!(var = k.id(), old = cur_l, new = new_l, side = "lower", "fbbt forward tightening");
            }
            if new_u < cur_u - DEFAULT_EPS {
                problem.domain_mut().set_upper(k, new_u);
                self.mark_upper(k);
                n_changed += 1;
                trace!(var = k.id(), old = cur_u, new = new_u, side = "upper", "fbbt forward tightening");
            }
            if problem.domain().lower(k) > problem.domain().upper(k) + DEFAULT_EPS {
                return Err(SolverError::BoundViolation {
                    var: k,
                    lower: problem.domain().lower(k),
                    upper: problem.domain().upper(k),
                });
            }
        }
        Ok(n_changed)
    }

    /// `spec.md` §4.E "Backward / implied bounds": walks Auxs in reverse
    /// topological order, tightening each single-variable argument from the
    /// Aux's own (already-tightened) numeric bounds. Per the rule table,
    /// `Opp`/`Exp`/`Log`/`Abs` invert directly; `Sin`/`Cos` invert through
    /// [`periodic::sin_implied`]/[`periodic::cos_implied`], which fall back to
    /// no tightening whenever the argument interval isn't confirmed to lie on
    /// a single monotonic branch (see that module for why). Compound
    /// (non-`Var`) arguments are skipped since there is no single variable to
    /// assign a tightened bound to without a further linear-decomposition
    /// step `spec.md` does not specify.
    pub fn implied(&mut self, problem: &mut Problem) -> Result<usize> {
        let _span = debug_span!("fbbt_backward").entered();
        let mut order = problem.deps().order().to_vec();
        order.reverse();
        let mut n_changed = 0;
        for k in order {
            let image = match problem.vars().get(k).image() {
                Some(i) => i,
                None => continue,
            };
            let kind = problem.arena().get(image).clone();
            let arg = match &kind {
                ExprKind::Opp(a) | ExprKind::Exp(a) | ExprKind::Log(a) | ExprKind::Abs(a) | ExprKind::Sin(a) | ExprKind::Cos(a) => {
                    Some(*a)
                }
                _ => None,
            };
            let arg_var = match arg.map(|a| problem.arena().get(a).clone()) {
                Some(ExprKind::Var(i)) => Some(i),
                _ => None,
            };
            let Some(x) = arg_var else { continue };

            let lw = problem.domain().lower(k);
            let uw = problem.domain().upper(k);
            let lx = problem.domain().lower(x);
            let ux = problem.domain().upper(x);

            let (new_lx, new_ux) = match kind {
                ExprKind::Opp(_) => (lx.max(-uw), ux.min(-lw)),
                ExprKind::Exp(_) => {
                    if uw < -DEFAULT_EPS {
                        return Err(SolverError::NodeInfeasible {
                            reason: format!("exp({x:?}) upper bound {uw} is negative"),
                        });
                    }
                    let new_lx = if lw >= DEFAULT_EPS { lx.max(lw.ln()) } else { lx };
                    let new_ux = if uw >= DEFAULT_EPS { ux.min(uw.ln()) } else { ux };
                    (new_lx, new_ux)
                }
                ExprKind::Log(_) => (lx.max(lw.exp()), ux.min(uw.exp())),
                ExprKind::Abs(_) => {
                    // x ⊆ [-U[w], U[w]] always holds; spec.md's extra
                    // narrowing when L[w] >= 0 is not sound for a box
                    // constraint (see DESIGN.md), so it is intentionally not
                    // applied here.
                    (lx.max(-uw), ux.min(uw))
                }
                ExprKind::Sin(_) => periodic::sin_implied(lx, ux, lw, uw).unwrap_or((lx, ux)),
                ExprKind::Cos(_) => periodic::cos_implied(lx, ux, lw, uw).unwrap_or((lx, ux)),
                _ => (lx, ux),
            };

            if new_lx > lx + DEFAULT_EPS {
                problem.domain_mut().set_lower(x, new_lx);
                self.mark_lower(x);
                n_changed += 1;
                trace!(var = x.id(), old = lx, new = new_lx, side = "lower", "fbbt implied tightening");
            }
            if new_ux < ux - DEFAULT_EPS {
                problem.domain_mut().set_upper(x, new_ux);
                self.mark_upper(x);
                n_changed += 1;
                trace!(var = x.id(), old = ux, new = new_ux, side = "upper", "fbbt implied tightening");
            }
            if problem.domain().lower(x) > problem.domain().upper(x) + DEFAULT_EPS {
                return Err(SolverError::BoundViolation {
                    var: x,
                    lower: problem.domain().lower(x),
                    upper: problem.domain().upper(x),
                });
            }
        }
        Ok(n_changed)
    }

    /// `spec.md` §4.E bound-tightening loop, with the `(a||b)&&c` ambiguity
    /// resolved per `SPEC_FULL.md` §4.E: run both passes every iteration,
    /// break only once a round changes nothing on either side.
    pub fn tighten(&mut self, problem: &mut Problem) -> Result<()> {
        self.reset();
        for _ in 0..MAX_BT_ITER {
            let n_fwd = self.propagate(problem)?;
            let n_bwd = self.implied(problem)?;
            if n_fwd == 0 && n_bwd == 0 {
                break;
            }
        }
        Ok(())
    }

    /// `spec.md` §4.E "Reduced-cost tightening": an optional pre-pass once
    /// the LP relaxation has been solved.
    pub fn reduced_cost_tighten(
        &mut self,
        problem: &mut Problem,
        reduced_costs: &[(VarIndex, f64)],
        incumbent_gap: f64,
    ) {
        for &(i, r) in reduced_costs {
            if r <= DEFAULT_EPS {
                continue;
            }
            let x = problem.domain().value(i);
            let u = problem.domain().upper(i);
            if (u - x) * r > incumbent_gap {
                let new_u = x + incumbent_gap / r;
                if new_u < u - DEFAULT_EPS {
                    problem.domain_mut().set_upper(i, new_u);
                    self.mark_upper(i);
                }
            }
        }
    }
}

fn node_bounds(arena: &mut crate::expr::arena::NodeArena, node: NodeId) -> (NodeId, NodeId) {
    let kind = arena.get(node).clone();
    bounds::bounds(arena, &kind, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::expr::node::ExprKind;
    use crate::problem::{Problem, Sense};

    #[test]
    fn forward_pass_tightens_exp_aux_from_its_argument() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-1.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let e = p.arena_mut().intern(ExprKind::Exp(xn));
        p.set_objective(e, Sense::Minimize);
        p.standardize().unwrap();

        let mut engine = BoundEngine::new(p.vars().len());
        let n = engine.propagate(&mut p).unwrap();
        assert_eq!(0, n, "bounds were already seeded exactly during standardization");
    }

    #[test]
    fn backward_pass_tightens_exp_argument() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-10.0, 10.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let e = p.arena_mut().intern(ExprKind::Exp(xn));
        p.set_objective(e, Sense::Minimize);
        p.standardize().unwrap();

        let w = p.objective().unwrap();
        p.install_bounds(w, 1.0, 2.0);
        let mut engine = BoundEngine::new(p.vars().len());
        engine.implied(&mut p).unwrap();
        assert!(p.domain().lower(x) >= 0.0 - 1e-9);
        assert!(p.domain().upper(x) <= 2.0_f64.ln() + 1e-9);
    }

    #[test]
    fn backward_pass_tightens_sin_argument_on_a_monotonic_branch() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(0.0, std::f64::consts::FRAC_PI_2, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let s = p.arena_mut().intern(ExprKind::Sin(xn));
        p.set_objective(s, Sense::Minimize);
        p.standardize().unwrap();

        let w = p.objective().unwrap();
        p.install_bounds(w, 0.0, 0.5);
        let mut engine = BoundEngine::new(p.vars().len());
        engine.implied(&mut p).unwrap();
        assert!(p.domain().upper(x) <= 0.5_f64.asin() + 1e-9);
    }

    #[test]
    fn exp_upper_bound_strictly_negative_is_infeasible() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-10.0, 10.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let e = p.arena_mut().intern(ExprKind::Exp(xn));
        p.set_objective(e, Sense::Minimize);
        p.standardize().unwrap();
        let w = p.objective().unwrap();
        p.install_bounds(w, -2.0, -1.0);
        let mut engine = BoundEngine::new(p.vars().len());
        let err = engine.implied(&mut p).unwrap_err();
        assert!(matches!(err, SolverError::NodeInfeasible { .. }));
    }

    #[test]
    fn tighten_loop_terminates_and_never_widens() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-3.0, 3.0, false, None);
        let y = p.add_original(-3.0, 3.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let sum = p.arena_mut().intern(ExprKind::Sum(vec![xn, yn]));
        p.set_objective(sum, Sense::Minimize);
        p.standardize().unwrap();

        let before_l = p.domain().lower(x);
        let before_u = p.domain().upper(x);
        let mut engine = BoundEngine::new(p.vars().len());
        engine.tighten(&mut p).unwrap();
        assert!(p.domain().lower(x) >= before_l - 1e-9);
        assert!(p.domain().upper(x) <= before_u + 1e-9);
    }
}
