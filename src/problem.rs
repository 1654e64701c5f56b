//! The problem container, component D of `spec.md` §4.D: owns every
//! expression, variable, the dependency graph, the numeric `Domain`, and the
//! `SolverConfig`; drives standardization per the pseudocode of `spec.md`
//! §4.D.

use tracing::{debug, debug_span};

use crate::common::VarIndex;
use crate::config::SolverConfig;
use crate::depgraph::DependencyGraph;
use crate::domain::Domain;
use crate::error::{Result, SolverError};
use crate::expr::arena::NodeArena;
use crate::expr::eval::evaluate;
use crate::expr::node::{ExprKind, NodeId};
use crate::standardize::standardize_body;
use crate::variable::VariableStore;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A standardized constraint: its body is always a single `VarIndex` after
/// [`Problem::standardize`] (`spec.md` §3 invariant 3), with `[lower, upper]`
/// the range the body's value must stay within.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub body: VarIndex,
    pub lower: f64,
    pub upper: f64,
}

/// Owns objectives, constraints and variables, per `spec.md` §4.D.
pub struct Problem {
    arena: NodeArena,
    vars: VariableStore,
    deps: DependencyGraph,
    domain: Domain,
    config: SolverConfig,
    objective_body: Option<NodeId>,
    objective: Option<VarIndex>,
    sense: Sense,
    constraint_bodies: Vec<(NodeId, f64, f64)>,
    constraints: Vec<Constraint>,
    cutoff: Option<f64>,
    standardized: bool,
}

impl Problem {
    pub fn new(config: SolverConfig) -> Self {
        Problem {
            arena: NodeArena::new(),
            vars: VariableStore::new(),
            deps: DependencyGraph::new(),
            domain: Domain::new(0),
            config,
            objective_body: None,
            objective: None,
            sense: Sense::Minimize,
            constraint_bodies: Vec::new(),
            constraints: Vec::new(),
            cutoff: None,
            standardized: false,
        }
    }

    /// Registers an original variable at read time (`spec.md` §3
    /// "Lifecycle"). `lower`/`upper` become the original's symbolic (and, for
    /// now, numeric) bound expressions.
    pub fn add_original(&mut self, lower: f64, upper: f64, is_integer: bool, name: Option<String>) -> VarIndex {
        let lb = self.arena.intern(ExprKind::Const(lower));
        let ub = self.arena.intern(ExprKind::Const(upper));
        let idx = self.vars.insert_original(lb, ub, is_integer, name);
        self.deps.insert_var();
        self.domain.resize(self.vars.len());
        self.domain.set_lower(idx, lower);
        self.domain.set_upper(idx, upper);
        idx
    }

    pub fn set_objective(&mut self, expr: NodeId, sense: Sense) {
        self.objective_body = Some(expr);
        self.sense = sense;
    }

    pub fn add_constraint(&mut self, expr: NodeId, lower: f64, upper: f64) {
        self.constraint_bodies.push((expr, lower, upper));
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn deps(&self) -> &DependencyGraph {
        &self.deps
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut Domain {
        &mut self.domain
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn objective(&self) -> Option<VarIndex> {
        self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    /// `spec.md` §4.D item 4: "Install bounds / install cutoff on the
    /// current best objective, used by E and F."
    pub fn install_bounds(&mut self, var: VarIndex, lower: f64, upper: f64) {
        self.domain.set_lower(var, lower);
        self.domain.set_upper(var, upper);
    }

    pub fn install_cutoff(&mut self, cutoff: f64) {
        self.cutoff = Some(cutoff);
    }

    /// The standardization driver of `spec.md` §4.D: turns every
    /// objective/constraint body into an Aux reference, builds the
    /// topological order, resizes the domain, and seeds every variable's
    /// numeric `L`/`U`/`x` in topological order.
    pub fn standardize(&mut self) -> Result<()> {
        let _span = debug_span!("standardize").entered();
        assert!(!self.standardized, "Problem::standardize must run exactly once");

        if let Some(body) = self.objective_body {
            let idx = standardize_body(&mut self.arena, &mut self.vars, &mut self.deps, body);
            self.objective = Some(idx);
        }
        let bodies = std::mem::take(&mut self.constraint_bodies);
        for (body, lower, upper) in bodies {
            let idx = standardize_body(&mut self.arena, &mut self.vars, &mut self.deps, body);
            self.constraints.push(Constraint { body: idx, lower, upper });
        }

        self.deps.create_order()?;
        let order = self.deps.order().to_vec();
        self.domain.resize(self.vars.len());

        for k in &order {
            let rank = if self.vars.get(*k).is_aux() {
                1 + self
                    .deps
                    .lookup(*k)
                    .iter()
                    .map(|d| self.vars.rank(*d))
                    .max()
                    .unwrap_or(0)
            } else {
                1
            };
            self.vars.set_rank(*k, rank);

            let var = self.vars.get(*k).clone();
            let mut lower = evaluate(&self.arena, var.lb_expr, &self.domain);
            let mut upper = evaluate(&self.arena, var.ub_expr, &self.domain);
            if var.is_integer {
                lower = lower.ceil();
                upper = upper.floor();
            }
            if lower > upper + crate::common::DEFAULT_EPS {
                return Err(SolverError::BoundViolation { var: *k, lower, upper });
            }
            self.domain.set_lower(*k, lower);
            self.domain.set_upper(*k, upper);
            if let Some(image) = var.image() {
                self.domain.set_value(*k, evaluate(&self.arena, image, &self.domain));
            }
        }

        debug!(n_vars = self.vars.len(), n_constraints = self.constraints.len(), "standardized");
        self.standardized = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::node::ExprKind;

    #[test]
    fn single_variable_convex_scenario_creates_exactly_two_auxs() {
        // min exp(x) s.t. x in [-1, 1] -- spec.md §8 scenario 1.
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(-1.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let e = p.arena_mut().intern(ExprKind::Exp(xn));
        p.set_objective(e, Sense::Minimize);
        p.standardize().unwrap();

        // one original + one aux (the objective itself, w = exp(x))
        assert_eq!(2, p.vars().len());
        let obj = p.objective().unwrap();
        assert!(p.vars().get(obj).is_aux());
        let l = p.domain().lower(obj);
        let u = p.domain().upper(obj);
        assert!((l - (-1.0_f64).exp()).abs() < 1e-9);
        assert!((u - (1.0_f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn bilinear_scenario_creates_one_quad_aux() {
        // min xy s.t. x,y in [0,1] -- spec.md §8 scenario 3.
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(0.0, 1.0, false, None);
        let y = p.add_original(0.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let prod = p.arena_mut().intern(ExprKind::Mul(vec![xn, yn]));
        p.set_objective(prod, Sense::Minimize);
        p.standardize().unwrap();

        assert_eq!(3, p.vars().len());
        let obj = p.objective().unwrap();
        assert_eq!(0.0, p.domain().lower(obj));
        assert_eq!(1.0, p.domain().upper(obj));
    }

    #[test]
    fn infeasible_integer_bounds_are_reported() {
        let mut p = Problem::new(SolverConfig::default());
        // an integer original whose [L,U] contains no integer.
        let x = p.add_original(0.2, 0.8, true, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        p.set_objective(xn, Sense::Minimize);
        let err = p.standardize().unwrap_err();
        assert!(matches!(err, SolverError::BoundViolation { .. }));
    }
}
