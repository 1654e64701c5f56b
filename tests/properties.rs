//! Property-based tests for the universal invariants of `spec.md` §8
//! (P1-P4, P6, P7; P5 — simplification idempotence — is covered by
//! `src/expr/simplify.rs`'s own unit tests, next to the code it verifies).

use proptest::prelude::*;

use minlp_core::bounds_engine::BoundEngine;
use minlp_core::common::VarIndex;
use minlp_core::config::SolverConfig;
use minlp_core::convexify::mccormick::bilinear_envelope;
use minlp_core::depgraph::DependencyGraph;
use minlp_core::domain::Domain;
use minlp_core::expr::eval::evaluate;
use minlp_core::expr::node::ExprKind;
use minlp_core::external::lp::{LpSolver, LpStatus, ObjSense};
use minlp_core::obbt::{self, ExactFlags};
use minlp_core::problem::{Problem, Sense};

fn exp_problem(l: f64, u: f64) -> (Problem, VarIndex) {
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(l, u, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let e = p.arena_mut().intern(ExprKind::Exp(xn));
    p.set_objective(e, Sense::Minimize);
    p.standardize().unwrap();
    (p, x)
}

proptest! {
    // P1: for w = exp(x), L[w] <= exp(v) <= U[w] for every v sampled in [L(x), U(x)].
    #[test]
    fn p1_exp_aux_bounds_contain_every_sampled_image(l in -5.0f64..0.0, spread in 0.1f64..5.0, t in 0.0f64..1.0) {
        let u = l + spread;
        let (mut p, x) = exp_problem(l, u);
        let w = p.objective().unwrap();
        let v = l + t * (u - l);
        p.domain_mut().set_value(x, v);
        let image = p.vars().get(w).image().unwrap();
        let val = evaluate(p.arena(), image, p.domain());
        prop_assert!(val >= p.domain().lower(w) - 1e-9);
        prop_assert!(val <= p.domain().upper(w) + 1e-9);
    }

    // P2: a McCormick cut for w = x*y is never violated by the true product
    // at any (x, y) drawn from their own box.
    #[test]
    fn p2_mccormick_cut_holds_at_the_true_product(
        lx in -3.0f64..3.0, dx in 0.1f64..3.0,
        ly in -3.0f64..3.0, dy in 0.1f64..3.0,
        tx in 0.0f64..1.0, ty in 0.0f64..1.0,
    ) {
        let ux = lx + dx;
        let uy = ly + dy;
        let w = VarIndex(0);
        let xi = VarIndex(1);
        let yi = VarIndex(2);
        let cuts = bilinear_envelope(w, xi, yi, lx, ux, ly, uy);
        let x_val = lx + tx * (ux - lx);
        let y_val = ly + ty * (uy - ly);
        let mut d = Domain::new(3);
        d.set_value(xi, x_val);
        d.set_value(yi, y_val);
        d.set_value(w, x_val * y_val);
        for c in &cuts {
            prop_assert!(!c.is_violated(&d, 1e-7), "{:?} violated by the true product at a box-feasible point", c);
        }
    }

    // P3: one propagate+implied pass never widens a bound.
    #[test]
    fn p3_tighten_pass_never_widens(l in -5.0f64..0.0, spread in 0.1f64..10.0) {
        let u = l + spread;
        let (mut p, x) = exp_problem(l, u);
        let before_l = p.domain().lower(x);
        let before_u = p.domain().upper(x);
        let mut engine = BoundEngine::new(p.vars().len());
        engine.tighten(&mut p).unwrap();
        prop_assert!(p.domain().lower(x) >= before_l - 1e-9);
        prop_assert!(p.domain().upper(x) <= before_u + 1e-9);
    }

    // P4: evaluating the original tree and the standardized aux's image at
    // the same sample point agree within 1e-9.
    #[test]
    fn p4_standardization_round_trips_the_original_expression(l in -5.0f64..0.0, spread in 0.1f64..5.0, t in 0.0f64..1.0) {
        let u = l + spread;
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(l, u, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let sq = {
            let two = p.arena_mut().intern(ExprKind::Const(2.0));
            p.arena_mut().intern(ExprKind::Pow(xn, two))
        };
        let e = p.arena_mut().intern(ExprKind::Exp(xn));
        let obj = p.arena_mut().intern(ExprKind::Sum(vec![sq, e]));
        p.set_objective(obj, Sense::Minimize);
        p.standardize().unwrap();

        let v = l + t * (u - l);
        p.domain_mut().set_value(x, v);
        let w = p.objective().unwrap();
        let image = p.vars().get(w).image().unwrap();
        let direct = evaluate(p.arena(), obj, p.domain());
        let standardized = evaluate(p.arena(), image, p.domain());
        prop_assert!((direct - standardized).abs() < 1e-9, "direct={} standardized={}", direct, standardized);
    }
}

// P6: topological order terminates iff the dependency graph is acyclic.
#[test]
fn p6_chain_of_auxs_has_a_topological_order() {
    let mut g = DependencyGraph::new();
    g.insert_var();
    for i in 0..20 {
        g.insert_aux(vec![VarIndex(i)]);
    }
    let order = g.create_order().unwrap();
    assert_eq!(21, order.len());
}

#[test]
fn p6_cyclic_graph_reports_cycle_instead_of_an_order() {
    let mut g = DependencyGraph::new();
    g.insert_aux(vec![VarIndex(1)]);
    g.insert_aux(vec![VarIndex(0)]);
    assert!(g.create_order().is_err());
}

// P7: OBBT output bounds are never wider than its input bounds.
struct BoxLp {
    lower: Vec<f64>,
    upper: Vec<f64>,
    solution: Vec<f64>,
}

impl LpSolver for BoxLp {
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
        for (c, &coeff) in coeffs.iter().enumerate() {
            if coeff > 0.0 {
                self.solution[c] = self.lower[c];
            } else if coeff < 0.0 {
                self.solution[c] = self.upper[c];
            }
        }
    }
    fn set_obj_sense(&mut self, sense: ObjSense) {
        for i in 0..self.solution.len() {
            self.solution[i] = if sense == ObjSense::Maximize { self.upper[i] } else { self.lower[i] };
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
    fn apply_cuts(&mut self, _cuts: &[minlp_core::convexify::cuts::RowCut]) {}
    fn clone_box(&self) -> Box<dyn LpSolver> {
        Box::new(BoxLp { lower: self.lower.clone(), upper: self.upper.clone(), solution: self.solution.clone() })
    }
}

proptest! {
    #[test]
    fn p7_obbt_never_widens_the_domain(l in -10.0f64..0.0, spread in 0.1f64..20.0, tl in 0.0f64..1.0, tu in 0.0f64..1.0) {
        let u = l + spread;
        let (mut p, x) = exp_problem(l, u);
        let before_l = p.domain().lower(x);
        let before_u = p.domain().upper(x);

        let lp_l = before_l + tl * (before_u - before_l) * 0.5;
        let lp_u = before_u - tu * (before_u - before_l) * 0.5;
        let lp_u = lp_u.max(lp_l);
        let mut lp = BoxLp { lower: vec![lp_l], upper: vec![lp_u], solution: vec![lp_l] };
        let mut flags = ExactFlags::new(p.vars().len());
        let mut engine = BoundEngine::new(p.vars().len());
        obbt::run(&mut p, &mut lp, &mut flags, &mut engine).unwrap();

        prop_assert!(p.domain().lower(x) >= before_l - 1e-9);
        prop_assert!(p.domain().upper(x) <= before_u + 1e-9);
    }
}
