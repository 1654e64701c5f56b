//! The six end-to-end scenarios: each builds a small problem, standardizes
//! it, and checks the numeric facts the solver's pieces must agree on.

use minlp_core::bounds_engine::BoundEngine;
use minlp_core::config::SolverConfig;
use minlp_core::convexify::root_convexify;
use minlp_core::depgraph::DependencyGraph;
use minlp_core::error::SolverError;
use minlp_core::expr::node::ExprKind;
use minlp_core::problem::{Problem, Sense};
use minlp_core::VarIndex;

#[test]
fn scenario_1_single_variable_convex() {
    // min exp(x) s.t. x in [-1, 1] -- optimum x = -1, objective e^-1.
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(-1.0, 1.0, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let e = p.arena_mut().intern(ExprKind::Exp(xn));
    p.set_objective(e, Sense::Minimize);
    p.standardize().unwrap();

    assert_eq!(2, p.vars().len(), "exactly two vars: x and w = exp(x)");
    let w = p.objective().unwrap();
    assert!(p.vars().get(w).is_aux());
    p.domain_mut().set_value(x, -1.0);
    let mut engine = BoundEngine::new(p.vars().len());
    engine.propagate(&mut p).unwrap();
    assert!((p.domain().lower(w) - (-1.0_f64).exp()).abs() < 1e-9);
}

#[test]
fn scenario_2_single_variable_nonconvex_standardizes_into_two_auxs() {
    // min x^4 - 4x^2 + x s.t. x in [-3, 3].
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(-3.0, 3.0, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let two = p.arena_mut().intern(ExprKind::Const(2.0));
    let x2 = p.arena_mut().intern(ExprKind::Pow(xn, two));
    let x4 = p.arena_mut().intern(ExprKind::Pow(x2, two));
    let four = p.arena_mut().intern(ExprKind::Const(4.0));
    let four_x2 = p.arena_mut().intern(ExprKind::Mul(vec![four, x2]));
    let diff = p.arena_mut().intern(ExprKind::Sub(x4, four_x2));
    let obj = p.arena_mut().intern(ExprKind::Sum(vec![diff, xn]));
    p.set_objective(obj, Sense::Minimize);
    p.standardize().unwrap();

    let n_auxs = (0..p.vars().len()).filter(|&i| p.vars().get(VarIndex(i)).is_aux()).count();
    assert!(n_auxs >= 2, "expected at least w1 = x^2 and w2 = w1^2, got {n_auxs}");

    // check the standardized system round-trips the original expression at
    // a sample point (spec.md P4): evaluating the original tree and
    // evaluating the objective aux's own (standardized) image must agree.
    p.domain_mut().set_value(x, -1.4961);
    let w = p.objective().unwrap();
    let image = p.vars().get(w).image().unwrap();
    let direct = minlp_core::expr::eval::evaluate(p.arena(), obj, p.domain());
    let standardized = minlp_core::expr::eval::evaluate(p.arena(), image, p.domain());
    assert!((direct - standardized).abs() < 1e-9, "direct={direct} standardized={standardized}");
}

#[test]
fn scenario_3_bilinear_mccormick_is_exact_at_both_optimal_corners() {
    // min xy s.t. x,y in [0,1] -- optimum at (0,1) or (1,0), objective 0.
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(0.0, 1.0, false, None);
    let y = p.add_original(0.0, 1.0, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let yn = p.arena_mut().intern(ExprKind::Var(y));
    let prod = p.arena_mut().intern(ExprKind::Mul(vec![xn, yn]));
    p.set_objective(prod, Sense::Minimize);
    p.standardize().unwrap();

    let w = p.objective().unwrap();
    for (xv, yv) in [(0.0, 1.0), (1.0, 0.0)] {
        p.domain_mut().set_value(x, xv);
        p.domain_mut().set_value(y, yv);
        p.domain_mut().set_value(w, xv * yv);
        let cuts = root_convexify(&p);
        for c in &cuts {
            assert!(!c.is_violated(p.domain(), 1e-9), "McCormick cut {c:?} should be tight, not violated, at a corner");
        }
    }
}

#[test]
fn scenario_4_minlp_branch_on_integer_left_child_is_trivial() {
    // min x + y s.t. x^2 + y^2 <= 1, x in {0,1}, y in [-1,1].
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(0.0, 1.0, true, None);
    let y = p.add_original(-1.0, 1.0, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let yn = p.arena_mut().intern(ExprKind::Var(y));
    let sum = p.arena_mut().intern(ExprKind::Sum(vec![xn, yn]));
    p.set_objective(sum, Sense::Minimize);
    let two = p.arena_mut().intern(ExprKind::Const(2.0));
    let x2 = p.arena_mut().intern(ExprKind::Pow(xn, two));
    let y2 = p.arena_mut().intern(ExprKind::Pow(yn, two));
    let circ = p.arena_mut().intern(ExprKind::Sum(vec![x2, y2]));
    p.add_constraint(circ, f64::NEG_INFINITY, 1.0);
    p.standardize().unwrap();

    // branch x into [0,0] (left) and [1,1] (right); the left child forces
    // x=0 and the circle constraint collapses to y^2 <= 1, already implied
    // by y's own box -- FBBT must not report infeasible.
    let left = minlp_core::branching::BranchChild { var: x, new_lower: 0.0, new_upper: 0.0 };
    let mut engine = BoundEngine::new(p.vars().len());
    let ok = minlp_core::branching::apply_and_tighten(&mut p, &mut engine, &left).unwrap();
    assert!(ok, "x=0, y in [-1,1] must remain feasible");
    assert_eq!(0.0, p.domain().lower(x));
    assert_eq!(0.0, p.domain().upper(x));
}

#[test]
fn scenario_5_infeasibility_via_fbbt_at_the_root() {
    // exp(x) <= -1 must be detected infeasible by the backward pass before
    // any LP solve: U[w] = -1 < 0 for w = exp(x).
    let mut p = Problem::new(SolverConfig::default());
    let x = p.add_original(-10.0, 10.0, false, None);
    let xn = p.arena_mut().intern(ExprKind::Var(x));
    let e = p.arena_mut().intern(ExprKind::Exp(xn));
    p.set_objective(e, Sense::Minimize);
    p.standardize().unwrap();

    let w = p.objective().unwrap();
    p.install_bounds(w, f64::NEG_INFINITY, -1.0);
    let mut engine = BoundEngine::new(p.vars().len());
    let err = engine.tighten(&mut p).unwrap_err();
    assert!(matches!(err, SolverError::NodeInfeasible { .. }));
}

#[test]
fn scenario_6_cycle_detection() {
    // A synthetic w1 = w2 + 1, w2 = w1 - 1 fed directly to the dependency
    // graph must raise CycleInDependencies.
    let mut g = DependencyGraph::new();
    g.insert_aux(vec![VarIndex(1)]); // w0 depends on w1
    g.insert_aux(vec![VarIndex(0)]); // w1 depends on w0
    let err = g.create_order().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, SolverError::CycleInDependencies { .. }));
}
