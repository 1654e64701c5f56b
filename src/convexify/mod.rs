//! The convexifier, component G of `spec.md` §4.G: for every Aux whose
//! image is not already linear, build valid local cuts that tighten the LP
//! relaxation around the current sub-box and LP point.

pub mod cuts;
pub mod envelopes;
pub mod mccormick;

use fxhash::FxHashMap;
use tracing::{debug, debug_span};

use crate::common::VarIndex;
use crate::config::SolverConfig;
use crate::convexify::cuts::{CutSense, RowCut};
use crate::domain::Domain;
use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, GroupData, NodeId};
use crate::problem::{Constraint, Problem};
use crate::variable::VariableStore;

fn term_envelope(i: VarIndex, j: VarIndex, c: f64, domain: &Domain) -> ((Vec<(VarIndex, f64)>, f64), (Vec<(VarIndex, f64)>, f64)) {
    let li = domain.lower(i);
    let ui = domain.upper(i);
    let (under, over) = if i == j {
        (
            (vec![(i, 2.0 * li)], -li * li),
            (vec![(i, li + ui)], -li * ui),
        )
    } else {
        let lj = domain.lower(j);
        let uj = domain.upper(j);
        (
            (vec![(j, li), (i, lj)], -li * lj),
            (vec![(j, ui), (i, lj)], -ui * lj),
        )
    };
    scale_pair(under, over, c)
}

fn scale_pair(
    under: (Vec<(VarIndex, f64)>, f64),
    over: (Vec<(VarIndex, f64)>, f64),
    c: f64,
) -> ((Vec<(VarIndex, f64)>, f64), (Vec<(VarIndex, f64)>, f64)) {
    let scale = |(terms, k): (Vec<(VarIndex, f64)>, f64), factor: f64| {
        (terms.into_iter().map(|(v, a)| (v, a * factor)).collect(), k * factor)
    };
    if c >= 0.0 {
        (scale(under, c), scale(over, c))
    } else {
        (scale(over, c), scale(under, c))
    }
}

/// Aggregate McCormick-style envelope for a `Group`/`Quad` Aux carrying more
/// than one quadratic term (or a nonzero linear/constant part alongside a
/// quadratic one): one termwise underestimator summed into a single lower
/// cut, one overestimator summed into a single upper cut. Valid because each
/// term's envelope inequality holds pointwise, so the sum of the right-hand
/// sides still bounds the sum of the terms (`spec.md` §4.G generalizes from
/// its single-bilinear-term example this way; see `DESIGN.md`).
fn quad_envelope(w: VarIndex, g: &GroupData, q: &[(VarIndex, VarIndex, f64)], domain: &Domain) -> Vec<RowCut> {
    let mut lower_terms: FxHashMap<VarIndex, f64> = FxHashMap::default();
    let mut upper_terms: FxHashMap<VarIndex, f64> = FxHashMap::default();
    let mut lower_rhs = g.const0;
    let mut upper_rhs = g.const0;
    for &(v, c) in &g.linear {
        *lower_terms.entry(v).or_insert(0.0) += c;
        *upper_terms.entry(v).or_insert(0.0) += c;
    }
    for &(i, j, c) in q {
        let ((lt, lk), (ut, uk)) = term_envelope(i, j, c, domain);
        for (v, a) in lt {
            *lower_terms.entry(v).or_insert(0.0) += a;
        }
        lower_rhs += lk;
        for (v, a) in ut {
            *upper_terms.entry(v).or_insert(0.0) += a;
        }
        upper_rhs += uk;
    }
    let lower_coeffs: Vec<_> = std::iter::once((w, 1.0)).chain(lower_terms.into_iter().map(|(v, a)| (v, -a))).collect();
    let upper_coeffs: Vec<_> = std::iter::once((w, 1.0)).chain(upper_terms.into_iter().map(|(v, a)| (v, -a))).collect();
    vec![
        RowCut::local(lower_coeffs, CutSense::Ge, lower_rhs),
        RowCut::local(upper_coeffs, CutSense::Le, upper_rhs),
    ]
}

fn var_of(arena: &NodeArena, node: NodeId) -> Option<VarIndex> {
    match arena.get(node) {
        ExprKind::Var(i) => Some(*i),
        _ => None,
    }
}

/// Produces the local cuts for one Aux, dispatching on its image's operator
/// shape. Already-linear images (`Group` with no quadratic term) and Auxes
/// with `multiplicity == 0` (a standardization remnant nothing in the
/// problem still references) produce nothing.
pub fn convexify_var(
    arena: &NodeArena,
    vars: &VariableStore,
    domain: &Domain,
    config: &SolverConfig,
    k: VarIndex,
) -> Vec<RowCut> {
    let var = vars.get(k);
    if var.multiplicity == 0 {
        return Vec::new();
    }
    let Some(image) = var.image() else { return Vec::new() };
    let kind = arena.get(image);
    let x0 = |a: VarIndex| domain.value(a);
    let l = |a: VarIndex| domain.lower(a);
    let u = |a: VarIndex| domain.upper(a);
    let mode = config.convexification_type;
    let n_pts = config.convexification_points;

    match kind {
        ExprKind::Group(_) => Vec::new(),
        ExprKind::Quad(g, q) if q.len() == 1 && g.linear.is_empty() && g.const0 == 0.0 => {
            let (i, j, c) = q[0];
            if (c - 1.0).abs() > 1e-12 {
                // non-unit coefficient: fall back to the general aggregator,
                // which handles an arbitrary scale correctly.
                return quad_envelope(k, g, q, domain);
            }
            if i == j {
                envelopes::square_envelope(k, i, l(i), u(i), x0(i), mode, n_pts)
            } else {
                mccormick::bilinear_envelope(k, i, j, l(i), u(i), l(j), u(j))
            }
        }
        ExprKind::Quad(g, q) => quad_envelope(k, g, q, domain),
        ExprKind::Exp(a) => {
            let Some(x) = var_of(arena, *a) else { return Vec::new() };
            envelopes::exp_envelope(k, x, l(x), u(x), x0(x), mode, n_pts)
        }
        ExprKind::Log(a) => {
            let Some(x) = var_of(arena, *a) else { return Vec::new() };
            envelopes::log_envelope(k, x, l(x), u(x), x0(x), mode, n_pts)
        }
        ExprKind::Sin(a) => {
            let Some(x) = var_of(arena, *a) else { return Vec::new() };
            envelopes::sin_envelope_cuts(k, x, l(x), u(x), x0(x))
        }
        ExprKind::Cos(a) => {
            let Some(x) = var_of(arena, *a) else { return Vec::new() };
            envelopes::cos_envelope_cuts(k, x, l(x), u(x), x0(x))
        }
        ExprKind::Abs(a) => {
            let Some(x) = var_of(arena, *a) else { return Vec::new() };
            envelopes::abs_envelope(k, x, l(x), u(x))
        }
        ExprKind::Pow(a, b) => {
            let (Some(x), ExprKind::Const(n)) = (var_of(arena, *a), arena.get(*b)) else { return Vec::new() };
            let n = *n as i32;
            if n % 2 == 1 && n > 0 {
                envelopes::odd_power_envelope(k, x, n, l(x), u(x), x0(x), mode, n_pts)
            } else if n == 2 {
                envelopes::square_envelope(k, x, l(x), u(x), x0(x), mode, n_pts)
            } else if n > 0 {
                envelopes::even_power_envelope(k, x, n, l(x), u(x), x0(x), mode, n_pts)
            } else {
                Vec::new()
            }
        }
        ExprKind::Div(a, b) => {
            let (Some(x_num), Some(y)) = (var_of(arena, *a), var_of(arena, *b)) else { return Vec::new() };
            // w = x/y; McCormick on (w, y) standing in for x = w*y.
            mccormick::division_envelope(x_num, k, y, l(k), u(k), l(y), u(y))
        }
        ExprKind::Max(args) => {
            let pairs: Vec<(VarIndex, f64)> = args.iter().filter_map(|&a| var_of(arena, a).map(|v| (v, u(v)))).collect();
            if pairs.len() != args.len() {
                return Vec::new();
            }
            envelopes::max_envelope(k, &pairs)
        }
        ExprKind::Min(args) => {
            let pairs: Vec<(VarIndex, f64)> = args.iter().filter_map(|&a| var_of(arena, a).map(|v| (v, l(v)))).collect();
            if pairs.len() != args.len() {
                return Vec::new();
            }
            envelopes::min_envelope(k, &pairs)
        }
        _ => Vec::new(),
    }
}

/// `spec.md` §4.G "Initial (root) convexification", the linear case: "for
/// every constraint body that is an Aux `w` with bound `[l,u]` and a linear
/// image, emit the plain linear inequality `l <= image <= u` directly."
/// `convexify_var` returns nothing for a `Group` image since there is no
/// nonlinearity to envelope, so this is the only place such a constraint
/// ever becomes an LP row. Reuses `expr::bounds::group_bounds`'s own
/// linear-term layout (`g.linear`/`g.const0`) to build the coefficients;
/// valid in every sub-box, so emitted as global rows.
fn constraint_row_cuts(arena: &NodeArena, vars: &VariableStore, c: &Constraint) -> Vec<RowCut> {
    let Some(image) = vars.get(c.body).image() else { return Vec::new() };
    let ExprKind::Group(g) = arena.get(image) else { return Vec::new() };
    if !g.nonlinear.is_empty() {
        return Vec::new();
    }
    let mut cuts = Vec::new();
    if c.lower.is_finite() {
        cuts.push(RowCut::global(g.linear.clone(), CutSense::Ge, c.lower - g.const0));
    }
    if c.upper.is_finite() {
        cuts.push(RowCut::global(g.linear.clone(), CutSense::Le, c.upper - g.const0));
    }
    cuts
}

/// `spec.md` §4.G "Initial (root) convexification": every Aux in the
/// problem gets its envelope cuts, every constraint's linear image gets its
/// plain bound row, filtered for violation against the current LP point if
/// `config.violated_cuts_only` is set.
pub fn root_convexify(problem: &Problem) -> Vec<RowCut> {
    let _span = debug_span!("convexify_root").entered();
    let mut cuts = Vec::new();
    for k in 0..problem.vars().len() {
        let k = VarIndex(k);
        cuts.extend(convexify_var(problem.arena(), problem.vars(), problem.domain(), problem.config(), k));
    }
    for c in problem.constraints() {
        cuts.extend(constraint_row_cuts(problem.arena(), problem.vars(), c));
    }
    let cuts = filter_violated(problem, cuts);
    debug!(n_cuts = cuts.len(), "root convexification");
    cuts
}

/// `spec.md` §4.G "Per-node refresh": only Auxs that (transitively) depend
/// on a variable in `changed` need fresh cuts.
pub fn refresh_convexify(problem: &Problem, changed: &[VarIndex]) -> Vec<RowCut> {
    let _span = debug_span!("convexify_refresh").entered();
    let mut dirty = vec![false; problem.vars().len()];
    for &c in changed {
        mark_dependents(problem, c, &mut dirty);
    }
    let mut cuts = Vec::new();
    for (idx, is_dirty) in dirty.iter().enumerate() {
        if *is_dirty {
            cuts.extend(convexify_var(problem.arena(), problem.vars(), problem.domain(), problem.config(), VarIndex(idx)));
        }
    }
    for c in problem.constraints() {
        if dirty[c.body.id()] {
            cuts.extend(constraint_row_cuts(problem.arena(), problem.vars(), c));
        }
    }
    let cuts = filter_violated(problem, cuts);
    debug!(n_cuts = cuts.len(), n_changed = changed.len(), "sparse convexification refresh");
    cuts
}

fn mark_dependents(problem: &Problem, v: VarIndex, dirty: &mut [bool]) {
    for &dep in problem.deps().dependents_of(v) {
        if !dirty[dep.id()] {
            dirty[dep.id()] = true;
            mark_dependents(problem, dep, dirty);
        }
    }
}

fn filter_violated(problem: &Problem, cuts: Vec<RowCut>) -> Vec<RowCut> {
    if !problem.config().violated_cuts_only {
        return cuts;
    }
    let eps = problem.config().feas_tolerance;
    cuts.into_iter().filter(|c| c.is_violated(problem.domain(), eps)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SolverConfig, SolverConfigBuilder};
    use crate::expr::node::ExprKind;
    use crate::problem::{Problem, Sense};

    #[test]
    fn linear_objective_produces_no_cuts() {
        let mut p = Problem::new(SolverConfig::default());
        let x = p.add_original(0.0, 1.0, false, None);
        let y = p.add_original(0.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let sum = p.arena_mut().intern(ExprKind::Sum(vec![xn, yn]));
        p.set_objective(sum, Sense::Minimize);
        p.standardize().unwrap();
        let cuts = root_convexify(&p);
        assert!(cuts.is_empty());
    }

    #[test]
    fn linear_constraint_gets_a_plain_bound_row() {
        let cfg = SolverConfigBuilder::default().violated_cuts_only(false).build().unwrap();
        let mut p = Problem::new(cfg);
        let x = p.add_original(0.0, 1.0, false, None);
        let y = p.add_original(0.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let sum = p.arena_mut().intern(ExprKind::Sum(vec![xn, yn]));
        p.set_objective(xn, Sense::Minimize);
        p.add_constraint(sum, 0.0, 1.0);
        p.standardize().unwrap();

        let cuts = root_convexify(&p);
        assert_eq!(2, cuts.len(), "x + y in [0,1] needs one Ge row and one Le row");

        p.domain_mut().set_value(x, 0.7);
        p.domain_mut().set_value(y, 0.7);
        assert!(cuts.iter().any(|c| c.is_violated(p.domain(), 1e-9)), "x + y = 1.4 must violate the upper row");

        p.domain_mut().set_value(x, 0.3);
        p.domain_mut().set_value(y, 0.3);
        assert!(cuts.iter().all(|c| !c.is_violated(p.domain(), 1e-9)), "x + y = 0.6 satisfies both rows");
    }

    #[test]
    fn bilinear_objective_produces_mccormick_cuts() {
        let cfg = SolverConfigBuilder::default().violated_cuts_only(false).build().unwrap();
        let mut p = Problem::new(cfg);
        let x = p.add_original(0.0, 1.0, false, None);
        let y = p.add_original(0.0, 1.0, false, None);
        let xn = p.arena_mut().intern(ExprKind::Var(x));
        let yn = p.arena_mut().intern(ExprKind::Var(y));
        let prod = p.arena_mut().intern(ExprKind::Mul(vec![xn, yn]));
        p.set_objective(prod, Sense::Minimize);
        p.standardize().unwrap();
        let cuts = root_convexify(&p);
        assert_eq!(4, cuts.len());
    }
}
