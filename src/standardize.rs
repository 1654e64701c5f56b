//! The `standardize(expr)` recursive walk, the core of component D's
//! algorithm (`spec.md` §4.D): reduces any expression tree to the closed
//! linear-plus-auxiliary form by flattening additive chains into
//! [`GroupData`], flattening products via `flattenMul`, passing through
//! `Pow` with exponent 1 or 2, and interning a fresh [`crate::variable::Aux`]
//! for every other operator.
//!
//! **Resolved ambiguity** (recorded in `DESIGN.md`): `spec.md`'s driver
//! pseudocode names the result of `standardize(b)` "aux" and immediately
//! wraps it in a `Clone`, which only makes sense if a variable reference
//! comes out the other end. This module's [`standardize`] is the *internal*
//! recursive reduction — it can legitimately return `Const`/`Var`/`Group`/
//! `Quad`, since those are the shapes a nested additive/multiplicative term
//! may flatten into without needing their own auxiliary. [`standardize_body`]
//! is the driver-facing entry point used for constraint/objective bodies: it
//! calls [`standardize`] and then force-interns an Aux around the result
//! unless it is already a bare `Var`.

use crate::common::VarIndex;
use crate::expr::arena::NodeArena;
use crate::expr::bounds;
use crate::expr::depset::fill_dep_set;
use crate::expr::node::{ExprKind, GroupData, NodeId};
use crate::depgraph::DependencyGraph;
use crate::variable::VariableStore;

/// Reduces `expr` to its standardized shape. Returns `(node, lb_expr,
/// ub_expr)`: `node` is `Const`, `Var`, `Group`, or `Quad` — never a bare
/// `Sum`/`Sub`/`Mul`/`Pow` or any of the "every other operator" shapes,
/// which are always force-wrapped into an `Aux` before this function
/// returns a result containing them.
pub fn standardize(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    expr: NodeId,
) -> (NodeId, NodeId, NodeId) {
    let expr = arena.resolve(expr);
    let kind = arena.get(expr).clone();
    match kind {
        ExprKind::Const(v) => {
            let n = arena.intern(ExprKind::Const(v));
            (n, n, n)
        }
        ExprKind::Var(i) => var_triple(arena, i),
        ExprKind::LowerBound(i) | ExprKind::UpperBound(i) => var_triple(arena, i),
        ExprKind::Sum(args) => {
            let terms: Vec<(NodeId, f64)> = args.iter().map(|a| (*a, 1.0)).collect();
            standardize_additive(arena, vars, deps, &terms)
        }
        ExprKind::Sub(a, b) => standardize_additive(arena, vars, deps, &[(a, 1.0), (b, -1.0)]),
        ExprKind::Group(g) => {
            let terms: Vec<(NodeId, f64)> = g
                .linear
                .iter()
                .map(|(v, c)| (arena.intern(ExprKind::Var(*v)), *c))
                .chain(g.nonlinear.iter().map(|n| (*n, 1.0)))
                .collect();
            let (node, lb, ub) = standardize_additive(arena, vars, deps, &terms);
            if g.const0 != 0.0 {
                add_constant(arena, node, g.const0, lb, ub)
            } else {
                (node, lb, ub)
            }
        }
        ExprKind::Mul(args) => standardize_mul(arena, vars, deps, &args),
        ExprKind::Pow(a, b) => standardize_pow(arena, vars, deps, a, b),
        ExprKind::Quad(g, q) => {
            let terms: Vec<(NodeId, f64)> = g
                .linear
                .iter()
                .map(|(v, c)| (arena.intern(ExprKind::Var(*v)), *c))
                .chain(g.nonlinear.iter().map(|n| (*n, 1.0)))
                .collect();
            let (node, lb, ub) = standardize_additive(arena, vars, deps, &terms);
            let node = add_quad_terms(arena, node, &q);
            let (lb2, ub2) = bounds::bounds(arena, &arena.get(node).clone(), &[]);
            let _ = (lb, ub);
            (node, lb2, ub2)
        }
        ExprKind::Opp(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Opp),
        ExprKind::Abs(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Abs),
        ExprKind::Exp(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Exp),
        ExprKind::Log(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Log),
        ExprKind::Sin(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Sin),
        ExprKind::Cos(a) => standardize_generic1(arena, vars, deps, a, ExprKind::Cos),
        ExprKind::Div(a, b) => standardize_generic2(arena, vars, deps, a, b, ExprKind::Div),
        ExprKind::Min(args) => standardize_genericn(arena, vars, deps, &args, ExprKind::Min),
        ExprKind::Max(args) => standardize_genericn(arena, vars, deps, &args, ExprKind::Max),
        ExprKind::Ref(_) => unreachable!("arena.resolve already followed Ref chains"),
    }
}

/// Driver-facing entry point: standardizes `expr` and force-interns an Aux
/// around the result unless it is already a bare `Var`, per the resolved
/// ambiguity documented in this module's doc comment.
pub fn standardize_body(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    expr: NodeId,
) -> VarIndex {
    let (node, lb, ub) = standardize(arena, vars, deps, expr);
    match arena.get(node) {
        ExprKind::Var(i) => *i,
        _ => force_aux(arena, vars, deps, node, lb, ub, false).0,
    }
}

fn var_triple(arena: &mut NodeArena, i: VarIndex) -> (NodeId, NodeId, NodeId) {
    let n = arena.intern(ExprKind::Var(i));
    let lb = arena.intern(ExprKind::LowerBound(i));
    let ub = arena.intern(ExprKind::UpperBound(i));
    (n, lb, ub)
}

/// Interns `image` as a fresh (or already-seen) Aux, registering it in the
/// dependency graph the first time it is created. Returns the Aux's index
/// plus its own `(Var, LowerBound, UpperBound)` reference nodes.
fn force_aux(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    image: NodeId,
    lb_expr: NodeId,
    ub_expr: NodeId,
    is_integer: bool,
) -> (VarIndex, NodeId, NodeId) {
    let before = vars.len();
    let idx = vars.intern_aux(image, lb_expr, ub_expr, is_integer);
    if vars.len() != before {
        let mut dep_vars = Vec::new();
        fill_dep_set(arena, image, &mut dep_vars);
        deps.insert_aux(dep_vars);
    }
    let (_, lb, ub) = var_triple(arena, idx);
    (idx, lb, ub)
}

fn standardize_generic1(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    a: NodeId,
    build: fn(NodeId) -> ExprKind,
) -> (NodeId, NodeId, NodeId) {
    let (sa, lb_a, ub_a) = standardize(arena, vars, deps, a);
    let image = arena.intern(build(sa));
    let (lb_expr, ub_expr) = bounds::bounds(arena, &build(sa), &[(lb_a, ub_a)]);
    let (idx, lb, ub) = force_aux(arena, vars, deps, image, lb_expr, ub_expr, false);
    let (v, _, _) = var_triple(arena, idx);
    (v, lb, ub)
}

fn standardize_generic2(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    a: NodeId,
    b: NodeId,
    build: fn(NodeId, NodeId) -> ExprKind,
) -> (NodeId, NodeId, NodeId) {
    let (sa, lb_a, ub_a) = standardize(arena, vars, deps, a);
    let (sb, lb_b, ub_b) = standardize(arena, vars, deps, b);
    let image = arena.intern(build(sa, sb));
    let (lb_expr, ub_expr) = bounds::bounds(arena, &build(sa, sb), &[(lb_a, ub_a), (lb_b, ub_b)]);
    let (idx, lb, ub) = force_aux(arena, vars, deps, image, lb_expr, ub_expr, false);
    let (v, _, _) = var_triple(arena, idx);
    (v, lb, ub)
}

fn standardize_genericn(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    args: &[NodeId],
    build: fn(Vec<NodeId>) -> ExprKind,
) -> (NodeId, NodeId, NodeId) {
    let mut snodes = Vec::with_capacity(args.len());
    let mut child_bounds = Vec::with_capacity(args.len());
    for a in args {
        let (sa, lb_a, ub_a) = standardize(arena, vars, deps, *a);
        snodes.push(sa);
        child_bounds.push((lb_a, ub_a));
    }
    let image = arena.intern(build(snodes.clone()));
    let (lb_expr, ub_expr) = bounds::bounds(arena, &build(snodes), &child_bounds);
    let (idx, lb, ub) = force_aux(arena, vars, deps, image, lb_expr, ub_expr, false);
    let (v, _, _) = var_triple(arena, idx);
    (v, lb, ub)
}

fn standardize_pow(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    a: NodeId,
    b: NodeId,
) -> (NodeId, NodeId, NodeId) {
    let b_resolved = arena.resolve(b);
    if let ExprKind::Const(e) = *arena.get(b_resolved) {
        if e == 1.0 {
            return standardize(arena, vars, deps, a);
        }
        if e == 2.0 {
            return standardize_mul(arena, vars, deps, &[a, a]);
        }
    }
    standardize_generic2(arena, vars, deps, a, b, ExprKind::Pow)
}

/// Flattens a sequence of `(term, sign)` pairs into a single `Group`/`Quad`/
/// `Const`/`Var`, recursively standardizing each term, per the Sum/Sub/Group
/// bullet of `spec.md` §4.D.
fn standardize_additive(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    terms: &[(NodeId, f64)],
) -> (NodeId, NodeId, NodeId) {
    let mut const0 = 0.0;
    let mut linear: Vec<(VarIndex, f64)> = Vec::new();
    let mut quad: Vec<(VarIndex, VarIndex, f64)> = Vec::new();

    let mut add_linear = |linear: &mut Vec<(VarIndex, f64)>, v: VarIndex, c: f64| {
        if let Some(existing) = linear.iter_mut().find(|(iv, _)| *iv == v) {
            existing.1 += c;
        } else {
            linear.push((v, c));
        }
    };

    for (term, sign) in terms {
        let (snode, _, _) = standardize(arena, vars, deps, *term);
        match arena.get(snode).clone() {
            ExprKind::Const(v) => const0 += sign * v,
            ExprKind::Var(i) => add_linear(&mut linear, i, *sign),
            ExprKind::Group(g) => {
                const0 += sign * g.const0;
                for (v, c) in &g.linear {
                    add_linear(&mut linear, *v, sign * c);
                }
                debug_assert!(g.nonlinear.is_empty(), "standardize always reduces residuals to Var");
            }
            ExprKind::Quad(g, q) => {
                const0 += sign * g.const0;
                for (v, c) in &g.linear {
                    add_linear(&mut linear, *v, sign * c);
                }
                debug_assert!(g.nonlinear.is_empty(), "standardize always reduces residuals to Var");
                for (i, j, c) in &q {
                    quad.push((*i, *j, sign * c));
                }
            }
            _ => unreachable!("standardize never returns a bare non-Group/Quad compound node"),
        }
    }

    linear.retain(|(_, c)| *c != 0.0);
    let group = GroupData { const0, linear, nonlinear: Vec::new() };
    let node = if quad.is_empty() {
        if group.is_empty() {
            arena.intern(ExprKind::Const(0.0))
        } else if group.linear.is_empty() {
            arena.intern(ExprKind::Const(group.const0))
        } else if group.const0 == 0.0 && group.linear.len() == 1 && group.linear[0].1 == 1.0 {
            arena.intern(ExprKind::Var(group.linear[0].0))
        } else {
            arena.intern(ExprKind::Group(group))
        }
    } else {
        arena.intern(ExprKind::Quad(group, quad))
    };
    let (lb, ub) = bounds::bounds(arena, &arena.get(node).clone(), &[]);
    (node, lb, ub)
}

fn add_constant(arena: &mut NodeArena, node: NodeId, c: f64, lb: NodeId, ub: NodeId) -> (NodeId, NodeId, NodeId) {
    match arena.get(node).clone() {
        ExprKind::Const(v) => {
            let n = arena.intern(ExprKind::Const(v + c));
            (n, n, n)
        }
        ExprKind::Group(mut g) => {
            g.const0 += c;
            let n = arena.intern(ExprKind::Group(g));
            let (lb2, ub2) = bounds::bounds(arena, &arena.get(n).clone(), &[]);
            (n, lb2, ub2)
        }
        ExprKind::Quad(mut g, q) => {
            g.const0 += c;
            let n = arena.intern(ExprKind::Quad(g, q));
            let (lb2, ub2) = bounds::bounds(arena, &arena.get(n).clone(), &[]);
            (n, lb2, ub2)
        }
        ExprKind::Var(v) => {
            let g = GroupData { const0: c, linear: vec![(v, 1.0)], nonlinear: Vec::new() };
            let n = arena.intern(ExprKind::Group(g));
            let (lb2, ub2) = bounds::bounds(arena, &arena.get(n).clone(), &[]);
            (n, lb2, ub2)
        }
        _ => (node, lb, ub),
    }
}

fn add_quad_terms(arena: &mut NodeArena, node: NodeId, q: &[(VarIndex, VarIndex, f64)]) -> NodeId {
    if q.is_empty() {
        return node;
    }
    match arena.get(node).clone() {
        ExprKind::Quad(g, mut existing) => {
            existing.extend(q.iter().cloned());
            arena.intern(ExprKind::Quad(g, existing))
        }
        ExprKind::Group(g) => arena.intern(ExprKind::Quad(g, q.to_vec())),
        ExprKind::Const(v) => arena.intern(ExprKind::Quad(GroupData::constant(v), q.to_vec())),
        ExprKind::Var(v) => {
            let g = GroupData { const0: 0.0, linear: vec![(v, 1.0)], nonlinear: Vec::new() };
            arena.intern(ExprKind::Quad(g, q.to_vec()))
        }
        _ => node,
    }
}

/// `flattenMul`, per `spec.md` §4.D: splices nested `Mul` nodes, reduces a
/// single surviving factor, emits a `Quad` entry for exactly two, and for
/// three or more repeatedly interns an Aux for a pairwise sub-product until
/// two factors remain.
fn standardize_mul(
    arena: &mut NodeArena,
    vars: &mut VariableStore,
    deps: &mut DependencyGraph,
    raw_args: &[NodeId],
) -> (NodeId, NodeId, NodeId) {
    let mut flat = Vec::new();
    flatten_mul_syntactic(arena, raw_args, &mut flat);

    let mut coeff = 1.0;
    let mut units: Vec<VarIndex> = Vec::new();
    for a in flat {
        let (snode, lb, ub) = standardize(arena, vars, deps, a);
        match arena.get(snode).clone() {
            ExprKind::Const(v) => coeff *= v,
            ExprKind::Var(i) => units.push(i),
            _ => {
                let (idx, _, _) = force_aux(arena, vars, deps, snode, lb, ub, false);
                units.push(idx);
            }
        }
    }

    if units.is_empty() {
        let n = arena.intern(ExprKind::Const(coeff));
        return (n, n, n);
    }
    if units.len() == 1 {
        let v = units[0];
        if coeff == 1.0 {
            return var_triple(arena, v);
        }
        let g = GroupData { const0: 0.0, linear: vec![(v, coeff)], nonlinear: Vec::new() };
        let n = arena.intern(ExprKind::Group(g));
        let (lb, ub) = bounds::bounds(arena, &arena.get(n).clone(), &[]);
        return (n, lb, ub);
    }

    // Pairwise-reduce down to exactly two units, wrapping every
    // intermediate pairwise product in its own Aux (spec.md §4.D:
    // "standardize each sub-product and emit an Aux for the product of its
    // results"); the final pair becomes a Quad entry directly.
    while units.len() > 2 {
        let a = units.remove(0);
        let b = units.remove(0);
        let sub_quad = arena.intern(ExprKind::Quad(GroupData::constant(0.0), vec![(a, b, 1.0)]));
        let (lb, ub) = bounds::bounds(arena, &arena.get(sub_quad).clone(), &[]);
        let (idx, _, _) = force_aux(arena, vars, deps, sub_quad, lb, ub, false);
        units.push(idx);
    }
    let (a, b) = (units[0], units[1]);
    let n = arena.intern(ExprKind::Quad(GroupData::constant(0.0), vec![(a, b, coeff)]));
    let (lb, ub) = bounds::bounds(arena, &arena.get(n).clone(), &[]);
    (n, lb, ub)
}

fn flatten_mul_syntactic(arena: &NodeArena, args: &[NodeId], out: &mut Vec<NodeId>) {
    for a in args {
        let a = arena.resolve(*a);
        match arena.get(a) {
            ExprKind::Mul(inner) => flatten_mul_syntactic(arena, inner, out),
            _ => out.push(a),
        }
    }
}
