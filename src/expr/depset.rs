//! `fillDepSet`, per `spec.md` §4.A: "pushes the indices of all variables
//! this subtree depends on". Used by the dependency graph (component C)
//! when registering a new Aux, and walks iteratively for the same reason
//! [`crate::expr::eval::evaluate`] does — a standardized model can produce
//! very deep `Group`/`Sum` chains.

use fxhash::FxHashSet;

use crate::common::VarIndex;
use crate::expr::arena::NodeArena;
use crate::expr::node::{ExprKind, NodeId};

/// Appends every distinct `VarIndex` referenced anywhere in the subtree
/// rooted at `root` — via `Var`, `LowerBound`, or `UpperBound` — to `out`,
/// in first-visited order, without duplicates.
pub fn fill_dep_set(arena: &NodeArena, root: NodeId, out: &mut Vec<VarIndex>) {
    let mut seen: FxHashSet<VarIndex> = FxHashSet::default();
    let mut stack = vec![root];
    let mut visited_nodes: FxHashSet<NodeId> = FxHashSet::default();
    while let Some(id) = stack.pop() {
        let id = arena.resolve(id);
        if !visited_nodes.insert(id) {
            continue;
        }
        match arena.get(id) {
            ExprKind::Var(i) | ExprKind::LowerBound(i) | ExprKind::UpperBound(i) => {
                if seen.insert(*i) {
                    out.push(*i);
                }
            }
            ExprKind::Group(g) => {
                for (v, _) in &g.linear {
                    if seen.insert(*v) {
                        out.push(*v);
                    }
                }
                stack.extend(g.nonlinear.iter().copied());
            }
            ExprKind::Quad(g, q) => {
                for (v, _) in &g.linear {
                    if seen.insert(*v) {
                        out.push(*v);
                    }
                }
                for (i, j, _) in q {
                    if seen.insert(*i) {
                        out.push(*i);
                    }
                    if seen.insert(*j) {
                        out.push(*j);
                    }
                }
                stack.extend(g.nonlinear.iter().copied());
            }
            kind => stack.extend(kind.children()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_vars_from_sum() {
        let mut arena = NodeArena::new();
        let x = arena.intern(ExprKind::Var(VarIndex(0)));
        let y = arena.intern(ExprKind::Var(VarIndex(1)));
        let s = arena.intern(ExprKind::Sum(vec![x, y]));
        let mut out = Vec::new();
        fill_dep_set(&arena, s, &mut out);
        out.sort_by_key(|v| v.id());
        assert_eq!(vec![VarIndex(0), VarIndex(1)], out);
    }

    #[test]
    fn does_not_duplicate_repeated_references() {
        let mut arena = NodeArena::new();
        let x = arena.intern(ExprKind::Var(VarIndex(0)));
        let s = arena.intern(ExprKind::Sum(vec![x, x]));
        let mut out = Vec::new();
        fill_dep_set(&arena, s, &mut out);
        assert_eq!(vec![VarIndex(0)], out);
    }

    #[test]
    fn collects_vars_referenced_only_via_bounds() {
        let mut arena = NodeArena::new();
        let lb = arena.intern(ExprKind::LowerBound(VarIndex(3)));
        let mut out = Vec::new();
        fill_dep_set(&arena, lb, &mut out);
        assert_eq!(vec![VarIndex(3)], out);
    }

    #[test]
    fn collects_vars_from_group_linear_and_nonlinear_parts() {
        let mut arena = NodeArena::new();
        let w = arena.intern(ExprKind::Var(VarIndex(5)));
        let g = crate::expr::node::GroupData {
            const0: 0.0,
            linear: vec![(VarIndex(0), 2.0)],
            nonlinear: vec![w],
        };
        let node = arena.intern(ExprKind::Group(g));
        let mut out = Vec::new();
        fill_dep_set(&arena, node, &mut out);
        out.sort_by_key(|v| v.id());
        assert_eq!(vec![VarIndex(0), VarIndex(5)], out);
    }
}
