//! A tagged-index arena of [`ExprKind`] nodes. This is the realization
//! `spec.md` §9 prescribes in place of the source's owning-pointer-plus-
//! `Clone`-view scheme: every expression tree in a
//! [`crate::problem::Problem`] is stored in one `NodeArena`, and structural
//! deduplication (used both for Aux interning, `spec.md` §4.B, and for
//! folding syntactically identical non-Aux subtrees) falls out of hashing a
//! canonical key rather than comparing pointers.

use fxhash::FxHashMap;

use super::compare::structural_key;
use super::node::{ExprKind, NodeId};

/// Owns every expression node belonging to one [`crate::problem::Problem`].
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<ExprKind>,
    /// Structural interning table: maps a canonical key (see
    /// [`structural_key`]) to the first node allocated with that shape, so
    /// that e.g. two occurrences of the constant `2.0`, or two occurrences
    /// of `x + y` built in the same commutative order, fold to one node.
    interned: FxHashMap<String, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new(), interned: FxHashMap::default() }
    }

    /// Allocates `kind` as a brand new node, bypassing interning. Used by
    /// callers (e.g. differentiation) that know the result must not be
    /// aliased with an existing node because it will be mutated in place
    /// immediately afterwards — in practice this crate never mutates nodes
    /// in place, so `alloc` and [`NodeArena::intern`] differ only in
    /// whether they consult the interning table.
    pub fn alloc(&mut self, kind: ExprKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    /// Allocates `kind`, first canonicalizing commutative argument lists
    /// (per `spec.md` §9) and checking the interning table. Returns the
    /// existing node's id on a structural hit instead of allocating a
    /// duplicate.
    pub fn intern(&mut self, kind: ExprKind) -> NodeId {
        let canon = super::compare::canonicalize(&kind, &self.nodes);
        let key = structural_key(&canon, &self.nodes);
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = self.alloc(canon);
        self.interned.insert(key, id);
        id
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &ExprKind {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follows a chain of `Ref` nodes to the node it ultimately denotes.
    /// `Ref` is the only variant permitted to alias (invariant 6 of
    /// `spec.md` §3), so this is the one place the arena needs to "see
    /// through" an indirection.
    pub fn resolve(&self, mut id: NodeId) -> NodeId {
        while let ExprKind::Ref(target) = self.get(id) {
            id = *target;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::VarIndex;

    #[test]
    fn interning_folds_equal_constants() {
        let mut arena = NodeArena::new();
        let a = arena.intern(ExprKind::Const(2.0));
        let b = arena.intern(ExprKind::Const(2.0));
        assert_eq!(a, b);
        assert_eq!(1, arena.len());
    }

    #[test]
    fn interning_folds_commutative_sums_regardless_of_order() {
        let mut arena = NodeArena::new();
        let x = arena.alloc(ExprKind::Var(VarIndex(0)));
        let y = arena.alloc(ExprKind::Var(VarIndex(1)));
        let xy = arena.intern(ExprKind::Sum(vec![x, y]));
        let yx = arena.intern(ExprKind::Sum(vec![y, x]));
        assert_eq!(xy, yx);
    }

    #[test]
    fn distinct_shapes_get_distinct_ids() {
        let mut arena = NodeArena::new();
        let a = arena.intern(ExprKind::Const(2.0));
        let b = arena.intern(ExprKind::Const(3.0));
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_follows_ref_chains() {
        let mut arena = NodeArena::new();
        let c = arena.alloc(ExprKind::Const(1.0));
        let r1 = arena.alloc(ExprKind::Ref(c));
        let r2 = arena.alloc(ExprKind::Ref(r1));
        assert_eq!(c, arena.resolve(r2));
    }
}
