//! The variable & auxiliary store, component B of `spec.md` §4.B: one flat
//! vector of [`Variable`]s — originals first, then auxiliaries in creation
//! order — plus structural interning of auxiliaries by their `image`.
//!
//! `spec.md` §4.B says interning looks an image up "in a set keyed by
//! structural equality (via the `compare` operator)". Because every image
//! passed in here has already gone through
//! [`crate::expr::arena::NodeArena::intern`] before reaching this store,
//! two structurally-equal images are already the same [`NodeId`] (see the
//! inductive argument in `crate::expr::compare`'s module doc comment), so
//! the interning set collapses to a plain `NodeId -> VarIndex` map instead
//! of needing its own comparator.

use fxhash::FxHashMap;

use crate::common::VarIndex;
use crate::expr::node::NodeId;

/// Distinguishes an original problem variable from a standardization-
/// introduced auxiliary. Only `Aux` carries an `image`; `spec.md` §4.B's
/// other per-variable fields (`lb/ub` expressions, `isInteger`,
/// `multiplicity`) live on [`Variable`] itself because originals have them
/// too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarKind {
    Original,
    Aux { image: NodeId },
}

/// One entry of the flat variable vector.
#[derive(Clone, Debug)]
pub struct Variable {
    pub index: VarIndex,
    pub kind: VarKind,
    /// Symbolic lower bound expression, evaluated once at standardization
    /// time and re-evaluated on every forward-propagation pass
    /// (`spec.md` §4.D, §4.E).
    pub lb_expr: NodeId,
    pub ub_expr: NodeId,
    pub is_integer: bool,
    /// `spec.md` §4.B: number of distinct references to this Aux in the
    /// problem. Always `1` for an original (the count is meaningless there,
    /// but kept uniform rather than wrapped in an `Option`).
    pub multiplicity: usize,
    /// `rank` of `spec.md` §3's `Aux` variant: `1` for every original, `1 +
    /// max(rank(deps))` for an aux, set by
    /// [`VariableStore::set_rank`] once the dependency graph (component C)
    /// has computed a topological order. `0` until then.
    pub rank: usize,
    /// `(NEW)` diagnostics-only label supplied by the external loader;
    /// never consulted by any algorithm in this crate.
    pub name: Option<String>,
}

impl Variable {
    pub fn is_aux(&self) -> bool {
        matches!(self.kind, VarKind::Aux { .. })
    }

    pub fn image(&self) -> Option<NodeId> {
        match self.kind {
            VarKind::Aux { image } => Some(image),
            VarKind::Original => None,
        }
    }
}

/// Owns every [`Variable`] belonging to one [`crate::problem::Problem`].
#[derive(Debug, Default)]
pub struct VariableStore {
    vars: Vec<Variable>,
    aux_by_image: FxHashMap<NodeId, VarIndex>,
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore { vars: Vec::new(), aux_by_image: FxHashMap::default() }
    }

    /// Registers a new original variable and returns its index.
    pub fn insert_original(
        &mut self,
        lb_expr: NodeId,
        ub_expr: NodeId,
        is_integer: bool,
        name: Option<String>,
    ) -> VarIndex {
        let index = VarIndex(self.vars.len());
        self.vars.push(Variable {
            index,
            kind: VarKind::Original,
            lb_expr,
            ub_expr,
            is_integer,
            multiplicity: 1,
            rank: 1,
            name,
        });
        index
    }

    /// Interns an auxiliary for `image`: on a structural hit (same
    /// `NodeId`, per the module doc comment), increments the existing
    /// Aux's multiplicity and returns its index; otherwise allocates a new
    /// one with `multiplicity == 1`.
    pub fn intern_aux(
        &mut self,
        image: NodeId,
        lb_expr: NodeId,
        ub_expr: NodeId,
        is_integer: bool,
    ) -> VarIndex {
        if let Some(&existing) = self.aux_by_image.get(&image) {
            self.vars[existing.id()].multiplicity += 1;
            return existing;
        }
        let index = VarIndex(self.vars.len());
        self.vars.push(Variable {
            index,
            kind: VarKind::Aux { image },
            lb_expr,
            ub_expr,
            is_integer,
            multiplicity: 1,
            rank: 0,
            name: None,
        });
        self.aux_by_image.insert(image, index);
        index
    }

    pub fn get(&self, i: VarIndex) -> &Variable {
        &self.vars[i.id()]
    }

    pub fn get_mut(&mut self, i: VarIndex) -> &mut Variable {
        &mut self.vars[i.id()]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn set_rank(&mut self, i: VarIndex, rank: usize) {
        self.vars[i.id()].rank = rank;
    }

    pub fn rank(&self, i: VarIndex) -> usize {
        self.vars[i.id()].rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_gets_sequential_index_and_rank_one() {
        let mut store = VariableStore::new();
        let a = store.insert_original(NodeId(0), NodeId(1), false, None);
        let b = store.insert_original(NodeId(2), NodeId(3), true, Some("y".into()));
        assert_eq!(VarIndex(0), a);
        assert_eq!(VarIndex(1), b);
        assert_eq!(1, store.get(a).rank);
        assert!(store.get(b).is_integer);
        assert_eq!(Some("y".to_string()), store.get(b).name.clone());
    }

    #[test]
    fn interning_same_image_increments_multiplicity_not_count() {
        let mut store = VariableStore::new();
        let img = NodeId(42);
        let a = store.intern_aux(img, NodeId(0), NodeId(1), false);
        let b = store.intern_aux(img, NodeId(0), NodeId(1), false);
        assert_eq!(a, b);
        assert_eq!(2, store.get(a).multiplicity);
        assert_eq!(1, store.len());
    }

    #[test]
    fn distinct_images_get_distinct_auxs() {
        let mut store = VariableStore::new();
        let a = store.intern_aux(NodeId(1), NodeId(0), NodeId(0), false);
        let b = store.intern_aux(NodeId(2), NodeId(0), NodeId(0), false);
        assert_ne!(a, b);
        assert_eq!(2, store.len());
    }

    #[test]
    fn aux_reports_its_image_original_does_not() {
        let mut store = VariableStore::new();
        let orig = store.insert_original(NodeId(0), NodeId(0), false, None);
        let aux = store.intern_aux(NodeId(5), NodeId(0), NodeId(0), false);
        assert_eq!(None, store.get(orig).image());
        assert_eq!(Some(NodeId(5)), store.get(aux).image());
    }
}
