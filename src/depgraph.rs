//! The dependency graph, component C of `spec.md` §4.C: a mapping from a
//! variable's index to the indices it directly depends on, plus the
//! reverse adjacency ("which auxs mention me"), and a DFS-based
//! `createOrder()` that produces the topological order every forward/
//! backward pass in the bound engine relies on.

use crate::common::VarIndex;
use crate::error::{Result, SolverError};

#[derive(Clone, Copy, Eq, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Owns the dependency edges for every variable in a
/// [`crate::problem::Problem`], indexed by `VarIndex`.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// `deps[i]` is the set of variables `i` directly depends on (empty for
    /// an original).
    deps: Vec<Vec<VarIndex>>,
    /// `dependents[i]` is the set of auxs whose image directly mentions
    /// `i` — the reverse of `deps`, populated incrementally by
    /// [`DependencyGraph::insert_aux`].
    dependents: Vec<Vec<VarIndex>>,
    /// `numbering_`: topological order, rank -> index, filled by
    /// [`DependencyGraph::create_order`].
    numbering: Vec<VarIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph { deps: Vec::new(), dependents: Vec::new(), numbering: Vec::new() }
    }

    /// Registers an original variable: `spec.md` §4.C "insert(var)" — empty
    /// deps. Must be called with indices assigned in the same order as
    /// [`crate::variable::VariableStore::insert_original`].
    pub fn insert_var(&mut self) {
        self.deps.push(Vec::new());
        self.dependents.push(Vec::new());
    }

    /// Registers an aux with an already-computed dependency set (the
    /// result of walking its image with `fillDepSet`, `spec.md` §4.A).
    /// Must be called with indices assigned in the same order as
    /// [`crate::variable::VariableStore::intern_aux`].
    pub fn insert_aux(&mut self, deps: Vec<VarIndex>) {
        let me = VarIndex(self.deps.len());
        for &d in &deps {
            self.dependents[d.id()].push(me);
        }
        self.deps.push(deps);
        self.dependents.push(Vec::new());
    }

    pub fn lookup(&self, index: VarIndex) -> &[VarIndex] {
        &self.deps[index.id()]
    }

    pub fn dependents_of(&self, index: VarIndex) -> &[VarIndex] {
        &self.dependents[index.id()]
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// DFS-based topological order over the dependency DAG, per
    /// `spec.md` §4.C. Returns `SolverError::CycleInDependencies` — a fatal
    /// error, `spec.md` §7 — the moment a vertex is revisited while still
    /// on the current DFS stack.
    pub fn create_order(&mut self) -> Result<&[VarIndex]> {
        let n = self.deps.len();
        let mut mark = vec![Mark::Unvisited; n];
        let mut order = Vec::with_capacity(n);
        for start in 0..n {
            if mark[start] == Mark::Unvisited {
                self.visit(VarIndex(start), &mut mark, &mut order)?;
            }
        }
        self.numbering = order;
        Ok(&self.numbering)
    }

    fn visit(&self, i: VarIndex, mark: &mut [Mark], order: &mut Vec<VarIndex>) -> Result<()> {
        mark[i.id()] = Mark::OnStack;
        for &d in &self.deps[i.id()] {
            match mark[d.id()] {
                Mark::Unvisited => self.visit(d, mark, order)?,
                Mark::OnStack => return Err(SolverError::CycleInDependencies { var: d }),
                Mark::Done => {}
            }
        }
        mark[i.id()] = Mark::Done;
        order.push(i);
        Ok(())
    }

    /// The topological order computed by the most recent
    /// [`DependencyGraph::create_order`] call: dependencies always precede
    /// dependents.
    pub fn order(&self) -> &[VarIndex] {
        &self.numbering
    }
}
