//! The expression node variants of `spec.md` §3. Every node lives in a
//! [`crate::expr::arena::NodeArena`] and refers to its children by
//! [`NodeId`] rather than by owning pointer, which is how this crate
//! realizes the "tagged index into an arena" design mandated by `spec.md`
//! §9 in place of the source's owning-pointer-plus-`Clone`-view scheme.
//!
//! `Aux`, the sixth variant `spec.md` §3 lists, is deliberately not a case
//! of [`ExprKind`] here: its payload (`image`, symbolic `lb`/`ub`, `rank`,
//! `mult`) is per-*variable* metadata, not an evaluable subexpression, so it
//! lives on [`crate::variable::Aux`] (component B) instead. A reference to
//! an auxiliary from inside an expression tree is just `ExprKind::Var`, the
//! same as a reference to an original.

use crate::common::VarIndex;

/// A stable index into a [`crate::expr::arena::NodeArena`]. Copy, small, and
/// totally ordered, so it can be used as a hash map key for structural
/// interning without indirection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The linear-plus-nonlinear-residual shape produced by standardizing a
/// `Sum`/`Sub`/`Group` per `spec.md` §4.D: a constant, an affine combination
/// of variables, and a list of nonlinear summands (themselves `Var`
/// references to interned auxiliaries once standardization has run).
#[derive(Clone, Debug, PartialEq)]
pub struct GroupData {
    /// The constant term `c0`.
    pub const0: f64,
    /// The affine part `Σ a_i x_i`, sorted by `VarIndex` so two
    /// structurally-equal groups compare equal regardless of build order.
    pub linear: Vec<(VarIndex, f64)>,
    /// Nonlinear summands, each itself a (typically `Var`) subtree.
    pub nonlinear: Vec<NodeId>,
}

impl GroupData {
    pub fn constant(c: f64) -> Self {
        GroupData { const0: c, linear: Vec::new(), nonlinear: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.const0 == 0.0 && self.linear.is_empty() && self.nonlinear.is_empty()
    }
}

/// The closed set of expression node variants from `spec.md` §3.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A numeric literal.
    Const(f64),
    /// An original or auxiliary variable, referenced by index.
    Var(VarIndex),
    /// A symbolic reference to the current numeric lower bound of a
    /// variable; used only inside bound expressions (`spec.md` §4.A
    /// "Bounds").
    LowerBound(VarIndex),
    /// A symbolic reference to the current numeric upper bound of a
    /// variable.
    UpperBound(VarIndex),
    /// Unary negation.
    Opp(NodeId),
    /// Absolute value.
    Abs(NodeId),
    /// Natural exponential.
    Exp(NodeId),
    /// Natural logarithm.
    Log(NodeId),
    /// Sine.
    Sin(NodeId),
    /// Cosine.
    Cos(NodeId),
    /// n-ary sum, `n >= 2`.
    Sum(Vec<NodeId>),
    /// Binary subtraction `a - b`.
    Sub(NodeId, NodeId),
    /// n-ary product, `n >= 2`.
    Mul(Vec<NodeId>),
    /// Binary division `a / b`.
    Div(NodeId, NodeId),
    /// Binary power `a ^ b`.
    Pow(NodeId, NodeId),
    /// n-ary minimum, used chiefly to build `Min`/`Max` bound expressions.
    Min(Vec<NodeId>),
    /// n-ary maximum.
    Max(Vec<NodeId>),
    /// `c0 + Σ a_i x_i + Σ nonlinear args`, the standardized linear-plus-
    /// residual shape of `spec.md` §3.
    Group(GroupData),
    /// `Group` plus `Σ q_ij x_i x_j`, for bodies that standardize to exactly
    /// quadratic (two-factor products and `x^2`).
    Quad(GroupData, Vec<(VarIndex, VarIndex, f64)>),
    /// A non-owning reference to another node in the same arena: the arena
    /// realization of `spec.md`'s `Clone` variant (see `spec.md` §9).
    Ref(NodeId),
}

/// A compact structural tag used by [`crate::expr::compare::compare`] to
/// order nodes by operator before recursing into children, per `spec.md`
/// §4.A "Compare".
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ExprCode {
    Const,
    Var,
    LowerBound,
    UpperBound,
    Opp,
    Abs,
    Exp,
    Log,
    Sin,
    Cos,
    Sum,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
    Group,
    Quad,
    Ref,
}

impl ExprKind {
    /// The stable operator tag of this node, per invariant 1 of `spec.md`
    /// §3.
    pub fn code(&self) -> ExprCode {
        match self {
            ExprKind::Const(_) => ExprCode::Const,
            ExprKind::Var(_) => ExprCode::Var,
            ExprKind::LowerBound(_) => ExprCode::LowerBound,
            ExprKind::UpperBound(_) => ExprCode::UpperBound,
            ExprKind::Opp(_) => ExprCode::Opp,
            ExprKind::Abs(_) => ExprCode::Abs,
            ExprKind::Exp(_) => ExprCode::Exp,
            ExprKind::Log(_) => ExprCode::Log,
            ExprKind::Sin(_) => ExprCode::Sin,
            ExprKind::Cos(_) => ExprCode::Cos,
            ExprKind::Sum(_) => ExprCode::Sum,
            ExprKind::Sub(_, _) => ExprCode::Sub,
            ExprKind::Mul(_) => ExprCode::Mul,
            ExprKind::Div(_, _) => ExprCode::Div,
            ExprKind::Pow(_, _) => ExprCode::Pow,
            ExprKind::Min(_) => ExprCode::Min,
            ExprKind::Max(_) => ExprCode::Max,
            ExprKind::Group(_) => ExprCode::Group,
            ExprKind::Quad(_, _) => ExprCode::Quad,
            ExprKind::Ref(_) => ExprCode::Ref,
        }
    }

    /// Direct children of this node, in evaluation order. Does not recurse
    /// into `Group`/`Quad`'s nonlinear list's own children.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            ExprKind::Const(_)
            | ExprKind::Var(_)
            | ExprKind::LowerBound(_)
            | ExprKind::UpperBound(_) => Vec::new(),
            ExprKind::Opp(a) | ExprKind::Abs(a) | ExprKind::Exp(a) | ExprKind::Log(a)
            | ExprKind::Sin(a) | ExprKind::Cos(a) | ExprKind::Ref(a) => vec![*a],
            ExprKind::Sum(args) | ExprKind::Mul(args) | ExprKind::Min(args) | ExprKind::Max(args) => {
                args.clone()
            }
            ExprKind::Sub(a, b) | ExprKind::Div(a, b) | ExprKind::Pow(a, b) => vec![*a, *b],
            ExprKind::Group(g) => g.nonlinear.clone(),
            ExprKind::Quad(g, _) => g.nonlinear.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_stable_across_payload_changes() {
        assert_eq!(ExprCode::Const, ExprKind::Const(1.0).code());
        assert_eq!(ExprCode::Const, ExprKind::Const(-5.0).code());
    }

    #[test]
    fn children_of_leaf_nodes_is_empty() {
        assert!(ExprKind::Const(1.0).children().is_empty());
        assert!(ExprKind::Var(VarIndex(0)).children().is_empty());
    }

    #[test]
    fn children_of_binary_nodes_preserves_order() {
        let kids = ExprKind::Sub(NodeId(3), NodeId(7)).children();
        assert_eq!(vec![NodeId(3), NodeId(7)], kids);
    }
}
