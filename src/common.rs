//! This module defines the most basic data types that are used throughout all
//! the code of this crate (both at the abstraction and implementation levels).
//! These are also the types a client of this library is likely to work with
//! directly: variable indices, linearity classes and the numeric tolerances
//! that show up in almost every bound comparison.

/// Identifies a variable (original or auxiliary) by its position in the flat
/// variable vector owned by a [`crate::problem::Problem`]. Originals occupy
/// the low indices in creation order; auxiliaries are appended afterwards,
/// also in creation order.
///
/// # Examples
/// ```
/// # use minlp_core::VarIndex;
/// assert_eq!(0, VarIndex(0).id());
/// assert_eq!(3, VarIndex(3).id());
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VarIndex(pub usize);

impl VarIndex {
    #[inline]
    /// Returns the numeric id of this variable.
    pub fn id(self) -> usize {
        self.0
    }
}

impl From<usize> for VarIndex {
    fn from(v: usize) -> Self {
        VarIndex(v)
    }
}

/// One of the five linearity classes an expression subtree can belong to, in
/// increasing order of generality. Used to decide whether standardization may
/// fold a subtree into the linear part of a [`crate::expr::node::ExprKind::Group`]
/// or must instead emit an auxiliary.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Linearity {
    /// The identically-zero expression.
    Zero,
    /// A numeric constant (possibly zero, but tagged `Constant` once folded).
    Constant,
    /// An affine combination of variables.
    Linear,
    /// A sum of at most quadratic monomials.
    Quadratic,
    /// Anything else.
    Nonlinear,
}

impl Linearity {
    /// Combines two linearity classes the way addition does: the result is
    /// never more restrictive than either operand.
    pub fn join(self, other: Linearity) -> Linearity {
        self.max(other)
    }
}

/// Absolute tolerance below which a bound gap, a reduced cost or a cut
/// violation is treated as zero. Mirrors the single `ε` referenced throughout
/// `spec.md`; individual components may override it via
/// [`crate::config::SolverConfig`].
pub const DEFAULT_EPS: f64 = 1e-7;

/// Maximum number of forward/backward bound-tightening iterations performed
/// per call, per `spec.md` §4.E.
pub const MAX_BT_ITER: usize = 10;
