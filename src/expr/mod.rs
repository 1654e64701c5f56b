//! The expression DAG: component A of `spec.md` §2, "the literal
//! representation of every nonlinear expression in the problem, its
//! simplification, [and] reformulation into a system of equality-defined
//! auxiliary variables during standardization".

pub mod arena;
pub mod bounds;
pub mod compare;
pub mod depset;
pub mod diff;
pub mod eval;
pub mod linearity;
pub mod node;
pub mod print;
pub mod simplify;

pub use arena::NodeArena;
pub use node::{ExprCode, ExprKind, GroupData, NodeId};
