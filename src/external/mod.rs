//! External interfaces of `spec.md` §6: the LP/NLP solver seams this crate
//! consumes but never implements, plus the cutoff/branching-context types of
//! `spec.md` §5. Grounded on the teacher's own split between a solver-
//! agnostic search core and pluggable, independently swappable heuristics:
//! this crate plays the "core" role, a host application supplies the
//! concrete LP/NLP backend (e.g. via FFI to Cbc/Clp/Ipopt, as
//! `monistowl-gat`'s `gat-clp`/`gat-ipopt` crates do).

pub mod bb;
pub mod lp;
pub mod nlp;

pub use bb::{BranchingInformation, Cutoff, NoCutoff, TimeBudget};
pub use lp::{LpSolver, LpStatus, ObjSense};
pub use nlp::{NlpSolver, NlpStatus};
