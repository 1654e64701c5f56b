// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # minlp-core
//!
//! The core of a spatial branch-and-bound solver for non-convex mixed-
//! integer nonlinear programs: an expression DAG with structural interning
//! ([`expr`]), standardization into a system of auxiliary-defined variables
//! ([`standardize`], [`variable`], [`depgraph`]), symbolic bound
//! construction with procedural fallback for periodic operators
//! ([`expr::bounds`], [`periodic`]), forward/backward bound tightening
//! ([`bounds_engine`]), optimality-based bound tightening ([`obbt`]),
//! McCormick/secant convexification ([`convexify`]), two-way spatial
//! branching ([`branching`]), a rounding heuristic ([`heuristic`]), and the
//! external LP/NLP/branch-and-bound-runtime seams a concrete solver plugs
//! into ([`external`]).
//!
//! This crate does not ship an LP or NLP solver, nor a branch-and-bound
//! driver loop: it provides the reformulation and relaxation machinery a
//! driver composes against the traits in [`external`].

pub mod branching;
pub mod common;
pub mod config;
pub mod convexify;
pub mod depgraph;
pub mod domain;
pub mod error;
pub mod expr;
pub mod external;
pub mod heuristic;
pub mod obbt;
pub mod periodic;
pub mod problem;
pub mod standardize;
pub mod bounds_engine;
pub mod variable;

pub use common::VarIndex;
pub use config::SolverConfig;
pub use error::{Result, SolverError};
pub use problem::Problem;
