//! lg-symbolic: the symbolic algebra engine behind the mechanics pipeline.
//!
//! Provides:
//! - A hash-consed expression DAG (`ExprGraph`) with canonicalizing constructors
//! - Time-dependent coordinate functions `q_i^(k)(t)` as first-class atoms
//! - Partial and total time differentiation
//! - Substitution, direct evaluation and best-effort simplification
//! - Solving systems that are affine in a set of unknowns
//! - Compilation of expressions into flat numeric tapes
//!
//! # Example
//!
//! ```
//! use lg_symbolic::ExprGraph;
//!
//! let mut g = ExprGraph::new();
//! let q = g.coord(0, 0);
//! let s = g.sin(q);
//! let ds = g.diff_time(s);
//!
//! // d/dt sin(q(t)) = cos(q(t)) * q'(t)
//! let dq = g.coord(0, 1);
//! let c = g.cos(q);
//! let expected = g.mul(c, dq);
//! assert_eq!(ds, expected);
//! ```

pub mod calculus;
pub mod compile;
pub mod display;
pub mod error;
pub mod expr;
pub mod simplify;
pub mod solve;
pub mod subst;

pub use compile::CompiledFn;
pub use display::ExprDisplay;
pub use error::{SymbolicError, SymbolicResult};
pub use expr::{Constant, DEFAULT_MAX_NODES, ExprGraph, ExprId, Node};
pub use simplify::Simplified;
pub use solve::LinearSolution;
