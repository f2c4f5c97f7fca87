//! lg-solver: from a set-up mechanism to compiled equations of motion.
//!
//! Provides:
//! - Lagrangian assembly (`assemble`)
//! - Euler-Lagrange residuals with coordinate substitution (`derive`)
//! - Explicit accelerations by symbolic elimination (`solve_accelerations`)
//! - Numeric evaluators for the state derivative, energy and positions
//! - Newton and finite difference Jacobian kernels for implicit steppers

pub mod accel;
pub mod compile;
pub mod derive;
pub mod error;
pub mod jacobian;
pub mod lagrangian;
pub mod newton;

pub use accel::{Accelerations, solve_accelerations};
pub use compile::{CompiledSystem, compile_system, input_atoms};
pub use derive::{Equations, derive};
pub use error::{SolverError, SolverResult};
pub use jacobian::finite_difference_jacobian;
pub use lagrangian::{Lagrangian, assemble};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
