//! lg-core: stable foundation for the mechanism workspace.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + finiteness and sign checks)
//! - ids (compact IDs for registry objects)
//! - error (shared error types)
//! - timing (phase timers for the derivation pipeline)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{LgError, LgResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
