//! lg-components: component library for planar mechanisms.
//!
//! Provides the building blocks of a mechanism tree:
//! - Anchors, fixed or driven along a prescribed trajectory
//! - Tracks (lines, circles, parametric curves) for sliding masses
//! - Point masses, sliding masses, rotating links and elastic links
//!
//! Each variant knows how to express its position and energies symbolically
//! given where it is attached. Walking the tree and resolving attachments is
//! the job of `lg-tree`.
//!
//! # Example
//!
//! ```
//! use lg_components::{Placement, RotatingLink, Spatial, SymPoint};
//! use lg_core::units::m;
//! use lg_symbolic::ExprGraph;
//!
//! let mut g = ExprGraph::new();
//! let phi = g.coord(0, 0);
//! let coords = [phi];
//! let place = Placement {
//!     attach: SymPoint::origin(&mut g),
//!     endpoint: None,
//!     time: g.time(),
//!     coords: &coords,
//! };
//!
//! let rod = RotatingLink::new(m(1.0)).with_initial(0.5, 0.0);
//! let tip = rod.position(&mut g, &place);
//! assert!(g.depends_on(tip.x, phi));
//! ```

pub mod anchor;
pub mod body;
pub mod common;
pub mod drive;
pub mod error;
pub mod geometry;
pub mod path;
pub mod point;
pub mod rod;
pub mod slider;
pub mod spring;
pub mod traits;

// Re-exports
pub use anchor::Anchor;
pub use body::Body;
pub use drive::{Drive, TimeFn, Trajectory};
pub use error::{ComponentError, ComponentResult};
pub use geometry::{Attachment, Placement, SymPoint};
pub use path::{CurveFn, PathConstraint, PathShape};
pub use point::MassPoint;
pub use rod::RotatingLink;
pub use slider::SlidingMass;
pub use spring::{ElasticLink, ElasticMode};
pub use traits::{Dynamic, Energetic, Spatial};
