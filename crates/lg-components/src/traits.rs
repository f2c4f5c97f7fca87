//! Capability traits implemented by the component variants.
//!
//! Every variant is spatial. Variants carrying mass or elastic energy are
//! energetic, and variants that own generalized coordinates are dynamic.
//! [`crate::Body`] dispatches over them.

use lg_symbolic::{ExprGraph, ExprId};

use crate::error::ComponentResult;
use crate::geometry::{Attachment, Placement, SymPoint};

pub trait Spatial {
    /// How this component is attached to its parent.
    fn attachment(&self) -> Attachment {
        Attachment::Position
    }

    /// Global position of the point at parameter `local` along this component.
    fn local_to_global(&self, g: &mut ExprGraph, place: &Placement<'_>, local: ExprId) -> SymPoint;

    /// The component's own position, where children attach by default.
    fn position(&self, g: &mut ExprGraph, place: &Placement<'_>) -> SymPoint {
        let one = g.one();
        self.local_to_global(g, place, one)
    }
}

pub trait Energetic {
    /// Kinetic energy given the velocity of the component's position.
    fn kinetic(&self, g: &mut ExprGraph, _velocity: SymPoint) -> ExprId {
        g.zero()
    }

    /// Potential energy; `gravity` is the magnitude of downward acceleration.
    fn potential(
        &self,
        g: &mut ExprGraph,
        _place: &Placement<'_>,
        _position: SymPoint,
        _gravity: ExprId,
    ) -> ExprId {
        g.zero()
    }
}

pub trait Dynamic {
    /// Number of generalized coordinates owned by this component.
    fn dof(&self) -> usize;

    /// Short names of the coordinates, in local order.
    fn coordinate_names(&self) -> &'static [&'static str];

    /// Initial `(position, velocity)` pairs, interleaved, length `2 * dof()`.
    fn initial_state(&self) -> Vec<f64>;

    /// Linear damping coefficient for local coordinate `local`.
    fn damping(&self, _local: usize) -> f64 {
        0.0
    }

    /// Current `(position, velocity)` pairs, interleaved.
    fn state(&self) -> Vec<f64>;

    /// Store the latest integrated `(position, velocity)` pairs.
    fn update(&mut self, state: &[f64]) -> ComponentResult<()>;
}
