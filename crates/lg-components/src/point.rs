//! Point masses rigidly attached along their parent.

use lg_core::units::{Mass, kg};
use lg_symbolic::{ExprGraph, ExprId};

use crate::common::{check_finite, check_positive};
use crate::error::ComponentResult;
use crate::geometry::{Attachment, Placement, SymPoint};
use crate::traits::{Energetic, Spatial};

/// Kinetic energy `½ m |v|²` of a point of mass `mass`.
pub(crate) fn point_kinetic(g: &mut ExprGraph, mass: f64, velocity: SymPoint) -> ExprId {
    let v2 = velocity.norm_sq(g);
    g.scale(0.5 * mass, v2)
}

/// Gravitational potential `m g y`.
pub(
    crate) fn point_potential(g: &mut ExprGraph,
    mass: f64,
    position: SymPoint,
    gravity: ExprId,
) -> ExprId {
    let gy = g.mul(gravity, position.y);
    g.scale(mass, gy)
}

/// A point mass sitting at parameter `local` of its parent. Owns no coordinate.
#[derive(Debug, Clone)]
pub struct MassPoint {
    pub mass: Mass,
    /// Parameter along the parent; 1 is the tip of a link.
    pub local: f64,
}

impl Default for MassPoint {
    fn default() -> Self {
        Self {
            mass: kg(1.0),
            local: 1.0,
        }
    }
}

impl MassPoint {
    pub fn new(mass: Mass) -> Self {
        Self { mass, local: 1.0 }
    }

    pub fn with_local(mut self, local: f64) -> Self {
        self.local = local;
        self
    }

    pub fn validate(&self) -> ComponentResult<()> {
        check_positive(self.mass.value, "point mass")?;
        check_finite(self.local, "point local parameter")
    }
}

impl Spatial for MassPoint {
    fn attachment(&self) -> Attachment {
        Attachment::Along(self.local)
    }

    fn local_to_global(
        &self,
        _g: &mut ExprGraph,
        place: &Placement<'_>,
        _local: ExprId,
    ) -> SymPoint {
        place.attach
    }

    fn position(&self, _g: &mut ExprGraph, place: &Placement<'_>) -> SymPoint {
        place.attach
    }
}

impl Energetic for MassPoint {
    fn kinetic(&self, g: &mut ExprGraph, velocity: SymPoint) -> ExprId {
        point_kinetic(g, self.mass.value, velocity)
    }

    fn potential(
        &self,
        g: &mut ExprGraph,
        _place: &Placement<'_>,
        position: SymPoint,
        gravity: ExprId,
    ) -> ExprId {
        point_potential(g, self.mass.value, position, gravity)
    }
}
