//! Fixed or externally driven anchor points.

use lg_symbolic::{ExprGraph, ExprId};

use crate::drive::Trajectory;
use crate::error::ComponentResult;
use crate::geometry::{Placement, SymPoint};
use crate::traits::Spatial;

/// A point whose motion is prescribed. Never owns a coordinate.
#[derive(Debug, Clone, Default)]
pub struct Anchor {
    pub trajectory: Trajectory,
}

impl Anchor {
    pub fn fixed(x: f64, y: f64) -> Self {
        Self {
            trajectory: Trajectory::fixed(x, y),
        }
    }

    pub fn driven(trajectory: Trajectory) -> Self {
        Self { trajectory }
    }

    pub fn is_driven(&self) -> bool {
        self.trajectory.is_driven()
    }

    pub fn validate(&self) -> ComponentResult<()> {
        self.trajectory.validate()
    }
}

impl Spatial for Anchor {
    fn local_to_global(
        &self,
        g: &mut ExprGraph,
        place: &Placement<'_>,
        _local: ExprId,
    ) -> SymPoint {
        self.position(g, place)
    }

    fn position(&self, g: &mut ExprGraph, place: &Placement<'_>) -> SymPoint {
        let own = self.trajectory.point(g, place.time);
        place.attach.offset(g, own.x, own.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::Drive;

    #[test]
    fn driven_anchor_depends_on_time() {
        let mut g = ExprGraph::new();
        let t = g.time();
        let origin = SymPoint::origin(&mut g);
        let anchor = Anchor::driven(Trajectory::new(Drive::harmonic(0.3, 10.0), Drive::Fixed(0.0)));
        let place = Placement {
            attach: origin,
            endpoint: None,
            time: t,
            coords: &[],
        };
        let p = anchor.position(&mut g, &place);
        assert!(g.depends_on(p.x, t));
        assert!(g.is_zero(p.y));
        assert!(anchor.is_driven());
    }
}
