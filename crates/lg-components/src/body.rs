//! Tagged dispatch over the fixed set of component variants.

use lg_core::CompId;
use lg_symbolic::{ExprGraph, ExprId};

use crate::anchor::Anchor;
use crate::error::ComponentResult;
use crate::geometry::{Attachment, Placement, SymPoint};
use crate::path::PathConstraint;
use crate::point::MassPoint;
use crate::rod::RotatingLink;
use crate::slider::SlidingMass;
use crate::spring::ElasticLink;
use crate::traits::{Dynamic, Energetic, Spatial};

#[derive(Debug, Clone)]
pub enum Body {
    Anchor(Anchor),
    Path(PathConstraint),
    Point(MassPoint),
    Slider(SlidingMass),
    Rod(RotatingLink),
    Spring(ElasticLink),
}

impl From<Anchor> for Body {
    fn from(v: Anchor) -> Self {
        Body::Anchor(v)
    }
}

impl From<PathConstraint> for Body {
    fn from(v: PathConstraint) -> Self {
        Body::Path(v)
    }
}

impl From<MassPoint> for Body {
    fn from(v: MassPoint) -> Self {
        Body::Point(v)
    }
}

impl From<SlidingMass> for Body {
    fn from(v: SlidingMass) -> Self {
        Body::Slider(v)
    }
}

impl From<RotatingLink> for Body {
    fn from(v: RotatingLink) -> Self {
        Body::Rod(v)
    }
}

impl From<ElasticLink> for Body {
    fn from(v: ElasticLink) -> Self {
        Body::Spring(v)
    }
}

impl Body {
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Anchor(_) => "anchor",
            Body::Path(_) => "path",
            Body::Point(_) => "point",
            Body::Slider(_) => "slider",
            Body::Rod(_) => "rod",
            Body::Spring(_) => "spring",
        }
    }

    fn spatial(&self) -> &dyn Spatial {
        match self {
            Body::Anchor(v) => v,
            Body::Path(v) => v,
            Body::Point(v) => v,
            Body::Slider(v) => v,
            Body::Rod(v) => v,
            Body::Spring(v) => v,
        }
    }

    fn energetic(&self) -> Option<&dyn Energetic> {
        match self {
            Body::Point(v) => Some(v),
            Body::Slider(v) => Some(v),
            Body::Spring(v) => Some(v),
            Body::Rod(v) => Some(v),
            Body::Anchor(_) | Body::Path(_) => None,
        }
    }

    pub fn dynamic(&self) -> Option<&dyn Dynamic> {
        match self {
            Body::Slider(v) => Some(v),
            Body::Rod(v) => Some(v),
            Body::Spring(v) => Some(v),
            Body::Anchor(_) | Body::Path(_) | Body::Point(_) => None,
        }
    }

    pub fn dynamic_mut(&mut self) -> Option<&mut dyn Dynamic> {
        match self {
            Body::Slider(v) => Some(v),
            Body::Rod(v) => Some(v),
            Body::Spring(v) => Some(v),
            Body::Anchor(_) | Body::Path(_) | Body::Point(_) => None,
        }
    }

    pub fn attachment(&self) -> Attachment {
        self.spatial().attachment()
    }

    pub fn local_to_global(
        &self,
        g: &mut ExprGraph,
        place: &Placement<'_>,
        local: ExprId,
    ) -> SymPoint {
        self.spatial().local_to_global(g, place, local)
    }

    pub fn position(&self, g: &mut ExprGraph, place: &Placement<'_>) -> SymPoint {
        self.spatial().position(g, place)
    }

    pub fn kinetic(&self, g: &mut ExprGraph, velocity: SymPoint) -> ExprId {
        match self.energetic() {
            Some(e) => e.kinetic(g, velocity),
            None => g.zero(),
        }
    }

    pub fn potential(
        &self,
        g: &mut ExprGraph,
        place: &Placement<'_>,
        position: SymPoint,
        gravity: ExprId,
    ) -> ExprId {
        match self.energetic() {
            Some(e) => e.potential(g, place, position, gravity),
            None => g.zero(),
        }
    }

    /// True when the kinetic energy needs the velocity of the position.
    pub fn has_mass(&self) -> bool {
        matches!(self, Body::Point(_) | Body::Slider(_))
    }

    pub fn dof(&self) -> usize {
        self.dynamic().map_or(0, |d| d.dof())
    }

    pub fn damping(&self, local: usize) -> f64 {
        self.dynamic().map_or(0.0, |d| d.damping(local))
    }

    /// Any positive damping coefficient on this component.
    pub fn is_damped(&self) -> bool {
        (0..self.dof()).any(|i| self.damping(i) > 0.0)
    }

    pub fn is_driven(&self) -> bool {
        match self {
            Body::Anchor(a) => a.is_driven(),
            _ => false,
        }
    }

    pub fn initial_state(&self) -> Vec<f64> {
        self.dynamic().map_or_else(Vec::new, |d| d.initial_state())
    }

    pub fn update(&mut self, state: &[f64]) -> ComponentResult<()> {
        match self.dynamic_mut() {
            Some(d) => d.update(state),
            None => Ok(()),
        }
    }

    /// Second endpoint of a connecting elastic link.
    pub fn endpoint(&self) -> Option<CompId> {
        match self {
            Body::Spring(s) => s.other(),
            _ => None,
        }
    }

    pub fn validate(&self, parent: Option<CompId>) -> ComponentResult<()> {
        match self {
            Body::Anchor(v) => v.validate(),
            Body::Path(v) => v.validate(),
            Body::Point(v) => v.validate(),
            Body::Slider(v) => v.validate(),
            Body::Rod(v) => v.validate(),
            Body::Spring(v) => {
                v.validate()?;
                v.check_endpoints(parent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::units::{kg, m};

    #[test]
    fn coordinate_counts() {
        let bodies: Vec<Body> = vec![
            Anchor::fixed(0.0, 0.0).into(),
            PathConstraint::default().into(),
            MassPoint::new(kg(1.0)).into(),
            SlidingMass::new(kg(1.0)).into(),
            RotatingLink::new(m(1.0)).into(),
            ElasticLink::anchored(10.0, m(1.0)).into(),
            ElasticLink::connecting(10.0, CompId::from_index(0)).into(),
        ];
        let dofs: Vec<usize> = bodies.iter().map(Body::dof).collect();
        assert_eq!(dofs, vec![0, 0, 0, 1, 1, 2, 0]);
        for b in &bodies {
            assert_eq!(b.initial_state().len(), 2 * b.dof());
        }
    }

    #[test]
    fn damping_flags() {
        let rod: Body = RotatingLink::new(m(1.0)).with_damping(0.2).into();
        assert!(rod.is_damped());
        assert_eq!(rod.damping(0), 0.2);
        let point: Body = MassPoint::default().into();
        assert!(!point.is_damped());
    }

    #[test]
    fn update_reaches_variant() {
        let mut rod: Body = RotatingLink::default().into();
        rod.update(&[0.1, 0.2]).unwrap();
        assert_eq!(rod.dynamic().unwrap().state(), vec![0.1, 0.2]);

        let mut anchor: Body = Anchor::default().into();
        assert!(anchor.update(&[]).is_ok());
    }
}
