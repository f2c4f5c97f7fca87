//! Point masses sliding along a track.

use lg_core::units::{Mass, kg};
use lg_symbolic::{ExprGraph, ExprId};

use crate::common::{check_finite, check_non_negative, check_positive, check_state_len};
use crate::error::ComponentResult;
use crate::geometry::{Attachment, Placement, SymPoint};
use crate::point::{point_kinetic, point_potential};
use crate::traits::{Dynamic, Energetic, Spatial};

/// A point mass whose location along its parent track is a coordinate.
#[derive(Debug, Clone)]
pub struct SlidingMass {
    pub mass: Mass,
    pub loc0: f64,
    pub dloc0: f64,
    pub damping: f64,
    loc: f64,
    dloc: f64,
}

impl Default for SlidingMass {
    fn default() -> Self {
        Self::new(kg(1.0))
    }
}

impl SlidingMass {
    pub fn new(mass: Mass) -> Self {
        Self {
            mass,
            loc0: 0.0,
            dloc0: 0.0,
            damping: 0.0,
            loc: 0.0,
            dloc: 0.0,
        }
    }

    pub fn with_initial(mut self, loc0: f64, dloc0: f64) -> Self {
        self.loc0 = loc0;
        self.dloc0 = dloc0;
        self.loc = loc0;
        self.dloc = dloc0;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn validate(&self) -> ComponentResult<()> {
        check_positive(self.mass.value, "sliding mass")?;
        check_finite(self.loc0, "initial track location")?;
        check_finite(self.dloc0, "initial track speed")?;
        check_non_negative(self.damping, "slider damping")
    }
}

impl Spatial for SlidingMass {
    fn attachment(&self) -> Attachment {
        Attachment::AlongCoordinate(0)
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

impl Energetic for SlidingMass {
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

impl Dynamic for SlidingMass {
    fn dof(&self) -> usize {
        1
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["loc"]
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.loc0, self.dloc0]
    }

    fn damping(&self, _local: usize) -> f64 {
        self.damping
    }

    fn state(&self) -> Vec<f64> {
        vec![self.loc, self.dloc]
    }

    fn update(&mut self, state: &[f64]) -> ComponentResult<()> {
        check_state_len(state, 2, "sliding mass")?;
        self.loc = state[0];
        self.dloc = state[1];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slides_on_own_coordinate() {
        let s = SlidingMass::new(kg(2.0)).with_initial(-1.0, 0.0);
        assert_eq!(s.attachment(), Attachment::AlongCoordinate(0));
        assert_eq!(s.initial_state(), vec![-1.0, 0.0]);
    }

    #[test]
    fn update_stores_state() {
        let mut s = SlidingMass::default();
        s.update(&[0.5, 0.1]).unwrap();
        assert_eq!(s.state(), vec![0.5, 0.1]);
        assert!(s.update(&[0.5]).is_err());
    }
}
