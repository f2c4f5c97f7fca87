//! Rigid massless rods pivoting about their parent.

use lg_core::units::{Length, m};
use lg_symbolic::{ExprGraph, ExprId};

use crate::common::{check_finite, check_non_negative, check_positive, check_state_len};
use crate::error::ComponentResult;
use crate::geometry::{Placement, SymPoint};
use crate::traits::{Dynamic, Energetic, Spatial};

/// A rod of `length` whose angle from the downward vertical is a coordinate.
///
/// `local_to_global(s) = parent + length * (offset + s) * (sin φ, -cos φ)`.
#[derive(Debug, Clone)]
pub struct RotatingLink {
    pub length: Length,
    pub offset: f64,
    pub phi0: f64,
    pub dphi0: f64,
    pub damping: f64,
    phi: f64,
    dphi: f64,
}

impl Default for RotatingLink {
    fn default() -> Self {
        Self::new(m(1.0))
    }
}

impl RotatingLink {
    pub fn new(length: Length) -> Self {
        Self {
            length,
            offset: 0.0,
            phi0: 0.0,
            dphi0: 0.0,
            damping: 0.0,
            phi: 0.0,
            dphi: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_initial(mut self, phi0: f64, dphi0: f64) -> Self {
        self.phi0 = phi0;
        self.dphi0 = dphi0;
        self.phi = phi0;
        self.dphi = dphi0;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn validate(&self) -> ComponentResult<()> {
        check_positive(self.length.value, "link length")?;
        check_finite(self.offset, "link offset")?;
        check_finite(self.phi0, "initial angle")?;
        check_finite(self.dphi0, "initial angular velocity")?;
        check_non_negative(self.damping, "link damping")
    }
}

impl Spatial for RotatingLink {
    fn local_to_global(&self, g: &mut ExprGraph, place: &Placement<'_>, local: ExprId) -> SymPoint {
        let phi = place.coords[0];
        let shifted = {
            let off = g.constant(self.offset);
            g.add(off, local)
        };
        let radius = g.scale(self.length.value, shifted);
        place.attach.polar(g, radius, phi)
    }
}

// Massless: contributes no energy of its own.
impl Energetic for RotatingLink {}

impl Dynamic for RotatingLink {
    fn dof(&self) -> usize {
        1
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        &["phi"]
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.phi0, self.dphi0]
    }

    fn damping(&self, _local: usize) -> f64 {
        self.damping
    }

    fn state(&self) -> Vec<f64> {
        vec![self.phi, self.dphi]
    }

    fn update(&mut self, state: &[f64]) -> ComponentResult<()> {
        check_state_len(state, 2, "rotating link")?;
        self.phi = state[0];
        self.dphi = state[1];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tip_follows_angle() {
        let mut g = ExprGraph::new();
        let q = g.coord(0, 0);
        let coords = [q];
        let place = Placement {
            attach: SymPoint::origin(&mut g),
            endpoint: None,
            time: g.time(),
            coords: &coords,
        };
        let rod = RotatingLink::new(m(2.0)).with_offset(0.5);
        let tip = rod.position(&mut g, &place);

        let phi = std::f64::consts::FRAC_PI_2;
        let x = g.evaluate(tip.x, &HashMap::from([(q, phi)])).unwrap();
        let y = g.evaluate(tip.y, &HashMap::from([(q, phi)])).unwrap();
        assert!((x - 3.0).abs() < 1e-12);
        assert!(y.abs() < 1e-12);
    }

    #[test]
    fn validation() {
        assert!(RotatingLink::default().validate().is_ok());
        assert!(RotatingLink::new(m(0.0)).validate().is_err());
        assert!(RotatingLink::default().with_damping(-1.0).validate().is_err());
    }
}
