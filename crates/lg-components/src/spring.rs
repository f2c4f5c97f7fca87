//! Elastic links: swinging springs and springs between two components.

use lg_core::CompId;
use lg_symbolic::{ExprGraph, ExprId};

use crate::common::{check_finite, check_non_negative, check_positive, check_state_len};
use crate::error::{ComponentError, ComponentResult};
use crate::geometry::{Placement, SymPoint};
use crate::traits::{Dynamic, Energetic, Spatial};

#[derive(Debug, Clone, PartialEq)]
pub enum ElasticMode {
    /// Hangs from its parent; extension `e` and angle `φ` are coordinates.
    ///
    /// `local_to_global(s) = parent + (rest_length + e) * s * (sin φ, -cos φ)`.
    Anchored {
        rest_length: f64,
        x0: f64,
        dx0: f64,
        phi0: f64,
        dphi0: f64,
    },
    /// Joins the parent and `other`; owns no coordinate.
    Connecting { other: CompId, rest_length: f64 },
}

#[derive(Debug, Clone)]
pub struct ElasticLink {
    /// Spring constant k in N/m.
    pub stiffness: f64,
    pub mode: ElasticMode,
    state: [f64; 4],
}

impl ElasticLink {
    /// A swinging spring of natural length `rest_length`.
    pub fn anchored(stiffness: f64, rest_length: lg_core::Length) -> Self {
        Self {
            stiffness,
            mode: ElasticMode::Anchored {
                rest_length: rest_length.value,
                x0: 0.0,
                dx0: 0.0,
                phi0: 0.0,
                dphi0: 0.0,
            },
            state: [0.0; 4],
        }
    }

    /// A zero-rest-length spring from the parent to `other`.
    pub fn connecting(stiffness: f64, other: CompId) -> Self {
        Self {
            stiffness,
            mode: ElasticMode::Connecting {
                other,
                rest_length: 0.0,
            },
            state: [0.0; 4],
        }
    }

    /// Initial extension and angle; ignored in connecting mode.
    pub fn with_initial(mut self, x0: f64, dx0: f64, phi0: f64, dphi0: f64) -> Self {
        if let ElasticMode::Anchored {
            x0: e,
            dx0: de,
            phi0: p,
            dphi0: dp,
            ..
        } = &mut self.mode
        {
            *e = x0;
            *de = dx0;
            *p = phi0;
            *dp = dphi0;
            self.state = [x0, dx0, phi0, dphi0];
        }
        self
    }

    /// Natural length of a connecting spring.
    pub fn with_rest_length(mut self, length: lg_core::Length) -> Self {
        match &mut self.mode {
            ElasticMode::Anchored { rest_length, .. }
            | ElasticMode::Connecting { rest_length, .. } => {
                *rest_length = length.value;
            }
        }
        self
    }

    /// Second endpoint, for connecting springs.
    pub fn other(&self) -> Option<CompId> {
        match self.mode {
            ElasticMode::Connecting { other, .. } => Some(other),
            ElasticMode::Anchored { .. } => None,
        }
    }

    pub fn validate(&self) -> ComponentResult<()> {
        check_non_negative(self.stiffness, "spring stiffness")?;
        match &self.mode {
            ElasticMode::Anchored {
                rest_length,
                x0,
                dx0,
                phi0,
                dphi0,
            } => {
                check_positive(*rest_length, "spring rest length")?;
                check_finite(*x0, "initial extension")?;
                check_finite(*dx0, "initial extension rate")?;
                check_finite(*phi0, "initial angle")?;
                check_finite(*dphi0, "initial angular velocity")
            }
            ElasticMode::Connecting { rest_length, .. } => {
                check_non_negative(*rest_length, "spring rest length")
            }
        }
    }
}

impl Spatial for ElasticLink {
    fn local_to_global(&self, g: &mut ExprGraph, place: &Placement<'_>, local: ExprId) -> SymPoint {
        match &self.mode {
            ElasticMode::Anchored { rest_length, .. } => {
                let (e, phi) = (place.coords[0], place.coords[1]);
                let rest = g.constant(*rest_length);
                let length = g.add(rest, e);
                let radius = g.mul(length, local);
                place.attach.polar(g, radius, phi)
            }
            ElasticMode::Connecting { .. } => match place.endpoint {
                Some(end) => place.attach.lerp(g, end, local),
                None => place.attach,
            },
        }
    }
}

impl Energetic for ElasticLink {
    fn potential(
        &self,
        g: &mut ExprGraph,
        place: &Placement<'_>,
        _position: SymPoint,
        _gravity: ExprId,
    ) -> ExprId {
        let half_k = 0.5 * self.stiffness;
        match &self.mode {
            ElasticMode::Anchored { .. } => {
                let e2 = g.square(place.coords[0]);
                g.scale(half_k, e2)
            }
            ElasticMode::Connecting { rest_length, .. } => {
                let Some(end) = place.endpoint else {
                    return g.zero();
                };
                let d2 = place.attach.distance_sq(g, end);
                if *rest_length == 0.0 {
                    g.scale(half_k, d2)
                } else {
                    let d = g.sqrt(d2);
                    let l0 = g.constant(*rest_length);
                    let stretch = g.sub(d, l0);
                    let s2 = g.square(stretch);
                    g.scale(half_k, s2)
                }
            }
        }
    }
}

impl Dynamic for ElasticLink {
    fn dof(&self) -> usize {
        match self.mode {
            ElasticMode::Anchored { .. } => 2,
            ElasticMode::Connecting { .. } => 0,
        }
    }

    fn coordinate_names(&self) -> &'static [&'static str] {
        match self.mode {
            ElasticMode::Anchored { .. } => &["extension", "phi"],
            ElasticMode::Connecting { .. } => &[],
        }
    }

    fn initial_state(&self) -> Vec<f64> {
        match self.mode {
            ElasticMode::Anchored {
                x0, dx0, phi0, dphi0, ..
            } => vec![x0, dx0, phi0, dphi0],
            ElasticMode::Connecting { .. } => Vec::new(),
        }
    }

    fn state(&self) -> Vec<f64> {
        self.state[..2 * self.dof()].to_vec()
    }

    fn update(&mut self, state: &[f64]) -> ComponentResult<()> {
        let n = 2 * self.dof();
        check_state_len(state, n, "elastic link")?;
        self.state[..n].copy_from_slice(state);
        Ok(())
    }
}

impl ElasticLink {
    /// Reject a connecting spring whose endpoint is its own parent.
    pub fn check_endpoints(&self, parent: Option<CompId>) -> ComponentResult<()> {
        match (self.other(), parent) {
            (Some(other), Some(p)) if other == p => Err(ComponentError::InvalidArg {
                what: "spring endpoints must differ",
            }),
            (Some(_), None) => Err(ComponentError::InvalidArg {
                what: "connecting spring needs a parent",
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::units::m;
    use std::collections::HashMap;

    #[test]
    fn anchored_spring_energy_and_tip() {
        let mut g = ExprGraph::new();
        let e = g.coord(0, 0);
        let phi = g.coord(1, 0);
        let coords = [e, phi];
        let place = Placement {
            attach: SymPoint::origin(&mut g),
            endpoint: None,
            time: g.time(),
            coords: &coords,
        };
        let spring = ElasticLink::anchored(100.0, m(1.0)).with_initial(0.0, 0.0, 0.3, 0.0);
        let tip = spring.position(&mut g, &place);
        let u = spring.potential(&mut g, &place, tip, e);

        let b = HashMap::from([(e, 0.2), (phi, 0.0)]);
        assert!((g.evaluate(tip.y, &b).unwrap() + 1.2).abs() < 1e-12);
        assert!((g.evaluate(u, &b).unwrap() - 0.5 * 100.0 * 0.04).abs() < 1e-12);
        assert_eq!(spring.dof(), 2);
        assert_eq!(spring.initial_state(), vec![0.0, 0.0, 0.3, 0.0]);
    }

    #[test]
    fn connecting_spring_uses_distance() {
        let mut g = ExprGraph::new();
        let a = SymPoint::constant(&mut g, 0.0, 1.0);
        let b = SymPoint::constant(&mut g, 1.0, 0.0);
        let place = Placement {
            attach: a,
            endpoint: Some(b),
            time: g.time(),
            coords: &[],
        };
        let zero_rest = ElasticLink::connecting(20.0, CompId::from_index(3));
        let u = zero_rest.potential(&mut g, &place, a, a.x);
        assert!((g.as_const(u).unwrap() - 0.5 * 20.0 * 2.0).abs() < 1e-12);

        let with_rest = zero_rest.clone().with_rest_length(m(1.0));
        let u = with_rest.potential(&mut g, &place, a, a.x);
        let expected = 0.5 * 20.0 * (2.0f64.sqrt() - 1.0).powi(2);
        assert!((g.as_const(u).unwrap() - expected).abs() < 1e-12);
        assert_eq!(zero_rest.dof(), 0);
    }

    #[test]
    fn endpoint_checks() {
        let s = ElasticLink::connecting(1.0, CompId::from_index(1));
        assert!(s.check_endpoints(Some(CompId::from_index(1))).is_err());
        assert!(s.check_endpoints(None).is_err());
        assert!(s.check_endpoints(Some(CompId::from_index(0))).is_ok());
    }
}
