//! Prescribed motion for anchors: one [`Drive`] per axis.

use std::fmt;
use std::sync::Arc;

use lg_symbolic::{ExprGraph, ExprId};

use crate::common::check_finite;
use crate::error::ComponentResult;
use crate::geometry::SymPoint;

/// Builds an expression of time `t` inside the given graph.
pub type TimeFn = Arc<dyn Fn(&mut ExprGraph, ExprId) -> ExprId + Send + Sync>;

/// One coordinate of a prescribed trajectory.
#[derive(Clone)]
pub enum Drive {
    /// Constant value.
    Fixed(f64),
    /// `offset + amplitude * sin(omega * t + phase)`.
    Harmonic {
        offset: f64,
        amplitude: f64,
        omega: f64,
        phase: f64,
    },
    /// `offset + rate * t`.
    Linear { offset: f64, rate: f64 },
    /// Arbitrary symbolic function of time.
    Custom(TimeFn),
}

impl fmt::Debug for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drive::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Drive::Harmonic {
                offset,
                amplitude,
                omega,
                phase,
            } => f
                .debug_struct("Harmonic")
                .field("offset", offset)
                .field("amplitude", amplitude)
                .field("omega", omega)
                .field("phase", phase)
                .finish(),
            Drive::Linear { offset, rate } => f
                .debug_struct("Linear")
                .field("offset", offset)
                .field("rate", rate)
                .finish(),
            Drive::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Default for Drive {
    fn default() -> Self {
        Drive::Fixed(0.0)
    }
}

impl Drive {
    pub fn harmonic(amplitude: f64, omega: f64) -> Self {
        Drive::Harmonic {
            offset: 0.0,
            amplitude,
            omega,
            phase: 0.0,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut ExprGraph, ExprId) -> ExprId + Send + Sync + 'static,
    {
        Drive::Custom(Arc::new(f))
    }

    /// Expression of this coordinate in terms of the time atom `t`.
    pub fn expr(&self, g: &mut ExprGraph, t: ExprId) -> ExprId {
        match self {
            Drive::Fixed(v) => g.constant(*v),
            Drive::Harmonic {
                offset,
                amplitude,
                omega,
                phase,
            } => {
                let wt = g.scale(*omega, t);
                let ph = g.constant(*phase);
                let arg = g.add(wt, ph);
                let s = g.sin(arg);
                let wave = g.scale(*amplitude, s);
                let off = g.constant(*offset);
                g.add(off, wave)
            }
            Drive::Linear { offset, rate } => {
                let rt = g.scale(*rate, t);
                let off = g.constant(*offset);
                g.add(off, rt)
            }
            Drive::Custom(f) => f(g, t),
        }
    }

    /// True when the value changes with time.
    pub fn is_driven(&self) -> bool {
        match self {
            Drive::Fixed(_) => false,
            Drive::Harmonic {
                amplitude, omega, ..
            } => *amplitude != 0.0 && *omega != 0.0,
            Drive::Linear { rate, .. } => *rate != 0.0,
            Drive::Custom(_) => true,
        }
    }

    pub fn validate(&self) -> ComponentResult<()> {
        match self {
            Drive::Fixed(v) => check_finite(*v, "fixed drive value"),
            Drive::Harmonic {
                offset,
                amplitude,
                omega,
                phase,
            } => {
                check_finite(*offset, "harmonic offset")?;
                check_finite(*amplitude, "harmonic amplitude")?;
                check_finite(*omega, "harmonic angular frequency")?;
                check_finite(*phase, "harmonic phase")
            }
            Drive::Linear { offset, rate } => {
                check_finite(*offset, "linear offset")?;
                check_finite(*rate, "linear rate")
            }
            Drive::Custom(_) => Ok(()),
        }
    }
}

/// A prescribed planar trajectory.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    pub x: Drive,
    pub y: Drive,
}

impl Trajectory {
    pub fn new(x: Drive, y: Drive) -> Self {
        Self { x, y }
    }

    pub fn fixed(x: f64, y: f64) -> Self {
        Self {
            x: Drive::Fixed(x),
            y: Drive::Fixed(y),
        }
    }

    pub fn point(&self, g: &mut ExprGraph, t: ExprId) -> SymPoint {
        SymPoint::new(self.x.expr(g, t), self.y.expr(g, t))
    }

    pub fn is_driven(&self) -> bool {
        self.x.is_driven() || self.y.is_driven()
    }

    pub fn validate(&self) -> ComponentResult<()> {
        self.x.validate()?;
        self.y.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn harmonic_evaluates() {
        let mut g = ExprGraph::new();
        let t = g.time();
        let d = Drive::Harmonic {
            offset: 1.0,
            amplitude: 0.3,
            omega: 10.0,
            phase: 0.5,
        };
        let e = d.expr(&mut g, t);
        let v = g.evaluate(e, &HashMap::from([(t, 0.2)])).unwrap();
        assert!((v - (1.0 + 0.3 * (10.0f64 * 0.2 + 0.5).sin())).abs() < 1e-12);
        assert!(d.is_driven());
    }

    #[test]
    fn fixed_is_not_driven() {
        let mut g = ExprGraph::new();
        let t = g.time();
        let traj = Trajectory::fixed(0.0, 1.0);
        let p = traj.point(&mut g, t);
        assert_eq!(g.as_const(p.y), Some(1.0));
        assert!(!traj.is_driven());
    }

    #[test]
    fn custom_drive_uses_time() {
        let mut g = ExprGraph::new();
        let t = g.time();
        let d = Drive::custom(|g, t| g.square(t));
        let e = d.expr(&mut g, t);
        assert!(g.depends_on(e, t));
        assert!(format!("{d:?}").contains("Custom"));
    }

    #[test]
    fn non_finite_drive_is_rejected() {
        let traj = Trajectory::new(Drive::Fixed(f64::NAN), Drive::Fixed(0.0));
        assert!(traj.validate().is_err());
    }
}
