//! One-dimensional tracks that sliding masses ride on.

use std::fmt;
use std::sync::Arc;

use lg_symbolic::{ExprGraph, ExprId};

use crate::common::{check_finite, check_positive};
use crate::error::{ComponentError, ComponentResult};
use crate::geometry::{Placement, SymPoint};
use crate::traits::Spatial;

/// Maps a track parameter to a point relative to the track's origin.
pub type CurveFn = Arc<dyn Fn(&mut ExprGraph, ExprId) -> SymPoint + Send + Sync>;

#[derive(Clone)]
pub enum PathShape {
    /// `from + s * (to - from)`.
    Line { from: [f64; 2], to: [f64; 2] },
    /// `radius * (sin s, -cos s)`; `s = 0` is the lowest point.
    Circle { radius: f64 },
    Parametric(CurveFn),
}

impl fmt::Debug for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathShape::Line { from, to } => f
                .debug_struct("Line")
                .field("from", from)
                .field("to", to)
                .finish(),
            PathShape::Circle { radius } => {
                f.debug_struct("Circle").field("radius", radius).finish()
            }
            PathShape::Parametric(_) => f.write_str("Parametric(..)"),
        }
    }
}

/// A track placed relative to its parent's position (the origin when it has
/// no parent). A driven track is a track whose parent is a driven anchor.
#[derive(Debug, Clone)]
pub struct PathConstraint {
    pub shape: PathShape,
}

impl Default for PathConstraint {
    fn default() -> Self {
        Self::line([0.0, 0.0], [1.0, 0.0])
    }
}

impl PathConstraint {
    pub fn line(from: [f64; 2], to: [f64; 2]) -> Self {
        Self {
            shape: PathShape::Line { from, to },
        }
    }

    pub fn circle(radius: lg_core::Length) -> Self {
        Self {
            shape: PathShape::Circle {
                radius: radius.value,
            },
        }
    }

    pub fn parametric<F>(curve: F) -> Self
    where
        F: Fn(&mut ExprGraph, ExprId) -> SymPoint + Send + Sync + 'static,
    {
        Self {
            shape: PathShape::Parametric(Arc::new(curve)),
        }
    }

    pub fn validate(&self) -> ComponentResult<()> {
        match &self.shape {
            PathShape::Line { from, to } => {
                for v in from.iter().chain(to) {
                    check_finite(*v, "line endpoint")?;
                }
                if from == to {
                    return Err(ComponentError::InvalidArg {
                        what: "line endpoints coincide",
                    });
                }
                Ok(())
            }
            PathShape::Circle { radius } => check_positive(*radius, "circle radius"),
            PathShape::Parametric(_) => Ok(()),
        }
    }
}

impl Spatial for PathConstraint {
    fn local_to_global(&self, g: &mut ExprGraph, place: &Placement<'_>, local: ExprId) -> SymPoint {
        let rel = match &self.shape {
            PathShape::Line { from, to } => {
                let start = SymPoint::constant(g, from[0], from[1]);
                let end = SymPoint::constant(g, to[0], to[1]);
                start.lerp(g, end, local)
            }
            PathShape::Circle { radius } => {
                let r = g.constant(*radius);
                SymPoint::origin(g).polar(g, r, local)
            }
            PathShape::Parametric(curve) => curve(g, local),
        };
        place.attach.offset(g, rel.x, rel.y)
    }

    /// The track's origin.
    fn position(&self, _g: &mut ExprGraph, place: &Placement<'_>) -> SymPoint {
        place.attach
    }
}
