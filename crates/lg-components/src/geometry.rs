//! Planar symbolic points and the context a component is evaluated in.

use lg_symbolic::{ExprGraph, ExprId};

/// A point in the plane whose coordinates are expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymPoint {
    pub x: ExprId,
    pub y: ExprId,
}

impl SymPoint {
    pub fn new(x: ExprId, y: ExprId) -> Self {
        Self { x, y }
    }

    pub fn origin(g: &mut ExprGraph) -> Self {
        let zero = g.zero();
        Self { x: zero, y: zero }
    }

    pub fn constant(g: &mut ExprGraph, x: f64, y: f64) -> Self {
        Self {
            x: g.constant(x),
            y: g.constant(y),
        }
    }

    pub fn offset(self, g: &mut ExprGraph, dx: ExprId, dy: ExprId) -> Self {
        Self {
            x: g.add(self.x, dx),
            y: g.add(self.y, dy),
        }
    }

    /// `self + radius * (sin angle, -cos angle)`: a pendulum-style polar offset
    /// where angle 0 points straight down.
    pub fn polar(self, g: &mut ExprGraph, radius: ExprId, angle: ExprId) -> Self {
        let s = g.sin(angle);
        let c = g.cos(angle);
        let dx = g.mul(radius, s);
        let rc = g.mul(radius, c);
        let dy = g.neg(rc);
        self.offset(g, dx, dy)
    }

    /// `self + s * (other - self)`.
    pub fn lerp(self, g: &mut ExprGraph, other: SymPoint, s: ExprId) -> Self {
        let ddx = g.sub(other.x, self.x);
        let ddy = g.sub(other.y, self.y);
        let dx = g.mul(s, ddx);
        let dy = g.mul(s, ddy);
        self.offset(g, dx, dy)
    }

    /// Total time derivative of both coordinates.
    pub fn velocity(self, g: &mut ExprGraph) -> Self {
        Self {
            x: g.diff_time(self.x),
            y: g.diff_time(self.y),
        }
    }

    pub fn norm_sq(self, g: &mut ExprGraph) -> ExprId {
        let x2 = g.square(self.x);
        let y2 = g.square(self.y);
        g.add(x2, y2)
    }

    pub fn distance_sq(self, g: &mut ExprGraph, other: SymPoint) -> ExprId {
        let dx = g.sub(other.x, self.x);
        let dy = g.sub(other.y, self.y);
        SymPoint::new(dx, dy).norm_sq(g)
    }
}

/// How a component hangs off its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attachment {
    /// At the parent's position.
    Position,
    /// At a fixed parameter along the parent's local parameterization.
    Along(f64),
    /// At the component's own coordinate (by local coordinate number) along the
    /// parent's parameterization.
    AlongCoordinate(usize),
}

/// Everything a component needs to build its expressions.
#[derive(Clone, Copy, Debug)]
pub struct Placement<'a> {
    /// Where the component is attached (resolved from its [`Attachment`]).
    pub attach: SymPoint,
    /// Position of the second endpoint of a connecting elastic link.
    pub endpoint: Option<SymPoint>,
    pub time: ExprId,
    /// This component's own coordinate functions `q_i(t)`, one per DOF.
    pub coords: &'a [ExprId],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn polar_hangs_down_at_zero() {
        let mut g = ExprGraph::new();
        let o = SymPoint::origin(&mut g);
        let r = g.constant(2.0);
        let zero = g.zero();
        let p = o.polar(&mut g, r, zero);
        assert_eq!(g.as_const(p.x), Some(0.0));
        assert_eq!(g.as_const(p.y), Some(-2.0));
    }

    #[test]
    fn lerp_midpoint() {
        let mut g = ExprGraph::new();
        let a = SymPoint::constant(&mut g, 0.0, 1.0);
        let b = SymPoint::constant(&mut g, 2.0, 3.0);
        let half = g.constant(0.5);
        let m = a.lerp(&mut g, b, half);
        assert_eq!(g.as_const(m.x), Some(1.0));
        assert_eq!(g.as_const(m.y), Some(2.0));
    }

    #[test]
    fn distance_of_symbolic_points() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x");
        let zero = g.zero();
        let a = SymPoint::new(x, zero);
        let b = SymPoint::constant(&mut g, 0.0, 0.0);
        let d2 = a.distance_sq(&mut g, b);
        let v = g.evaluate(d2, &HashMap::from([(x, 3.0)])).unwrap();
        assert_eq!(v, 9.0);
    }
}
