//! Solving the residual system for explicit accelerations.

use lg_symbolic::{ExprGraph, ExprId, SymbolicError};
use lg_tree::{Mechanism, Setup};
use tracing::{debug, info, warn};

use crate::derive::Equations;
use crate::error::{SolverError, SolverResult};

/// Closed-form accelerations `ddQ_i = a_i(t, Q, dQ)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Accelerations {
    /// One expression per coordinate.
    pub exprs: Vec<ExprId>,
    /// Coordinates without a pivot; their acceleration is identically zero.
    pub unsolvable: Vec<usize>,
}

impl Accelerations {
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// Solve `eqs` for the acceleration symbols.
///
/// The residuals must be affine in the accelerations. A coordinate whose
/// acceleration has no pivot (it appears in neither energy, or only through a
/// degenerate combination) gets acceleration zero and a warning.
pub fn solve_accelerations(
    mech: &Mechanism,
    setup: &Setup,
    eqs: &Equations,
    g: &mut ExprGraph,
    node_budget: usize,
) -> SolverResult<Accelerations> {
    let solution = g
        .solve_linear(&eqs.residuals, &eqs.accelerations, node_budget)
        .map_err(|e| match e {
            SymbolicError::Nonlinear { equation } => SolverError::Derivation {
                what: format!(
                    "equation for {} is not linear in the accelerations",
                    setup.label(mech, equation)
                ),
            },
            other => SolverError::derivation(other),
        })?;
    g.check_capacity().map_err(SolverError::derivation)?;

    let unsolvable: Vec<usize> = solution.unsolved().collect();
    for &i in &unsolvable {
        warn!(
            coordinate = %setup.label(mech, i),
            "no pivot for acceleration; holding it at zero"
        );
    }

    let zero = g.zero();
    let exprs: Vec<ExprId> = solution.values.iter().map(|v| v.unwrap_or(zero)).collect();
    for (i, &a) in exprs.iter().enumerate() {
        debug!(
            coordinate = %setup.label(mech, i),
            acceleration = %g.display(a),
            "solved acceleration"
        );
    }
    info!(
        coordinates = exprs.len(),
        unsolvable = unsolvable.len(),
        "accelerations solved"
    );

    Ok(Accelerations { exprs, unsolvable })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive;
    use crate::lagrangian::assemble;
    use lg_components::{Anchor, MassPoint, PathConstraint, RotatingLink, SlidingMass};
    use lg_core::units::{kg, m};
    use lg_tree::{MechanismBuilder, setup};
    use std::collections::HashMap;

    fn solve(mech: &Mechanism, g: &mut ExprGraph) -> (Setup, Equations, Accelerations) {
        let st = setup(mech, &mech.declaration_order(), g).unwrap();
        let lag = assemble(mech, &st, g, 9.81, 10_000).unwrap();
        let eqs = derive(mech, &st, &lag, g, 10_000).unwrap();
        let acc = solve_accelerations(mech, &st, &eqs, g, 10_000).unwrap();
        (st, eqs, acc)
    }

    #[test]
    fn free_cart_on_level_track_does_not_accelerate() {
        let mut b = MechanismBuilder::new();
        let track = b.add_root("track", PathConstraint::default());
        b.add("cart", track, SlidingMass::new(kg(2.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let (st, _, acc) = solve(&mech, &mut g);
        assert_eq!(acc.len(), st.coordinate_count());
        assert!(acc.unsolvable.is_empty());
        assert!(g.is_zero(acc.exprs[0]));
    }

    #[test]
    fn massless_rod_has_no_pivot() {
        // A rod with nothing attached contributes no energy.
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let r1 = b.add("r1", base, RotatingLink::new(m(1.0)));
        b.add("p1", r1, MassPoint::new(kg(1.0)));
        b.add("r2", base, RotatingLink::new(m(1.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let (_, eqs, acc) = solve(&mech, &mut g);
        assert_eq!(acc.unsolvable, vec![1]);
        assert!(g.is_zero(acc.exprs[1]));

        let vals = HashMap::from([(eqs.positions[0], 0.2), (eqs.velocities[0], 0.0)]);
        let a0 = g.evaluate(acc.exprs[0], &vals).unwrap();
        assert!((a0 + 9.81 * 0.2_f64.sin()).abs() < 1e-10);
    }
}
