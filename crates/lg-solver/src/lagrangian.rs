//! Lagrangian assembly: total kinetic and potential energy of the tree.

use lg_symbolic::{ExprGraph, ExprId};
use lg_tree::{Kinematics, Mechanism, Setup};
use tracing::debug;

use crate::error::{SolverError, SolverResult};

/// Energy expressions of a set-up mechanism, in terms of the coordinate
/// time functions `q_i(t)` and their derivatives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lagrangian {
    /// ΣT
    pub kinetic: ExprId,
    /// ΣU
    pub potential: ExprId,
    /// L = T - U
    pub lagrangian: ExprId,
    /// H = T + U
    pub energy: ExprId,
    /// False when a term budget was exceeded and an energy was kept as built.
    pub simplified: bool,
}

/// Sum kinetic and potential energy over every presented component.
///
/// Both totals are simplified within `node_budget` terms. Going over budget is
/// not an error; the unsimplified expression is kept.
pub fn assemble(
    mech: &Mechanism,
    setup: &Setup,
    g: &mut ExprGraph,
    gravity: f64,
    node_budget: usize,
) -> SolverResult<Lagrangian> {
    let gravity = g.constant(gravity);
    let mut kin = Kinematics::new(mech, setup);

    let mut kinetic_terms = Vec::new();
    let mut potential_terms = Vec::new();
    for &id in setup.sequence() {
        let t = kin.kinetic(g, id);
        let u = kin.potential(g, id, gravity);
        if !(g.is_zero(t) && g.is_zero(u)) {
            debug!(
                component = mech.name(id),
                kinetic = %g.display(t),
                potential = %g.display(u),
                "energy contribution"
            );
        }
        kinetic_terms.push(t);
        potential_terms.push(u);
    }

    let kinetic = g.add_all(kinetic_terms);
    let potential = g.add_all(potential_terms);
    let t = g.simplify(kinetic, node_budget);
    let u = g.simplify(potential, node_budget);
    let simplified = t.expanded && u.expanded;
    if !simplified {
        debug!(node_budget, "energy kept unsimplified: term budget exceeded");
    }

    let lagrangian = g.sub(t.expr, u.expr);
    let energy = g.add(t.expr, u.expr);
    g.check_capacity().map_err(SolverError::derivation)?;

    Ok(Lagrangian {
        kinetic: t.expr,
        potential: u.expr,
        lagrangian,
        energy,
        simplified,
    })
}
