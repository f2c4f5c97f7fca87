//! Euler-Lagrange residuals and their reduction to algebraic form.

use std::collections::HashMap;

use lg_symbolic::{ExprGraph, ExprId, Node};
use lg_tree::{Mechanism, Setup};
use tracing::debug;

use crate::error::{SolverError, SolverResult};
use crate::lagrangian::Lagrangian;

/// The equations of motion as algebraic residuals `R_i(t, Q, dQ, ddQ) = 0`.
///
/// Every coordinate time function `q_i(t)`, `q_i'(t)` and `q_i''(t)` has been
/// replaced by the plain symbols `Q_i`, `dQ_i` and `ddQ_i`.
#[derive(Clone, Debug)]
pub struct Equations {
    pub residuals: Vec<ExprId>,
    pub positions: Vec<ExprId>,
    pub velocities: Vec<ExprId>,
    pub accelerations: Vec<ExprId>,
    /// Coordinate atom to symbol, for reusing on other expressions (energy,
    /// positions).
    pub substitution: HashMap<ExprId, ExprId>,
}

impl Equations {
    pub fn len(&self) -> usize {
        self.residuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residuals.is_empty()
    }

    /// Symbols in the compiled input order: `[Q_0, dQ_0, Q_1, dQ_1, ...]`.
    pub fn state_symbols(&self) -> Vec<ExprId> {
        self.positions
            .iter()
            .zip(&self.velocities)
            .flat_map(|(&q, &dq)| [q, dq])
            .collect()
    }

    /// Rewrite an expression in coordinate atoms into the algebraic symbols.
    pub fn to_algebraic(&self, g: &mut ExprGraph, expr: ExprId) -> ExprId {
        g.substitute(expr, &self.substitution)
    }
}

/// Build one residual per coordinate from `lagrangian` and substitute the
/// coordinate time functions by fresh symbols.
///
/// `R_i = d/dt(∂L/∂q̇_i) - ∂L/∂q_i`, plus `c_i ∂L/∂q̇_i` when the owning
/// component damps that coordinate with coefficient `c_i`.
pub fn derive(
    mech: &Mechanism,
    setup: &Setup,
    lagrangian: &Lagrangian,
    g: &mut ExprGraph,
    node_budget: usize,
) -> SolverResult<Equations> {
    let l = lagrangian.lagrangian;
    let n = setup.coordinate_count();
    let mut raw = Vec::with_capacity(n);

    for (i, &q) in setup.atoms().iter().enumerate() {
        let dq = g.coord(i, 1);
        let dl_dq = g.diff(l, q).map_err(SolverError::derivation)?;
        let dl_ddq = g.diff(l, dq).map_err(SolverError::derivation)?;
        let ddt = g.diff_time(dl_ddq);
        let mut residual = g.sub(ddt, dl_dq);

        let damping = match setup.owner(i) {
            Some((id, local)) => mech.body(id).map_or(0.0, |b| b.damping(local)),
            None => 0.0,
        };
        if damping > 0.0 {
            let friction = g.scale(damping, dl_ddq);
            residual = g.add(residual, friction);
        }

        raw.push(g.simplify(residual, node_budget).expr);
        g.check_capacity().map_err(SolverError::derivation)?;
    }

    let mut positions = Vec::with_capacity(n);
    let mut velocities = Vec::with_capacity(n);
    let mut accelerations = Vec::with_capacity(n);
    let mut substitution = HashMap::with_capacity(3 * n);
    for i in 0..n {
        let q = g.symbol(format!("Q{}", i));
        let dq = g.symbol(format!("dQ{}", i));
        let ddq = g.symbol(format!("ddQ{}", i));
        for (order, sym) in [(0, q), (1, dq), (2, ddq)] {
            let atom = g.coord(i, order);
            substitution.insert(atom, sym);
        }
        positions.push(q);
        velocities.push(dq);
        accelerations.push(ddq);
    }

    let residuals = g.substitute_all(&raw, &substitution);
    ensure_no_time_functions(g, &residuals)?;

    for (i, &r) in residuals.iter().enumerate() {
        debug!(
            coordinate = %setup.label(mech, i),
            residual = %g.display(r),
            "equation of motion"
        );
    }

    Ok(Equations {
        residuals,
        positions,
        velocities,
        accelerations,
        substitution,
    })
}

/// After substitution only `t` and plain symbols may remain.
pub(crate) fn ensure_no_time_functions(g: &ExprGraph, exprs: &[ExprId]) -> SolverResult<()> {
    let leftover = g
        .free_atoms_all(exprs)
        .into_iter()
        .find(|&a| matches!(g.node(a), Node::Coord { .. }));
    match leftover {
        Some(atom) => Err(SolverError::Derivation {
            what: format!("time function {} left after substitution", g.atom_name(atom)),
        }),
        None => Ok(()),
    }
}
