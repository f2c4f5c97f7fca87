//! Numeric evaluators for the solved system.

use std::cell::RefCell;

use lg_core::CompId;
use lg_symbolic::{CompiledFn, ExprGraph, ExprId};
use lg_tree::{Kinematics, Mechanism, Setup};
use tracing::info;

use crate::accel::Accelerations;
use crate::derive::Equations;
use crate::error::{SolverError, SolverResult};
use crate::lagrangian::Lagrangian;

#[derive(Debug, Default)]
struct Workspace {
    inputs: Vec<f64>,
    scratch: Vec<f64>,
    accel: Vec<f64>,
}

/// Compiled accelerations, energy and component positions.
///
/// Every evaluator takes the input vector `[t, x_0, ..., x_{2N-1}]` with the
/// state interleaved as `(Q_i, dQ_i)`.
#[derive(Debug)]
pub struct CompiledSystem {
    accelerations: CompiledFn,
    energy: CompiledFn,
    positions: CompiledFn,
    position_owners: Vec<CompId>,
    n_coords: usize,
    work: RefCell<Workspace>,
}

/// Compile the solved accelerations together with `H` and the position of
/// every presented component.
pub fn compile_system(
    mech: &Mechanism,
    setup: &Setup,
    g: &mut ExprGraph,
    lagrangian: &Lagrangian,
    eqs: &Equations,
    accels: &Accelerations,
) -> SolverResult<CompiledSystem> {
    let inputs = input_atoms(setup, eqs);
    let accelerations = g
        .compile(&accels.exprs, &inputs)
        .map_err(SolverError::compilation)?;

    let h = eqs.to_algebraic(g, lagrangian.energy);
    let energy = g.compile(&[h], &inputs).map_err(SolverError::compilation)?;

    let mut kin = Kinematics::new(mech, setup);
    let mut coords = Vec::with_capacity(2 * setup.sequence().len());
    for &id in setup.sequence() {
        let p = kin.position(g, id);
        coords.push(eqs.to_algebraic(g, p.x));
        coords.push(eqs.to_algebraic(g, p.y));
    }
    let positions = g.compile(&coords, &inputs).map_err(SolverError::compilation)?;

    info!(
        coordinates = eqs.len(),
        acceleration_tape = accelerations.len(),
        energy_tape = energy.len(),
        position_tape = positions.len(),
        "compiled equations of motion"
    );

    Ok(CompiledSystem {
        accelerations,
        energy,
        positions,
        position_owners: setup.sequence().to_vec(),
        n_coords: eqs.len(),
        work: RefCell::new(Workspace::default()),
    })
}

impl CompiledSystem {
    pub fn coordinate_count(&self) -> usize {
        self.n_coords
    }

    pub fn state_len(&self) -> usize {
        2 * self.n_coords
    }

    /// Instructions in the acceleration tape.
    pub fn tape_len(&self) -> usize {
        self.accelerations.len()
    }

    /// Components in the order [`CompiledSystem::positions`] reports them.
    pub fn position_owners(&self) -> &[CompId] {
        &self.position_owners
    }

    fn load_inputs(&self, work: &mut Workspace, t: f64, x: &[f64]) -> SolverResult<()> {
        if x.len() != self.state_len() {
            return Err(SolverError::Numeric {
                what: format!(
                    "state length mismatch: expected {}, got {}",
                    self.state_len(),
                    x.len()
                ),
            });
        }
        work.inputs.clear();
        work.inputs.push(t);
        work.inputs.extend_from_slice(x);
        Ok(())
    }

    /// Accelerations `a_i(t, x)`.
    pub fn accelerations(&self, t: f64, x: &[f64]) -> SolverResult<Vec<f64>> {
        let mut out = vec![0.0; self.n_coords];
        let mut work = self.work.borrow_mut();
        self.load_inputs(&mut work, t, x)?;
        let Workspace {
            inputs, scratch, ..
        } = &mut *work;
        self.accelerations
            .eval_into(inputs, scratch, &mut out)
            .map_err(SolverError::numeric)?;
        Ok(out)
    }

    /// State derivative: `(x_{2i+1}, a_i(t, x))` per coordinate.
    ///
    /// Fails with [`SolverError::Numeric`] on a non-finite acceleration.
    pub fn rhs_into(&self, t: f64, x: &[f64], dx: &mut [f64]) -> SolverResult<()> {
        if dx.len() != self.state_len() {
            return Err(SolverError::Numeric {
                what: format!(
                    "derivative length mismatch: expected {}, got {}",
                    self.state_len(),
                    dx.len()
                ),
            });
        }
        let mut work = self.work.borrow_mut();
        self.load_inputs(&mut work, t, x)?;
        let Workspace {
            inputs,
            scratch,
            accel,
        } = &mut *work;
        accel.resize(self.n_coords, 0.0);
        self.accelerations
            .eval_into(inputs, scratch, accel)
            .map_err(SolverError::numeric)?;

        for (i, &a) in accel.iter().enumerate() {
            if !a.is_finite() {
                return Err(SolverError::Numeric {
                    what: format!("non-finite acceleration for coordinate {} at t = {}", i, t),
                });
            }
            dx[2 * i] = x[2 * i + 1];
            dx[2 * i + 1] = a;
        }
        Ok(())
    }

    /// Allocating wrapper around [`CompiledSystem::rhs_into`].
    pub fn rhs(&self, t: f64, x: &[f64]) -> SolverResult<Vec<f64>> {
        let mut dx = vec![0.0; self.state_len()];
        self.rhs_into(t, x, &mut dx)?;
        Ok(dx)
    }

    /// Total energy `H = T + U` at `(t, x)`.
    ///
    /// Only conserved for undamped, undriven mechanisms.
    pub fn energy(&self, t: f64, x: &[f64]) -> SolverResult<f64> {
        let mut out = [0.0];
        let mut work = self.work.borrow_mut();
        self.load_inputs(&mut work, t, x)?;
        let Workspace {
            inputs, scratch, ..
        } = &mut *work;
        self.energy
            .eval_into(inputs, scratch, &mut out)
            .map_err(SolverError::numeric)?;
        Ok(out[0])
    }

    /// Global `[x, y]` of every presented component, in presentation order.
    pub fn positions(&self, t: f64, x: &[f64]) -> SolverResult<Vec<[f64; 2]>> {
        let mut out = vec![0.0; 2 * self.position_owners.len()];
        let mut work = self.work.borrow_mut();
        self.load_inputs(&mut work, t, x)?;
        let Workspace {
            inputs, scratch, ..
        } = &mut *work;
        self.positions
            .eval_into(inputs, scratch, &mut out)
            .map_err(SolverError::numeric)?;
        Ok(out.chunks_exact(2).map(|p| [p[0], p[1]]).collect())
    }
}

/// Atoms bound to the compiled input vector: `[t, Q_0, dQ_0, Q_1, dQ_1, ...]`.
pub fn input_atoms(setup: &Setup, eqs: &Equations) -> Vec<ExprId> {
    let mut inputs = Vec::with_capacity(1 + 2 * eqs.len());
    inputs.push(setup.time());
    inputs.extend(eqs.state_symbols());
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::solve_accelerations;
    use crate::derive::derive;
    use crate::lagrangian::assemble;
    use lg_components::{Anchor, Drive, MassPoint, RotatingLink, Trajectory};
    use lg_core::units::{kg, m};
    use lg_tree::{MechanismBuilder, setup};
    use std::collections::HashMap;

    fn build(mech: &Mechanism, g: &mut ExprGraph) -> (Equations, Accelerations, CompiledSystem) {
        let st = setup(mech, &mech.declaration_order(), g).unwrap();
        let lag = assemble(mech, &st, g, 9.81, 10_000).unwrap();
        let eqs = derive(mech, &st, &lag, g, 10_000).unwrap();
        let acc = solve_accelerations(mech, &st, &eqs, g, 10_000).unwrap();
        let sys = compile_system(mech, &st, g, &lag, &eqs, &acc).unwrap();
        (eqs, acc, sys)
    }

    #[test]
    fn double_pendulum_tape_matches_graph() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let r1 = b.add("r1", base, RotatingLink::new(m(1.0)));
        let p1 = b.add("p1", r1, MassPoint::new(kg(1.0)));
        let r2 = b.add("r2", p1, RotatingLink::new(m(0.5)));
        b.add("p2", r2, MassPoint::new(kg(2.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let (eqs, acc, sys) = build(&mech, &mut g);
        assert_eq!(sys.coordinate_count(), 2);
        assert_eq!(sys.position_owners().len(), 5);

        let x = [0.7, -0.3, 1.9, 0.4];
        let bindings: HashMap<ExprId, f64> = eqs.state_symbols().into_iter().zip(x).collect();
        let a = sys.accelerations(0.0, &x).unwrap();
        for (i, &expr) in acc.exprs.iter().enumerate() {
            let direct = g.evaluate(expr, &bindings).unwrap();
            assert!((a[i] - direct).abs() < 1e-9 * direct.abs().max(1.0));
        }

        let dx = sys.rhs(0.0, &x).unwrap();
        assert_eq!(dx, vec![-0.3, a[0], 0.4, a[1]]);

        let pos = sys.positions(0.0, &x).unwrap();
        // p1 sits at the tip of r1
        assert!((pos[2][0] - 0.7_f64.sin()).abs() < 1e-12);
        assert!((pos[2][1] + 0.7_f64.cos()).abs() < 1e-12);
    }

    #[test]
    fn driven_anchor_reads_time_input() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root(
            "base",
            Anchor::driven(Trajectory::new(Drive::harmonic(0.3, 10.0), Drive::Fixed(0.0))),
        );
        let rod = b.add("rod", base, RotatingLink::new(m(1.0)));
        b.add("bob", rod, MassPoint::new(kg(1.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let (_, _, sys) = build(&mech, &mut g);
        let x = [0.5, 0.0];
        let a0 = sys.accelerations(0.0, &x).unwrap()[0];
        let a1 = sys.accelerations(0.1, &x).unwrap()[0];
        assert!((a0 - a1).abs() > 1e-6);

        // Base position follows the drive
        let pos = sys.positions(0.1, &x).unwrap();
        assert!((pos[0][0] - 0.3 * 1.0_f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn wrong_state_length_is_rejected() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let rod = b.add("rod", base, RotatingLink::new(m(1.0)));
        b.add("bob", rod, MassPoint::new(kg(1.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let (_, _, sys) = build(&mech, &mut g);
        assert!(matches!(
            sys.rhs(0.0, &[1.0, 2.0, 3.0]),
            Err(SolverError::Numeric { .. })
        ));
        assert!(sys.energy(0.0, &[0.0, 0.0]).unwrap() < 0.0);
    }
}
