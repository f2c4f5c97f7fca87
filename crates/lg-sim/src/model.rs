//! TransientModel trait for systems the steppers can advance.

use std::cell::Cell;

use lg_solver::CompiledSystem;
use nalgebra::DVector;

use crate::error::SimResult;

/// A first-order system `x' = f(t, x)` over a dense state vector.
pub trait TransientModel {
    /// Length of the state vector.
    fn dim(&self) -> usize;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes `&self` so implicit steppers can call it from inside their
    /// Newton closures; models that count or cache use interior mutability.
    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>>;
}

/// A compiled mechanism as a transient model.
pub struct MechanismModel<'a> {
    system: &'a CompiledSystem,
    evaluations: Cell<u64>,
}

impl<'a> MechanismModel<'a> {
    pub fn new(system: &'a CompiledSystem) -> Self {
        Self {
            system,
            evaluations: Cell::new(0),
        }
    }

    /// Number of right-hand side evaluations so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }
}

impl TransientModel for MechanismModel<'_> {
    fn dim(&self) -> usize {
        self.system.state_len()
    }

    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        self.evaluations.set(self.evaluations.get() + 1);
        let mut dx = DVector::zeros(x.len());
        self.system.rhs_into(t, x.as_slice(), dx.as_mut_slice())?;
        Ok(dx)
    }
}
