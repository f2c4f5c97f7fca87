//! Simulation options.

use lg_core::units::{Accel, constants};
use lg_solver::NewtonConfig;
use lg_symbolic::DEFAULT_MAX_NODES;

use crate::error::{SimError, SimResult};
use crate::integrator::{BdfConfig, IntegratorType};

/// Options for a simulation run.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Frame interval (seconds)
    pub dt: f64,
    /// Integration sub-steps per frame
    pub subintegrations: usize,
    /// Downward gravitational acceleration
    pub gravity: Accel,
    /// Integrator type (default: BDF)
    pub integrator: IntegratorType,
    /// Highest BDF order
    pub max_order: usize,
    /// Absolute Newton residual tolerance of the BDF corrector
    pub newton_tol: f64,
    /// Newton iterations per corrector solve
    pub newton_max_iter: usize,
    /// Retries with a shorter step before a sub-step is given up
    pub max_cutbacks: usize,
    /// Step shrink factor per retry
    pub cutback_factor: f64,
    /// Relative finite difference perturbation for the Jacobian
    pub jacobian_epsilon: f64,
    /// Term budget of each simplification
    pub simplify_node_budget: usize,
    /// Hard limit on expression graph size
    pub max_graph_nodes: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1.0 / 30.0,
            subintegrations: 10,
            gravity: constants::g0(),
            integrator: IntegratorType::default(),
            max_order: 5,
            newton_tol: 1e-10,
            newton_max_iter: 25,
            max_cutbacks: 4,
            cutback_factor: 0.5,
            jacobian_epsilon: 1e-7,
            simplify_node_budget: 20_000,
            max_graph_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if self.subintegrations == 0 {
            return Err(SimError::InvalidArg {
                what: "subintegrations must be positive",
            });
        }
        if !self.gravity.value.is_finite() {
            return Err(SimError::InvalidArg {
                what: "gravity must be finite",
            });
        }
        if !(1..=5).contains(&self.max_order) {
            return Err(SimError::InvalidArg {
                what: "max_order must be between 1 and 5",
            });
        }
        if !(self.newton_tol > 0.0) || self.newton_max_iter == 0 {
            return Err(SimError::InvalidArg {
                what: "Newton tolerance and iteration limit must be positive",
            });
        }
        if !(self.cutback_factor > 0.0 && self.cutback_factor < 1.0) {
            return Err(SimError::InvalidArg {
                what: "cutback_factor must be in (0, 1)",
            });
        }
        if !(self.jacobian_epsilon > 0.0) {
            return Err(SimError::InvalidArg {
                what: "jacobian_epsilon must be positive",
            });
        }
        if self.simplify_node_budget == 0 || self.max_graph_nodes == 0 {
            return Err(SimError::InvalidArg {
                what: "node budgets must be positive",
            });
        }
        Ok(())
    }

    /// Length of one integration sub-step.
    pub fn substep(&self) -> f64 {
        self.dt / self.subintegrations as f64
    }

    pub fn bdf_config(&self) -> BdfConfig {
        BdfConfig {
            max_order: self.max_order,
            newton: NewtonConfig {
                max_iterations: self.newton_max_iter,
                abs_tol: self.newton_tol,
                ..NewtonConfig::default()
            },
            jacobian_epsilon: self.jacobian_epsilon,
            max_cutbacks: self.max_cutbacks,
            cutback_factor: self.cutback_factor,
        }
    }
}
