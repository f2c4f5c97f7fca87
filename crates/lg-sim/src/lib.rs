//! Frame loop for Lagrangian mechanisms.
//!
//! Provides:
//! - The `Simulation` lifecycle typestate (assemble, compile, run)
//! - Variable-order BDF stepper with Newton corrector and cutback retry
//! - Fixed-step RK4 as an alternative
//! - Frame snapshots, run records and recoverable diagnostics
//!
//! # Example
//!
//! ```
//! use lg_components::{Anchor, MassPoint, RotatingLink};
//! use lg_core::units::{kg, m};
//! use lg_sim::{SimOptions, Simulation};
//! use lg_tree::MechanismBuilder;
//!
//! let mut b = MechanismBuilder::new();
//! let base = b.add_root("base", Anchor::fixed(0.0, 0.0));
//! let rod = b.add("rod", base, RotatingLink::new(m(1.0)).with_initial(0.5, 0.0));
//! b.add("bob", rod, MassPoint::new(kg(1.0)));
//!
//! let sim = Simulation::new(b.build().unwrap(), SimOptions::default()).unwrap();
//! let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
//! let frame = running.step_frame().unwrap();
//! assert_eq!(frame.index, 1);
//! ```

pub mod error;
pub mod integrator;
pub mod model;
pub mod options;
pub mod record;
pub mod sim;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use integrator::{Bdf, BdfConfig, Integrator, IntegratorType, Rk4, Stepper};
pub use model::{MechanismModel, TransientModel};
pub use options::SimOptions;
pub use record::{
    ComponentPosition, Diagnostic, DiagnosticLog, Frame, MAX_DIAGNOSTICS, SimRecord,
};
pub use sim::{Assembled, Compiled, Running, Simulation, Unconfigured};
