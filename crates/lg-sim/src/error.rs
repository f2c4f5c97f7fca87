//! Error types for simulation operations.

use lg_solver::SolverError;
use lg_tree::TreeError;
use thiserror::Error;

/// Errors encountered while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Configuration error: {0}")]
    Configuration(#[from] TreeError),

    #[error("Derivation error: {what}")]
    Derivation { what: String },

    #[error("Compilation error: {what}")]
    Compilation { what: String },

    /// A single integration step could not be completed. The frame loop
    /// recovers from this; it only escapes from direct integrator use.
    #[error("Step failed: {message}")]
    StepFailed { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<SolverError> for SimError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Configuration(inner) => SimError::Configuration(inner),
            SolverError::Derivation { what } => SimError::Derivation { what },
            SolverError::Compilation { what } => SimError::Compilation { what },
            other => SimError::StepFailed {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_errors_map_to_pipeline_phase() {
        let e: SimError = SolverError::Derivation { what: "x".into() }.into();
        assert!(matches!(e, SimError::Derivation { .. }));
        let e: SimError = SolverError::Numeric { what: "nan".into() }.into();
        assert!(matches!(e, SimError::StepFailed { .. }));
    }
}
