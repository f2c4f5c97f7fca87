//! Error types for the derivation pipeline.

use lg_core::error::LgError;
use lg_symbolic::SymbolicError;
use lg_tree::TreeError;
use thiserror::Error;

/// Errors that can occur while deriving, solving or evaluating the equations
/// of motion.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] TreeError),

    #[error("Derivation error: {what}")]
    Derivation { what: String },

    #[error("Compilation error: {what}")]
    Compilation { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub(crate) fn derivation(e: SymbolicError) -> Self {
        SolverError::Derivation {
            what: e.to_string(),
        }
    }

    pub(crate) fn compilation(e: SymbolicError) -> Self {
        SolverError::Compilation {
            what: e.to_string(),
        }
    }

    pub(crate) fn numeric(e: SymbolicError) -> Self {
        SolverError::Numeric {
            what: e.to_string(),
        }
    }
}

impl From<SolverError> for LgError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Configuration(inner) => inner.into(),
            SolverError::Derivation { what: _ } => LgError::InvalidArg { what: "derivation" },
            SolverError::Compilation { what: _ } => LgError::InvalidArg {
                what: "compilation",
            },
            SolverError::ConvergenceFailed { what: _ } => LgError::InvalidArg {
                what: "convergence",
            },
            SolverError::Numeric { what: _ } => LgError::InvalidArg { what: "numeric" },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_failures_keep_their_message() {
        let err = SolverError::compilation(SymbolicError::UnboundAtom {
            name: "q0(t)".into(),
        });
        assert!(matches!(err, SolverError::Compilation { .. }));
        assert!(err.to_string().contains("q0(t)"));
        assert_eq!(
            LgError::from(err),
            LgError::InvalidArg {
                what: "compilation"
            }
        );
    }
}
