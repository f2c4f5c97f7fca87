//! Error types for symbolic operations.

use thiserror::Error;

/// Errors raised by the algebra engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    #[error("Expression graph exceeded its node budget ({limit} nodes)")]
    CapacityExceeded { limit: usize },

    #[error("Cannot differentiate with respect to non-atomic expression {what}")]
    NotAnAtom { what: String },

    #[error("Equation {equation} is not linear in the requested unknowns")]
    Nonlinear { equation: usize },

    #[error("Unbound atom {name}")]
    UnboundAtom { name: String },

    #[error("Non-finite constant {value} cannot be compiled")]
    NonFiniteConstant { value: f64 },

    #[error("Input length mismatch: expected {expected}, got {actual}")]
    InputLength { expected: usize, actual: usize },

    #[error("Output buffer length mismatch: expected {expected}, got {actual}")]
    OutputLength { expected: usize, actual: usize },
}

pub type SymbolicResult<T> = Result<T, SymbolicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SymbolicError::UnboundAtom {
            name: "q0(t)".into(),
        };
        assert!(err.to_string().contains("q0(t)"));
    }
}
