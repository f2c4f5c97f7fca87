//! Error types for component parameters.

use lg_core::error::LgError;
use thiserror::Error;

/// Errors raised while validating component parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Coordinate slice for {what} has length {actual}, expected {expected}")]
    StateLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<LgError> for ComponentError {
    fn from(e: LgError) -> Self {
        match e {
            LgError::NonFinite { what, value } => ComponentError::NonPhysical { what, value },
            LgError::InvalidArg { what } => ComponentError::InvalidArg { what },
            LgError::IndexOob { what, .. } => ComponentError::InvalidArg { what },
            LgError::Invariant { what } => ComponentError::InvalidArg { what },
        }
    }
}

impl From<ComponentError> for LgError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::NonPhysical { what, value } => LgError::NonFinite { what, value },
            ComponentError::InvalidArg { what } => LgError::InvalidArg { what },
            ComponentError::StateLength {
                what,
                expected,
                actual,
            } => LgError::IndexOob {
                what,
                index: actual,
                len: expected,
            },
        }
    }
}
