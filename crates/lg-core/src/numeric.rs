//! Float checks shared by parameter validation.

use crate::LgError;

/// Floating point type used throughout the system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, LgError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(LgError::NonFinite { what, value: v })
    }
}

/// Ensure a physical parameter is finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, LgError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(LgError::InvalidArg { what })
    }
}

/// Ensure a physical parameter is finite and not negative.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, LgError> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(LgError::InvalidArg { what })
    }
}
