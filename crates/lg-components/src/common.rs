//! Parameter checks shared by the component variants.

use crate::error::{ComponentError, ComponentResult};
use lg_core::numeric::{ensure_finite, ensure_non_negative, ensure_positive};

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what, value })?;
    Ok(())
}

/// Masses, lengths and radii must be finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_positive(value, what).map_err(|_| ComponentError::NonPhysical { what, value })?;
    Ok(())
}

/// Stiffness and damping coefficients may be zero but never negative.
pub fn check_non_negative(value: f64, what: &'static str) -> ComponentResult<()> {
    ensure_non_negative(value, what).map_err(|_| ComponentError::NonPhysical { what, value })?;
    Ok(())
}

/// Check that a coordinate slice handed to `update` has the expected length.
pub fn check_state_len(state: &[f64], expected: usize, what: &'static str) -> ComponentResult<()> {
    if state.len() == expected {
        Ok(())
    } else {
        Err(ComponentError::StateLength {
            what,
            expected,
            actual: state.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, "test").is_ok());
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_check_positive() {
        assert!(check_positive(0.5, "mass").is_ok());
        assert!(matches!(
            check_positive(0.0, "mass"),
            Err(ComponentError::NonPhysical { what: "mass", .. })
        ));
        assert!(check_non_negative(0.0, "damping").is_ok());
        assert!(check_non_negative(-0.1, "damping").is_err());
    }

    #[test]
    fn test_state_len() {
        assert!(check_state_len(&[0.0, 1.0], 2, "link").is_ok());
        assert!(check_state_len(&[0.0], 2, "link").is_err());
    }
}
