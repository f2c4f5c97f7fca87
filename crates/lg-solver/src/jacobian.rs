//! Finite difference Jacobian of a vector field.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Compute the Jacobian of `f` at `x` using forward finite differences.
///
/// Column j is `(f(x + dx e_j) - f(x)) / dx` with `dx = epsilon * max(|x_j|, 1)`.
/// `f_x` is `f(x)` when the caller already has it.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f_x: Option<&DVector<f64>>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let base = match f_x {
        Some(v) => v.clone(),
        None => f(x)?,
    };
    let m = base.len();

    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - &base) / dx;
        jac.set_column(j, &df);

        x_perturbed[j] = x[j];
    }

    Ok(jac)
}
