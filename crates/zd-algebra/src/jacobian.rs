//! Finite-difference Jacobians, used to check analytic block derivatives.
//!
//! Column `j` perturbs `x[j]` by `epsilon · max(|x[j]|, 1)`.

use nalgebra::{DMatrix, DVector};
use zd_core::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Forward,
    Central,
}

/// `(f(x + h·e_j) - f(x)) / h` per column.
pub fn finite_difference_jacobian<F, E>(
    x: &DVector<Real>,
    f: F,
    epsilon: Real,
) -> Result<DMatrix<Real>, E>
where
    F: Fn(&DVector<Real>) -> Result<DVector<Real>, E>,
{
    difference_jacobian(x, f, epsilon, Scheme::Forward)
}

/// `(f(x + h·e_j) - f(x - h·e_j)) / 2h` per column. Twice the evaluations
/// of the forward scheme, second-order accurate.
pub fn central_difference_jacobian<F, E>(
    x: &DVector<Real>,
    f: F,
    epsilon: Real,
) -> Result<DMatrix<Real>, E>
where
    F: Fn(&DVector<Real>) -> Result<DVector<Real>, E>,
{
    difference_jacobian(x, f, epsilon, Scheme::Central)
}

fn difference_jacobian<F, E>(
    x: &DVector<Real>,
    f: F,
    epsilon: Real,
    scheme: Scheme,
) -> Result<DMatrix<Real>, E>
where
    F: Fn(&DVector<Real>) -> Result<DVector<Real>, E>,
{
    let base = f(x)?;
    let mut jac = DMatrix::zeros(base.len(), x.len());
    let mut shifted = x.clone();

    for j in 0..x.len() {
        let h = epsilon * x[j].abs().max(1.0);

        shifted[j] = x[j] + h;
        let upper = f(&shifted)?;
        let column = match scheme {
            Scheme::Forward => (upper - &base) / h,
            Scheme::Central => {
                shifted[j] = x[j] - h;
                let lower = f(&shifted)?;
                (upper - lower) / (2.0 * h)
            }
        };
        shifted[j] = x[j];

        jac.set_column(j, &column);
    }

    Ok(jac)
}
