//! Parameter Jacobian and residual used for sensitivity/calibration.

use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::SparseMatrix;
use nalgebra::DVector;
use zd_core::Real;

/// `∂r/∂α` (equations × parameters) and the residual `r` itself.
///
/// Filled by blocks' gradient updates at a given iterate and parameter
/// vector. The forward solve never reads it.
#[derive(Debug, Clone)]
pub struct GradientSystem {
    jacobian: SparseMatrix,
    residual: DVector<Real>,
}

impl GradientSystem {
    pub fn new(num_equations: usize, num_params: usize) -> Self {
        Self {
            jacobian: SparseMatrix::unbounded("dR/dalpha", num_equations, num_params),
            residual: DVector::zeros(num_equations),
        }
    }

    pub fn num_equations(&self) -> usize {
        self.residual.len()
    }

    pub fn num_params(&self) -> usize {
        self.jacobian.ncols()
    }

    /// Write `∂r_eqn/∂α_param`.
    pub fn set_gradient(&mut self, eqn: usize, param: usize, value: Real) -> AlgebraResult<()> {
        self.jacobian.set(eqn, param, value)
    }

    /// Write the residual of equation `eqn`.
    pub fn set_residual(&mut self, eqn: usize, value: Real) -> AlgebraResult<()> {
        let len = self.residual.len();
        let slot = self.residual.get_mut(eqn).ok_or(AlgebraError::IndexOutOfRange {
            matrix: "residual",
            row: eqn,
            col: 0,
            rows: len,
            cols: 1,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn jacobian(&self) -> &SparseMatrix {
        &self.jacobian
    }

    pub fn residual(&self) -> &DVector<Real> {
        &self.residual
    }

    /// Zero values in place so a new evaluation starts clean.
    pub fn clear(&mut self) {
        self.jacobian.clear_values();
        self.residual.fill(0.0);
    }
}
