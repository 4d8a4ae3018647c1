//! Global sparse system `E·ẏ + F·y + C = 0` with tangent correction `D`.

use crate::budget::{Term, TripletBudget};
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::SparseMatrix;
use core::fmt;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};
use zd_core::Real;

/// Update phase a write belongs to. Only used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constant,
    Time,
    Solution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Constant => "constant",
            Phase::Time => "time",
            Phase::Solution => "solution",
        };
        f.write_str(s)
    }
}

/// Assembled contributions of every block in a model.
///
/// Rows are global equation indices, columns global variable indices. The
/// matrices are sized once in [`SparseSystem::new`] from the sum of the
/// blocks' triplet budgets.
#[derive(Debug, Clone)]
pub struct SparseSystem {
    e: SparseMatrix,
    f: SparseMatrix,
    d: SparseMatrix,
    c: DVector<Real>,
}

impl SparseSystem {
    pub fn new(num_equations: usize, num_variables: usize, budget: TripletBudget) -> Self {
        debug!(
            num_equations,
            num_variables,
            %budget,
            "reserving sparse system"
        );
        Self {
            e: SparseMatrix::new("E", num_equations, num_variables, budget.e),
            f: SparseMatrix::new("F", num_equations, num_variables, budget.f),
            d: SparseMatrix::new("D", num_equations, num_variables, budget.d),
            c: DVector::zeros(num_equations),
        }
    }

    pub fn num_equations(&self) -> usize {
        self.c.len()
    }

    pub fn num_variables(&self) -> usize {
        self.f.ncols()
    }

    /// Write a coefficient that depends on neither time nor solution.
    pub fn set_constant(
        &mut self,
        term: Term,
        eqn: usize,
        var: usize,
        value: Real,
    ) -> AlgebraResult<()> {
        self.write(Phase::Constant, term, eqn, var, value)
    }

    /// Write a constant right-hand-side entry.
    pub fn set_constant_rhs(&mut self, eqn: usize, value: Real) -> AlgebraResult<()> {
        self.write_rhs(Phase::Constant, eqn, value)
    }

    /// Write a coefficient that varies with explicit time only.
    pub fn set_time_dependent(
        &mut self,
        term: Term,
        eqn: usize,
        var: usize,
        value: Real,
    ) -> AlgebraResult<()> {
        self.write(Phase::Time, term, eqn, var, value)
    }

    /// Write a right-hand-side entry that varies with explicit time only.
    pub fn set_time_dependent_rhs(&mut self, eqn: usize, value: Real) -> AlgebraResult<()> {
        self.write_rhs(Phase::Time, eqn, value)
    }

    /// Write a coefficient evaluated at the current iterate `(y, ẏ)`.
    pub fn set_solution_dependent(
        &mut self,
        term: Term,
        eqn: usize,
        var: usize,
        value: Real,
    ) -> AlgebraResult<()> {
        self.write(Phase::Solution, term, eqn, var, value)
    }

    fn write(
        &mut self,
        phase: Phase,
        term: Term,
        eqn: usize,
        var: usize,
        value: Real,
    ) -> AlgebraResult<()> {
        trace!(%phase, %term, eqn, var, value, "sparse write");
        self.matrix_mut(term).set(eqn, var, value)
    }

    fn write_rhs(&mut self, phase: Phase, eqn: usize, value: Real) -> AlgebraResult<()> {
        trace!(%phase, eqn, value, "rhs write");
        let len = self.c.len();
        let slot = self.c.get_mut(eqn).ok_or(AlgebraError::IndexOutOfRange {
            matrix: "C",
            row: eqn,
            col: 0,
            rows: len,
            cols: 1,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn matrix(&self, term: Term) -> &SparseMatrix {
        match term {
            Term::E => &self.e,
            Term::F => &self.f,
            Term::D => &self.d,
        }
    }

    fn matrix_mut(&mut self, term: Term) -> &mut SparseMatrix {
        match term {
            Term::E => &mut self.e,
            Term::F => &mut self.f,
            Term::D => &mut self.d,
        }
    }

    pub fn e(&self) -> &SparseMatrix {
        &self.e
    }

    pub fn f(&self) -> &SparseMatrix {
        &self.f
    }

    pub fn d(&self) -> &SparseMatrix {
        &self.d
    }

    pub fn c(&self) -> &DVector<Real> {
        &self.c
    }

    /// Reserved entry counts per matrix.
    pub fn reserved(&self) -> TripletBudget {
        TripletBudget {
            f: self.f.capacity().unwrap_or(0),
            e: self.e.capacity().unwrap_or(0),
            d: self.d.capacity().unwrap_or(0),
        }
    }

    /// Distinct entries written so far per matrix.
    pub fn used(&self) -> TripletBudget {
        TripletBudget {
            f: self.f.nnz(),
            e: self.e.nnz(),
            d: self.d.nnz(),
        }
    }

    /// Residual `-(E·ẏ + F·y + C)` at the given iterate.
    pub fn residual(&self, y: &DVector<Real>, ydot: &DVector<Real>) -> AlgebraResult<DVector<Real>> {
        let mut r = self.e.mul_vector(ydot)?;
        r += self.f.mul_vector(y)?;
        r += &self.c;
        Ok(-r)
    }

    /// Newton tangent `F + D + e_coeff·E`.
    ///
    /// `e_coeff` is the integrator's `∂ẏ/∂y` factor for the current step.
    pub fn jacobian(&self, e_coeff: Real) -> DMatrix<Real> {
        let mut jac = self.f.to_dense();
        for (row, col, value) in self.d.iter() {
            jac[(row, col)] += value;
        }
        for (row, col, value) in self.e.iter() {
            jac[(row, col)] += e_coeff * value;
        }
        jac
    }
}
