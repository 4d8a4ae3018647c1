//! Keyed sparse matrix with overwrite semantics and fixed capacity.

use crate::error::{AlgebraError, AlgebraResult};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CscMatrix, coo::CooMatrix};
use std::collections::HashMap;
use zd_core::Real;

/// Sparse matrix whose entries are addressed by `(row, col)`.
///
/// Writing an existing key overwrites its value. Writing a new key appends
/// to the sparsity pattern, which is bounded by `capacity` when one is set.
/// The pattern only ever grows; [`SparseMatrix::clear_values`] zeroes the
/// values in place.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    label: &'static str,
    rows: usize,
    cols: usize,
    capacity: Option<usize>,
    slots: HashMap<(usize, usize), usize>,
    entries: Vec<(usize, usize, Real)>,
}

impl SparseMatrix {
    /// Create an empty matrix that accepts at most `capacity` distinct keys.
    pub fn new(label: &'static str, rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            label,
            rows,
            cols,
            capacity: Some(capacity),
            slots: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Create an empty matrix with no limit on the number of keys.
    pub fn unbounded(label: &'static str, rows: usize, cols: usize) -> Self {
        Self {
            label,
            rows,
            cols,
            capacity: None,
            slots: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Reserved number of distinct entries, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of distinct keys written so far.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Overwrite the value stored at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: Real) -> AlgebraResult<()> {
        if row >= self.rows || col >= self.cols {
            return Err(AlgebraError::IndexOutOfRange {
                matrix: self.label,
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        if let Some(&slot) = self.slots.get(&(row, col)) {
            self.entries[slot].2 = value;
            return Ok(());
        }

        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity {
                return Err(AlgebraError::BudgetExceeded {
                    matrix: self.label,
                    capacity,
                    row,
                    col,
                });
            }
        }

        self.slots.insert((row, col), self.entries.len());
        self.entries.push((row, col, value));
        Ok(())
    }

    /// Value at `(row, col)`, or `None` if the key was never written.
    pub fn get(&self, row: usize, col: usize) -> Option<Real> {
        self.slots.get(&(row, col)).map(|&slot| self.entries[slot].2)
    }

    /// Value at `(row, col)`, treating unwritten keys as zero.
    pub fn value(&self, row: usize, col: usize) -> Real {
        self.get(row, col).unwrap_or(0.0)
    }

    /// Iterate over `(row, col, value)` in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Real)> + '_ {
        self.entries.iter().copied()
    }

    /// Zero every stored value while keeping the sparsity pattern.
    pub fn clear_values(&mut self) {
        for entry in &mut self.entries {
            entry.2 = 0.0;
        }
    }

    /// Compute `A·x`.
    pub fn mul_vector(&self, x: &DVector<Real>) -> AlgebraResult<DVector<Real>> {
        if x.len() != self.cols {
            return Err(AlgebraError::DimensionMismatch {
                what: "matrix-vector product",
                expected: self.cols,
                actual: x.len(),
            });
        }
        let mut out = DVector::zeros(self.rows);
        for &(row, col, value) in &self.entries {
            out[row] += value * x[col];
        }
        Ok(out)
    }

    pub fn to_dense(&self) -> DMatrix<Real> {
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for &(row, col, value) in &self.entries {
            dense[(row, col)] = value;
        }
        dense
    }

    /// Compressed sparse column copy, for handing to a sparse linear solver.
    pub fn to_csc(&self) -> CscMatrix<Real> {
        let mut coo = CooMatrix::new(self.rows, self.cols);
        for &(row, col, value) in &self.entries {
            coo.push(row, col, value);
        }
        CscMatrix::from(&coo)
    }
}
