//! Error types for sparse assembly.

use thiserror::Error;
use zd_core::CoreError;

/// Errors raised while writing to or reading from assembled systems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    #[error("Entry ({row}, {col}) out of range for {matrix} matrix of size {rows}x{cols}")]
    IndexOutOfRange {
        matrix: &'static str,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Triplet budget exceeded for {matrix} matrix: capacity {capacity}, new entry ({row}, {col})")]
    BudgetExceeded {
        matrix: &'static str,
        capacity: usize,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type AlgebraResult<T> = Result<T, AlgebraError>;

impl From<AlgebraError> for CoreError {
    fn from(e: AlgebraError) -> Self {
        match e {
            AlgebraError::IndexOutOfRange { matrix, row, rows, .. } => CoreError::IndexOob {
                what: matrix,
                index: row,
                len: rows,
            },
            AlgebraError::DimensionMismatch {
                what,
                expected,
                actual,
            } => CoreError::IndexOob {
                what,
                index: actual,
                len: expected,
            },
            other => CoreError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
