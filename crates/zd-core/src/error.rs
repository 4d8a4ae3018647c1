use thiserror::Error;

/// Errors shared across crates, for callers that do not care which layer
/// failed. Layer-specific errors convert into this.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{what} is not finite ({value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("{what} index {index} out of range for length {len}")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("invariant violated: {what}")]
    Invariant { what: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
