//! Error types for model setup and block updates.

use thiserror::Error;
use zd_algebra::AlgebraError;
use zd_core::{BlockId, CoreError};

/// Errors raised while building a model or assembling its contributions.
///
/// None of these are retried internally; the caller decides whether to try
/// again with different inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(
        "Unknown activation_function type '{name}'. Must be one of: half_cosine, piecewise_cosine, two_hill"
    )]
    UnknownActivation { name: String },

    #[error(
        "Unknown block type '{name}'. Must be one of: BloodVessel, BloodVesselCRL, LinearElastanceChamber"
    )]
    UnknownBlockType { name: String },

    #[error("Parameter '{name}' is not declared by {owner}")]
    UnknownParameter { owner: String, name: String },

    #[error("Parameter '{name}' of {owner} is not numeric")]
    NonNumericParameter { owner: String, name: String },

    #[error("Cardiac period must be positive and finite (got {value})")]
    InvalidCardiacPeriod { value: f64 },

    #[error(
        "Max activation value must be positive and finite (got {value}). Check tau_1, tau_2, m1, m2 are valid (e.g., tau_1 > 0, tau_2 > 0)"
    )]
    DegenerateNormalization { value: f64 },

    #[error("{what}: call finalize() after setting parameters")]
    NotFinalized { what: &'static str },

    #[error("Block '{block}' has no activation function")]
    MissingActivation { block: String },

    #[error("Not supported: {what}")]
    NotSupported { what: String },

    #[error("Block '{block}' cannot {what} in state {state}")]
    PhaseOrder {
        block: String,
        what: &'static str,
        state: &'static str,
    },

    #[error("Model is already finalized; {what}")]
    AlreadyFinalized { what: &'static str },

    #[error("Model is not finalized; {what}")]
    NotAssembled { what: &'static str },

    #[error("Unknown block id {id}")]
    UnknownBlock { id: BlockId },

    #[error("Duplicate name '{name}'")]
    DuplicateName { name: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Assembly error: {0}")]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Algebra(inner) => inner.into(),
            ModelError::Core(inner) => inner,
            ModelError::InvalidCardiacPeriod { value } => CoreError::InvalidArg {
                what: format!("cardiac period {value}"),
            },
            order @ (ModelError::PhaseOrder { .. }
            | ModelError::NotFinalized { .. }
            | ModelError::AlreadyFinalized { .. }
            | ModelError::NotAssembled { .. }) => CoreError::Invariant {
                what: order.to_string(),
            },
            other => CoreError::InvalidArg {
                what: other.to_string(),
            },
        }
    }
}
