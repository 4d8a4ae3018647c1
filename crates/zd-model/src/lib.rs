//! Blocks, activation functions, and the network context for 0D
//! cardiovascular models.
//!
//! A [`Model`] owns its blocks and numbers their variables through a
//! [`DofHandler`]. Each block writes fixed-pattern contributions into a
//! [`zd_algebra::SparseSystem`] during the constant, time, and solution
//! phases, and optionally fills a [`zd_algebra::GradientSystem`] with
//! parameter sensitivities.
//!
//! Quantities follow the CGS convention (pressure in dyn/cm², flow in
//! cm³/s, volume in cm³); nothing here converts units.

pub mod activation;
pub mod block;
pub mod blood_vessel;
pub mod blood_vessel_crl;
pub mod chamber;
pub mod config;
pub mod dofhandler;
pub mod error;
pub mod model;
pub mod parameter;

pub use activation::{
    ActivationFunction, ActivationKind, HalfCosineActivation, PiecewiseCosineActivation,
    TwoHillActivation, create_activation, create_activation_by_name,
};
pub use block::{Block, BlockCore, BlockState, BlockType, create_block};
pub use blood_vessel::BloodVessel;
pub use blood_vessel_crl::BloodVesselCRL;
pub use chamber::LinearElastanceChamber;
pub use config::{ActivationConfig, ModelConfig};
pub use dofhandler::{DofAssignment, DofHandler};
pub use error::{ModelError, ModelResult};
pub use model::Model;
pub use parameter::{ParameterDescriptor, ParameterValues};
