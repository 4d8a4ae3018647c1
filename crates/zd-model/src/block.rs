//! Block contract shared by every network element.
//!
//! A block owns a fixed set of global variables and equations and writes its
//! contributions into the global [`SparseSystem`] in phases:
//!
//! 1. [`Block::setup_dofs`] once, registering indices with the [`DofHandler`]
//! 2. [`Block::update_constant`] once per topology build
//! 3. [`Block::update_time`] once per time step
//! 4. [`Block::update_solution`] once per nonlinear iteration
//!
//! [`Block::update_gradient`] fills the parameter Jacobian on demand.
//! Phases a variant does not need keep the default no-op.

use crate::activation::ActivationFunction;
use crate::blood_vessel::BloodVessel;
use crate::blood_vessel_crl::BloodVesselCRL;
use crate::chamber::LinearElastanceChamber;
use crate::dofhandler::DofHandler;
use crate::error::{ModelError, ModelResult};
use crate::parameter::{ParameterDescriptor, ParameterValues};
use core::fmt;
use core::str::FromStr;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use zd_algebra::{AlgebraError, GradientSystem, SparseSystem, TripletBudget};
use zd_core::{BlockId, Real};

/// Available block variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    BloodVessel,
    BloodVesselCRL,
    LinearElastanceChamber,
}

impl BlockType {
    pub const ALL: [BlockType; 3] = [
        BlockType::BloodVessel,
        BlockType::BloodVesselCRL,
        BlockType::LinearElastanceChamber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::BloodVessel => "BloodVessel",
            BlockType::BloodVesselCRL => "BloodVesselCRL",
            BlockType::LinearElastanceChamber => "LinearElastanceChamber",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ModelError::UnknownBlockType {
                name: s.to_string(),
            })
    }
}

/// Construct a block of the given type with default parameter values.
pub fn create_block(block_type: BlockType, id: BlockId, name: &str) -> Box<dyn Block> {
    match block_type {
        BlockType::BloodVessel => Box::new(BloodVessel::new(id, name)),
        BlockType::BloodVesselCRL => Box::new(BloodVesselCRL::new(id, name)),
        BlockType::LinearElastanceChamber => Box::new(LinearElastanceChamber::new(id, name)),
    }
}

/// Lifecycle of a block within one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Unregistered,
    DofsAssigned,
    ConstantsWritten,
    TimeUpdated,
    SolutionUpdated,
}

impl BlockState {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockState::Unregistered => "Unregistered",
            BlockState::DofsAssigned => "DofsAssigned",
            BlockState::ConstantsWritten => "ConstantsWritten",
            BlockState::TimeUpdated => "TimeUpdated",
            BlockState::SolutionUpdated => "SolutionUpdated",
        }
    }

    /// Whether moving from `self` to `next` respects the phase order.
    pub fn allows(self, next: BlockState) -> bool {
        use BlockState::*;
        match next {
            Unregistered => false,
            DofsAssigned => self == Unregistered,
            ConstantsWritten => self != Unregistered,
            TimeUpdated | SolutionUpdated => {
                matches!(self, ConstantsWritten | TimeUpdated | SolutionUpdated)
            }
        }
    }
}

/// State every block carries: identity, parameters, and global indices.
#[derive(Debug, Clone)]
pub struct BlockCore {
    id: BlockId,
    name: String,
    params: ParameterValues,
    global_var_ids: Vec<usize>,
    global_eqn_ids: Vec<usize>,
    global_param_ids: Vec<usize>,
    state: BlockState,
}

impl BlockCore {
    pub fn new(id: BlockId, name: &str, descriptors: Vec<ParameterDescriptor>) -> Self {
        Self {
            id,
            name: name.to_string(),
            params: ParameterValues::new(format!("block '{name}'"), descriptors),
            global_var_ids: Vec::new(),
            global_eqn_ids: Vec::new(),
            global_param_ids: Vec::new(),
            state: BlockState::Unregistered,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ParameterValues {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterValues {
        &mut self.params
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn global_var_ids(&self) -> &[usize] {
        &self.global_var_ids
    }

    pub fn global_eqn_ids(&self) -> &[usize] {
        &self.global_eqn_ids
    }

    pub fn global_param_ids(&self) -> &[usize] {
        &self.global_param_ids
    }

    /// Global index of local variable `local`.
    pub fn var(&self, local: usize) -> usize {
        self.global_var_ids[local]
    }

    /// Global index of local equation `local`.
    pub fn eqn(&self, local: usize) -> usize {
        self.global_eqn_ids[local]
    }

    /// Value of local parameter slot `local` in the global vector.
    pub fn param(&self, parameters: &[Real], local: usize) -> Real {
        parameters[self.global_param_ids[local]]
    }

    /// Register this block's variables and equations.
    pub fn setup_dofs_(
        &mut self,
        dofs: &mut DofHandler,
        num_equations: usize,
        internal_variables: &[&str],
    ) -> ModelResult<()> {
        self.check_transition(BlockState::DofsAssigned, "register DOFs")?;
        let assignment = dofs.register(&self.name, num_equations, internal_variables)?;
        self.global_var_ids = assignment.variables;
        self.global_eqn_ids = assignment.equations;
        self.state = BlockState::DofsAssigned;
        Ok(())
    }

    /// Append this block's numeric parameter values to the global vector,
    /// in declaration order, and remember where they went.
    pub fn register_parameters(&mut self, parameters: &mut Vec<Real>) {
        self.global_param_ids = self
            .params
            .numeric()
            .map(|(_, value)| {
                parameters.push(value);
                parameters.len() - 1
            })
            .collect();
    }

    /// Fail unless indices have been assigned, parameters registered, and
    /// `parameters` covers every registered slot.
    pub fn ensure_registered(&self, what: &'static str, parameters: &[Real]) -> ModelResult<()> {
        if self.state == BlockState::Unregistered
            || self.global_param_ids.len() != self.params.numeric().count()
        {
            return Err(self.phase_error(what));
        }
        covers("parameters", &self.global_param_ids, parameters.len())
    }

    /// Fail unless `y` and `ydot` cover every variable of this block.
    pub fn check_state(&self, y: &DVector<Real>, ydot: &DVector<Real>) -> ModelResult<()> {
        covers("y", &self.global_var_ids, y.len())?;
        covers("ydot", &self.global_var_ids, ydot.len())
    }

    pub fn check_transition(&self, next: BlockState, what: &'static str) -> ModelResult<()> {
        if self.state.allows(next) {
            Ok(())
        } else {
            Err(self.phase_error(what))
        }
    }

    pub(crate) fn set_state(&mut self, next: BlockState) {
        self.state = next;
    }

    fn phase_error(&self, what: &'static str) -> ModelError {
        ModelError::PhaseOrder {
            block: self.name.clone(),
            what,
            state: self.state.as_str(),
        }
    }
}

fn covers(what: &'static str, ids: &[usize], actual: usize) -> ModelResult<()> {
    match ids.iter().max() {
        Some(&max) if max >= actual => Err(AlgebraError::DimensionMismatch {
            what,
            expected: max + 1,
            actual,
        }
        .into()),
        _ => Ok(()),
    }
}

/// Interface every network element implements.
pub trait Block: Send + Sync + fmt::Debug {
    fn core(&self) -> &BlockCore;

    fn core_mut(&mut self) -> &mut BlockCore;

    fn block_type(&self) -> BlockType;

    /// Upper bound on entries this block writes into `F`, `E`, and `D`.
    fn num_triplets(&self) -> TripletBudget;

    fn id(&self) -> BlockId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Register global variables and equations.
    fn setup_dofs(&mut self, dofs: &mut DofHandler) -> ModelResult<()>;

    /// Write contributions that depend on neither time nor solution.
    fn update_constant(&mut self, system: &mut SparseSystem, parameters: &[Real])
    -> ModelResult<()>;

    /// Write contributions that depend on explicit time.
    fn update_time(
        &mut self,
        _system: &mut SparseSystem,
        _parameters: &[Real],
        _time: Real,
    ) -> ModelResult<()> {
        Ok(())
    }

    /// Write contributions that depend on the current iterate.
    fn update_solution(
        &mut self,
        _system: &mut SparseSystem,
        _parameters: &[Real],
        _y: &DVector<Real>,
        _ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        Ok(())
    }

    /// Write `∂r/∂α` and `r` for this block's equations at parameters `alpha`.
    fn update_gradient(
        &mut self,
        _gradient: &mut GradientSystem,
        _alpha: &DVector<Real>,
        _y: &DVector<Real>,
        _ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        Err(ModelError::NotSupported {
            what: format!("gradient calculation for {} blocks", self.block_type()),
        })
    }

    /// Hand an activation function to this block, which then owns it.
    fn set_activation_function(
        &mut self,
        _activation: Box<dyn ActivationFunction>,
    ) -> ModelResult<()> {
        Err(ModelError::NotSupported {
            what: format!("activation functions on {} blocks", self.block_type()),
        })
    }
}
