//! Network context: owns the blocks, the DOF numbering, and the global
//! parameter vector, and drives every block through the update phases.

use crate::activation::{ActivationFunction, create_activation_by_name};
use crate::block::{Block, BlockState, BlockType, create_block};
use crate::config::ModelConfig;
use crate::dofhandler::DofHandler;
use crate::error::{ModelError, ModelResult};
use nalgebra::DVector;
use std::collections::HashMap;
use tracing::{debug, trace};
use zd_algebra::{AlgebraError, GradientSystem, SparseSystem, TripletBudget};
use zd_core::{BlockId, Real};

/// A lumped-parameter network under construction or assembly.
///
/// Blocks are added and configured first; [`Model::finalize`] then fixes the
/// DOF numbering and returns a [`SparseSystem`] reserved for exactly the
/// blocks' declared budgets. After that the phase calls may run in order:
///
/// ```
/// use nalgebra::DVector;
/// use zd_model::{BlockType, Model, ModelConfig};
///
/// let mut model = Model::new(ModelConfig::default()).unwrap();
/// let vessel = model.add_block(BlockType::BloodVessel, "BV0").unwrap();
/// model.set_block_param(vessel, "R_poiseuille", 100.0).unwrap();
///
/// let mut system = model.finalize().unwrap();
/// model.update_constant(&mut system).unwrap();
/// model.update_time(&mut system, 0.0).unwrap();
///
/// let y = DVector::from_row_slice(&[10.0, 0.1, 0.0, 0.1]);
/// let ydot = DVector::zeros(4);
/// model.update_solution(&mut system, &y, &ydot).unwrap();
/// assert_eq!(system.f().get(0, 1), Some(-100.0));
/// ```
#[derive(Debug)]
pub struct Model {
    config: ModelConfig,
    blocks: Vec<Box<dyn Block>>,
    by_name: HashMap<String, BlockId>,
    dofs: DofHandler,
    parameters: Vec<Real>,
    time: Real,
    finalized: bool,
}

impl Model {
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            blocks: Vec::new(),
            by_name: HashMap::new(),
            dofs: DofHandler::new(),
            parameters: Vec::new(),
            time: 0.0,
            finalized: false,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Add a block with default parameters and return its id.
    pub fn add_block(&mut self, block_type: BlockType, name: &str) -> ModelResult<BlockId> {
        if self.finalized {
            return Err(ModelError::AlreadyFinalized {
                what: "cannot add blocks",
            });
        }
        if self.by_name.contains_key(name) {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        let id = BlockId::try_from(self.blocks.len()).map_err(|index| ModelError::InvalidArg {
            what: format!("block index {index} exceeds the id range"),
        })?;

        self.blocks.push(create_block(block_type, id, name));
        self.by_name.insert(name.to_string(), id);
        trace!(%id, block = name, %block_type, "block added");
        Ok(id)
    }

    /// Set a numeric parameter on a block.
    ///
    /// After [`Model::finalize`] the global parameter vector is updated too,
    /// so the next phase call sees the new value.
    pub fn set_block_param(&mut self, id: BlockId, name: &str, value: Real) -> ModelResult<()> {
        let finalized = self.finalized;
        let block = self.block_entry_mut(id)?;
        block.core_mut().params_mut().set(name, value)?;
        if finalized {
            let slot = block.core().params().numeric_slot(name)?;
            let global = block.core().global_param_ids()[slot];
            self.parameters[global] = value;
        }
        Ok(())
    }

    /// Create an activation function for this model's cardiac period.
    pub fn create_activation(&self, name: &str) -> ModelResult<Box<dyn ActivationFunction>> {
        create_activation_by_name(name, self.config.cardiac_period)
    }

    /// Move `activation` into the block, which owns it from then on.
    pub fn set_activation_function(
        &mut self,
        id: BlockId,
        activation: Box<dyn ActivationFunction>,
    ) -> ModelResult<()> {
        self.block_entry_mut(id)?.set_activation_function(activation)
    }

    /// Number variables and equations, register parameters, and reserve the
    /// system for the summed triplet budgets.
    pub fn finalize(&mut self) -> ModelResult<SparseSystem> {
        if self.finalized {
            return Err(ModelError::AlreadyFinalized {
                what: "finalize() may run once",
            });
        }
        for block in &mut self.blocks {
            block.setup_dofs(&mut self.dofs)?;
        }
        for block in &mut self.blocks {
            block.core_mut().register_parameters(&mut self.parameters);
        }
        self.finalized = true;

        let budget = self.num_triplets();
        debug!(
            blocks = self.blocks.len(),
            variables = self.dofs.num_variables(),
            equations = self.dofs.num_equations(),
            parameters = self.parameters.len(),
            %budget,
            "model finalized"
        );
        Ok(SparseSystem::new(
            self.dofs.num_equations(),
            self.dofs.num_variables(),
            budget,
        ))
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn update_constant(&mut self, system: &mut SparseSystem) -> ModelResult<()> {
        self.check_system(system, "update constants")?;
        self.run_phase(BlockState::ConstantsWritten, "update constants", |block, params| {
            block.update_constant(system, params)
        })
    }

    pub fn update_time(&mut self, system: &mut SparseSystem, time: Real) -> ModelResult<()> {
        self.check_system(system, "update time")?;
        if !time.is_finite() {
            return Err(ModelError::InvalidArg {
                what: format!("time must be finite (got {time})"),
            });
        }
        self.run_phase(BlockState::TimeUpdated, "update time", |block, params| {
            block.update_time(system, params, time)
        })?;
        self.time = time;
        Ok(())
    }

    pub fn update_solution(
        &mut self,
        system: &mut SparseSystem,
        y: &DVector<Real>,
        ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        self.check_system(system, "update solution")?;
        self.check_state_vectors(y, ydot)?;
        self.run_phase(BlockState::SolutionUpdated, "update solution", |block, params| {
            block.update_solution(system, params, y, ydot)
        })
    }

    /// Fill `∂r/∂α` and `r` at parameters `alpha` for every block.
    ///
    /// Block states are checked but not advanced.
    pub fn update_gradient(
        &mut self,
        gradient: &mut GradientSystem,
        alpha: &DVector<Real>,
        y: &DVector<Real>,
        ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        self.ensure_finalized("update gradient")?;
        self.check_state_vectors(y, ydot)?;
        dimension("gradient equations", self.dofs.num_equations(), gradient.num_equations())?;
        dimension("gradient parameters", self.parameters.len(), gradient.num_params())?;
        dimension("alpha", self.parameters.len(), alpha.len())?;

        for block in &mut self.blocks {
            block
                .core()
                .check_transition(BlockState::SolutionUpdated, "update gradient")?;
            block.update_gradient(gradient, alpha, y, ydot)?;
        }
        Ok(())
    }

    /// A gradient system sized for this model.
    pub fn gradient_system(&self) -> ModelResult<GradientSystem> {
        self.ensure_finalized("gradient system")?;
        Ok(GradientSystem::new(
            self.dofs.num_equations(),
            self.parameters.len(),
        ))
    }

    /// Global parameter vector, in block order then declaration order.
    pub fn parameters(&self) -> &[Real] {
        &self.parameters
    }

    pub fn dofhandler(&self) -> &DofHandler {
        &self.dofs
    }

    pub fn block(&self, id: BlockId) -> ModelResult<&dyn Block> {
        self.blocks
            .get(id.as_usize())
            .map(|b| b.as_ref())
            .ok_or(ModelError::UnknownBlock { id })
    }

    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &dyn Block> {
        self.blocks.iter().map(|b| b.as_ref())
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Time passed to the last successful [`Model::update_time`].
    pub fn time(&self) -> Real {
        self.time
    }

    /// Sum of every block's triplet budget.
    pub fn num_triplets(&self) -> TripletBudget {
        self.blocks.iter().map(|b| b.num_triplets()).sum()
    }

    fn block_entry_mut(&mut self, id: BlockId) -> ModelResult<&mut Box<dyn Block>> {
        self.blocks
            .get_mut(id.as_usize())
            .ok_or(ModelError::UnknownBlock { id })
    }

    /// Run one phase over every block, committing each block's new state
    /// only after its update succeeds.
    fn run_phase<F>(&mut self, next: BlockState, what: &'static str, mut update: F) -> ModelResult<()>
    where
        F: FnMut(&mut dyn Block, &[Real]) -> ModelResult<()>,
    {
        for block in &mut self.blocks {
            block.core().check_transition(next, what)?;
            update(block.as_mut(), &self.parameters)?;
            block.core_mut().set_state(next);
        }
        Ok(())
    }

    fn ensure_finalized(&self, what: &'static str) -> ModelResult<()> {
        if self.finalized {
            Ok(())
        } else {
            Err(ModelError::NotAssembled { what })
        }
    }

    fn check_system(&self, system: &SparseSystem, what: &'static str) -> ModelResult<()> {
        self.ensure_finalized(what)?;
        dimension("system equations", self.dofs.num_equations(), system.num_equations())?;
        dimension("system variables", self.dofs.num_variables(), system.num_variables())?;
        Ok(())
    }

    fn check_state_vectors(&self, y: &DVector<Real>, ydot: &DVector<Real>) -> ModelResult<()> {
        dimension("y", self.dofs.num_variables(), y.len())?;
        dimension("ydot", self.dofs.num_variables(), ydot.len())?;
        Ok(())
    }
}

fn dimension(what: &'static str, expected: usize, actual: usize) -> ModelResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AlgebraError::DimensionMismatch {
            what,
            expected,
            actual,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel_model() -> (Model, BlockId) {
        let mut model = Model::new(ModelConfig::default()).unwrap();
        let id = model.add_block(BlockType::BloodVessel, "BV0").unwrap();
        model.set_block_param(id, "R_poiseuille", 2.0).unwrap();
        (model, id)
    }

    #[test]
    fn rejects_invalid_period() {
        let err = Model::new(ModelConfig {
            cardiac_period: 0.0,
        })
        .unwrap_err();
        assert_eq!(err, ModelError::InvalidCardiacPeriod { value: 0.0 });
    }

    #[test]
    fn block_names_are_unique() {
        let (mut model, id) = vessel_model();
        assert_eq!(model.block_id("BV0"), Some(id));
        let err = model.add_block(BlockType::BloodVesselCRL, "BV0").unwrap_err();
        assert!(matches!(err, ModelError::DuplicateName { .. }));
        assert_eq!(model.num_blocks(), 1);
    }

    #[test]
    fn phase_calls_require_finalize() {
        let (mut model, _) = vessel_model();
        let mut system = SparseSystem::new(2, 4, TripletBudget::new(5, 3, 2));
        assert!(matches!(
            model.update_constant(&mut system),
            Err(ModelError::NotAssembled { .. })
        ));
        assert!(model.gradient_system().is_err());
    }

    #[test]
    fn finalize_runs_once_and_freezes_topology() {
        let (mut model, _) = vessel_model();
        model.finalize().unwrap();
        assert!(matches!(
            model.finalize(),
            Err(ModelError::AlreadyFinalized { .. })
        ));
        assert!(matches!(
            model.add_block(BlockType::BloodVessel, "BV1"),
            Err(ModelError::AlreadyFinalized { .. })
        ));
    }

    #[test]
    fn parameters_follow_declaration_order() {
        let (mut model, id) = vessel_model();
        model.set_block_param(id, "C", 0.5).unwrap();
        model.finalize().unwrap();
        assert_eq!(model.parameters(), [2.0, 0.5, 0.0, 0.0]);

        model.set_block_param(id, "stenosis_coefficient", 3.0).unwrap();
        assert_eq!(model.parameters(), [2.0, 0.5, 0.0, 3.0]);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let (mut model, id) = vessel_model();
        let err = model.set_block_param(id, "Emax", 1.0).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParameter { .. }));
    }

    #[test]
    fn vessel_rejects_activation() {
        let (mut model, id) = vessel_model();
        let activation = model.create_activation("half_cosine").unwrap();
        assert!(matches!(
            model.set_activation_function(id, activation),
            Err(ModelError::NotSupported { .. })
        ));
    }

    #[test]
    fn solution_before_constant_is_rejected() {
        let (mut model, id) = vessel_model();
        let mut system = model.finalize().unwrap();
        let y = DVector::zeros(4);
        let err = model.update_solution(&mut system, &y, &y).unwrap_err();
        assert!(matches!(err, ModelError::PhaseOrder { .. }));
        assert_eq!(model.block(id).unwrap().core().state(), BlockState::DofsAssigned);
        assert_eq!(system.used(), TripletBudget::default());
    }

    #[test]
    fn state_vector_length_is_checked() {
        let (mut model, _) = vessel_model();
        let mut system = model.finalize().unwrap();
        model.update_constant(&mut system).unwrap();
        let y = DVector::zeros(3);
        let err = model.update_solution(&mut system, &y, &y).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Algebra(AlgebraError::DimensionMismatch { what: "y", .. })
        ));
    }

    #[test]
    fn time_is_recorded() {
        let (mut model, _) = vessel_model();
        let mut system = model.finalize().unwrap();
        model.update_constant(&mut system).unwrap();
        model.update_time(&mut system, 0.25).unwrap();
        assert_eq!(model.time(), 0.25);
        assert!(model.update_time(&mut system, Real::NAN).is_err());
        assert_eq!(model.time(), 0.25);
    }
}
