//! Capacitor-resistor-inductor vessel.
//!
//! The capacitor sits at the inlet and the nonlinear resistance acts on the
//! outlet flow, so the mass balance carries no resistive term:
//!
//! ```text
//! P_in - P_out - (R + K·|Q_out|)·Q_out - L·dQ_out = 0
//! Q_in - Q_out - C·dP_in = 0
//! ```

use crate::block::{Block, BlockCore, BlockType};
use crate::dofhandler::DofHandler;
use crate::error::ModelResult;
use crate::parameter::ParameterDescriptor;
use nalgebra::DVector;
use zd_algebra::{GradientSystem, SparseSystem, Term, TripletBudget};
use zd_core::{BlockId, Real};

#[derive(Debug, Clone)]
pub struct BloodVesselCRL {
    core: BlockCore,
}

impl BloodVesselCRL {
    pub const RESISTANCE: usize = 0;
    pub const CAPACITANCE: usize = 1;
    pub const INDUCTANCE: usize = 2;
    pub const STENOSIS_COEFFICIENT: usize = 3;

    pub const NUM_TRIPLETS: TripletBudget = TripletBudget::new(5, 3, 2);

    pub fn new(id: BlockId, name: &str) -> Self {
        Self {
            core: BlockCore::new(
                id,
                name,
                vec![
                    ParameterDescriptor::required("R_poiseuille"),
                    ParameterDescriptor::optional("C"),
                    ParameterDescriptor::optional("L"),
                    ParameterDescriptor::optional("stenosis_coefficient"),
                ],
            ),
        }
    }
}

impl Block for BloodVesselCRL {
    fn core(&self) -> &BlockCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BlockCore {
        &mut self.core
    }

    fn block_type(&self) -> BlockType {
        BlockType::BloodVesselCRL
    }

    fn num_triplets(&self) -> TripletBudget {
        Self::NUM_TRIPLETS
    }

    fn setup_dofs(&mut self, dofs: &mut DofHandler) -> ModelResult<()> {
        self.core.setup_dofs_(dofs, 2, &[])
    }

    fn update_constant(
        &mut self,
        system: &mut SparseSystem,
        parameters: &[Real],
    ) -> ModelResult<()> {
        self.core.ensure_registered("update constants", parameters)?;
        let core = &self.core;
        let capacitance = core.param(parameters, Self::CAPACITANCE);
        let inductance = core.param(parameters, Self::INDUCTANCE);

        system.set_constant(Term::E, core.eqn(0), core.var(3), -inductance)?;
        system.set_constant(Term::E, core.eqn(1), core.var(0), -capacitance)?;
        system.set_constant(Term::F, core.eqn(0), core.var(0), 1.0)?;
        system.set_constant(Term::F, core.eqn(0), core.var(2), -1.0)?;
        system.set_constant(Term::F, core.eqn(1), core.var(1), 1.0)?;
        system.set_constant(Term::F, core.eqn(1), core.var(3), -1.0)?;
        Ok(())
    }

    fn update_solution(
        &mut self,
        system: &mut SparseSystem,
        parameters: &[Real],
        y: &DVector<Real>,
        ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        self.core.ensure_registered("update solution", parameters)?;
        self.core.check_state(y, ydot)?;
        let core = &self.core;
        let resistance = core.param(parameters, Self::RESISTANCE);
        let stenosis_coeff = core.param(parameters, Self::STENOSIS_COEFFICIENT);
        let stenosis_resistance = stenosis_coeff * y[core.var(3)].abs();

        system.set_solution_dependent(
            Term::F,
            core.eqn(0),
            core.var(3),
            -resistance - stenosis_resistance,
        )?;
        system.set_solution_dependent(Term::D, core.eqn(0), core.var(3), -stenosis_resistance)?;
        Ok(())
    }

    fn update_gradient(
        &mut self,
        gradient: &mut GradientSystem,
        alpha: &DVector<Real>,
        y: &DVector<Real>,
        ydot: &DVector<Real>,
    ) -> ModelResult<()> {
        self.core.ensure_registered("update gradient", alpha.as_slice())?;
        self.core.check_state(y, ydot)?;
        let core = &self.core;
        let alpha = alpha.as_slice();

        let p_in = y[core.var(0)];
        let q_in = y[core.var(1)];
        let p_out = y[core.var(2)];
        let q_out = y[core.var(3)];
        let dp_in = ydot[core.var(0)];
        let dq_out = ydot[core.var(3)];

        let resistance = core.param(alpha, Self::RESISTANCE);
        let capacitance = core.param(alpha, Self::CAPACITANCE);
        let inductance = core.param(alpha, Self::INDUCTANCE);
        let stenosis_coeff = core.param(alpha, Self::STENOSIS_COEFFICIENT);

        let ids = core.global_param_ids();
        gradient.set_gradient(core.eqn(0), ids[Self::RESISTANCE], -q_out)?;
        gradient.set_gradient(core.eqn(0), ids[Self::INDUCTANCE], -dq_out)?;
        gradient.set_gradient(
            core.eqn(0),
            ids[Self::STENOSIS_COEFFICIENT],
            -q_out.abs() * q_out,
        )?;
        gradient.set_gradient(core.eqn(1), ids[Self::CAPACITANCE], -dp_in)?;

        gradient.set_residual(
            core.eqn(0),
            p_in - p_out - (resistance + stenosis_coeff * q_out.abs()) * q_out
                - inductance * dq_out,
        )?;
        gradient.set_residual(core.eqn(1), q_in - q_out - capacitance * dp_in)?;
        Ok(())
    }
}
