//! Resistor-capacitor-inductor vessel with optional stenosis.
//!
//! ```text
//! P_in - P_out - (R + S)·Q_in - L·dQ_out = 0
//! Q_in - Q_out - C·dP_in + C·(R + 2S)·dQ_in = 0
//! ```
//!
//! with stenosis resistance `S = K·|Q_in|`. Local variables are
//! `[P_in, Q_in, P_out, Q_out]`; there is no internal state.

use crate::block::{Block, BlockCore, BlockType};
use crate::dofhandler::DofHandler;
use crate::error::ModelResult;
use crate::parameter::ParameterDescriptor;
use nalgebra::DVector;
use zd_algebra::{GradientSystem, SparseSystem, Term, TripletBudget};
use zd_core::{BlockId, Real, sign};

/// Blood vessel with Poiseuille resistance, capacitance, inductance, and a
/// flow-dependent stenosis resistance.
#[derive(Debug, Clone)]
pub struct BloodVessel {
    core: BlockCore,
}

impl BloodVessel {
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

impl Block for BloodVessel {
    fn core(&self) -> &BlockCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BlockCore {
        &mut self.core
    }

    fn block_type(&self) -> BlockType {
        BlockType::BloodVessel
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
        let capacitance = core.param(parameters, Self::CAPACITANCE);
        let stenosis_coeff = core.param(parameters, Self::STENOSIS_COEFFICIENT);

        let q_in = y[core.var(1)];
        let dq_in = ydot[core.var(1)];
        let stenosis_resistance = stenosis_coeff * q_in.abs();

        system.set_solution_dependent(
            Term::E,
            core.eqn(1),
            core.var(1),
            capacitance * (resistance + 2.0 * stenosis_resistance),
        )?;
        system.set_solution_dependent(
            Term::F,
            core.eqn(0),
            core.var(1),
            -resistance - stenosis_resistance,
        )?;
        system.set_solution_dependent(Term::D, core.eqn(0), core.var(1), -stenosis_resistance)?;
        system.set_solution_dependent(
            Term::D,
            core.eqn(1),
            core.var(1),
            2.0 * capacitance * stenosis_coeff * sign(q_in) * dq_in,
        )?;
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
        let dq_in = ydot[core.var(1)];
        let dq_out = ydot[core.var(3)];

        let resistance = core.param(alpha, Self::RESISTANCE);
        let capacitance = core.param(alpha, Self::CAPACITANCE);
        let inductance = core.param(alpha, Self::INDUCTANCE);
        let stenosis_coeff = core.param(alpha, Self::STENOSIS_COEFFICIENT);
        let stenosis_resistance = stenosis_coeff * q_in.abs();

        let [r_id, c_id, l_id, k_id] = [
            Self::RESISTANCE,
            Self::CAPACITANCE,
            Self::INDUCTANCE,
            Self::STENOSIS_COEFFICIENT,
        ]
        .map(|slot| core.global_param_ids()[slot]);

        gradient.set_gradient(core.eqn(0), r_id, -q_in)?;
        gradient.set_gradient(core.eqn(0), l_id, -dq_out)?;
        gradient.set_gradient(core.eqn(0), k_id, -q_in.abs() * q_in)?;

        gradient.set_gradient(core.eqn(1), r_id, capacitance * dq_in)?;
        gradient.set_gradient(
            core.eqn(1),
            c_id,
            -dp_in + (resistance + 2.0 * stenosis_resistance) * dq_in,
        )?;
        gradient.set_gradient(core.eqn(1), k_id, 2.0 * capacitance * q_in.abs() * dq_in)?;

        gradient.set_residual(
            core.eqn(0),
            p_in - (resistance + stenosis_resistance) * q_in - p_out - inductance * dq_out,
        )?;
        gradient.set_residual(
            core.eqn(1),
            q_in - q_out - capacitance * dp_in
                + capacitance * (resistance + 2.0 * stenosis_resistance) * dq_in,
        )?;
        Ok(())
    }
}
