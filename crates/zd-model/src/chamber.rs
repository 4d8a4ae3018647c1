//! Heart chamber with linear time-varying elastance.
//!
//! ```text
//! P_in = E(t)·(Vc - Vrest)
//! P_in = P_out
//! Q_in - Q_out = dVc
//! ```
//!
//! with `E(t) = Epass + Emax·φ(t)` and `φ` supplied by an injected
//! [`ActivationFunction`]. The chamber volume `Vc` is an internal variable.

use crate::activation::ActivationFunction;
use crate::block::{Block, BlockCore, BlockType};
use crate::dofhandler::DofHandler;
use crate::error::{ModelError, ModelResult};
use crate::parameter::ParameterDescriptor;
use nalgebra::DVector;
use tracing::trace;
use zd_algebra::{GradientSystem, SparseSystem, Term, TripletBudget};
use zd_core::{BlockId, Real, ensure_finite};

#[derive(Debug)]
pub struct LinearElastanceChamber {
    core: BlockCore,
    activation: Option<Box<dyn ActivationFunction>>,
    /// Activation and elastance from the most recent time update.
    activation_value: Option<Real>,
    elastance: Option<Real>,
}

impl LinearElastanceChamber {
    pub const EMAX: usize = 0;
    pub const EPASS: usize = 1;
    pub const VREST: usize = 2;

    pub const NUM_TRIPLETS: TripletBudget = TripletBudget::new(6, 2, 0);

    pub fn new(id: BlockId, name: &str) -> Self {
        Self {
            core: BlockCore::new(
                id,
                name,
                vec![
                    ParameterDescriptor::required("Emax"),
                    ParameterDescriptor::required("Epass"),
                    ParameterDescriptor::required("Vrest"),
                ],
            ),
            activation: None,
            activation_value: None,
            elastance: None,
        }
    }

    pub fn activation(&self) -> Option<&dyn ActivationFunction> {
        self.activation.as_deref()
    }

    /// Elastance computed by the last [`Block::update_time`].
    pub fn elastance(&self) -> Option<Real> {
        self.elastance
    }
}

impl Block for LinearElastanceChamber {
    fn core(&self) -> &BlockCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BlockCore {
        &mut self.core
    }

    fn block_type(&self) -> BlockType {
        BlockType::LinearElastanceChamber
    }

    fn num_triplets(&self) -> TripletBudget {
        Self::NUM_TRIPLETS
    }

    fn setup_dofs(&mut self, dofs: &mut DofHandler) -> ModelResult<()> {
        self.core.setup_dofs_(dofs, 3, &["Vc"])
    }

    fn update_constant(
        &mut self,
        system: &mut SparseSystem,
        parameters: &[Real],
    ) -> ModelResult<()> {
        self.core.ensure_registered("update constants", parameters)?;
        let core = &self.core;

        system.set_constant(Term::F, core.eqn(0), core.var(0), 1.0)?;
        system.set_constant(Term::F, core.eqn(1), core.var(0), 1.0)?;
        system.set_constant(Term::F, core.eqn(1), core.var(2), -1.0)?;
        system.set_constant(Term::F, core.eqn(2), core.var(1), 1.0)?;
        system.set_constant(Term::F, core.eqn(2), core.var(3), -1.0)?;
        system.set_constant(Term::E, core.eqn(2), core.var(4), -1.0)?;
        Ok(())
    }

    fn update_time(
        &mut self,
        system: &mut SparseSystem,
        parameters: &[Real],
        time: Real,
    ) -> ModelResult<()> {
        self.core.ensure_registered("update time", parameters)?;
        let activation = self
            .activation
            .as_deref()
            .ok_or_else(|| ModelError::MissingActivation {
                block: self.core.name().to_string(),
            })?;
        // Evaluated before any write so a failure leaves the system untouched.
        let phi = activation.compute(time)?;

        let core = &self.core;
        let emax = core.param(parameters, Self::EMAX);
        let epass = core.param(parameters, Self::EPASS);
        let vrest = core.param(parameters, Self::VREST);
        let elastance = ensure_finite(epass + emax * phi, "chamber elastance")?;

        system.set_time_dependent(Term::F, core.eqn(0), core.var(4), -elastance)?;
        system.set_time_dependent_rhs(core.eqn(0), elastance * vrest)?;

        trace!(block = core.name(), time, phi, elastance, "chamber elastance");
        self.activation_value = Some(phi);
        self.elastance = Some(elastance);
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
        let phi = self.activation_value.ok_or_else(|| ModelError::PhaseOrder {
            block: core.name().to_string(),
            what: "update gradient before update time",
            state: core.state().as_str(),
        })?;
        let alpha = alpha.as_slice();

        let p_in = y[core.var(0)];
        let q_in = y[core.var(1)];
        let p_out = y[core.var(2)];
        let q_out = y[core.var(3)];
        let volume = y[core.var(4)];
        let dvolume = ydot[core.var(4)];

        let vrest = core.param(alpha, Self::VREST);
        let elastance = core.param(alpha, Self::EPASS) + core.param(alpha, Self::EMAX) * phi;
        let strain = volume - vrest;

        let ids = core.global_param_ids();
        gradient.set_gradient(core.eqn(0), ids[Self::EMAX], -phi * strain)?;
        gradient.set_gradient(core.eqn(0), ids[Self::EPASS], -strain)?;
        gradient.set_gradient(core.eqn(0), ids[Self::VREST], elastance)?;

        gradient.set_residual(core.eqn(0), p_in - elastance * strain)?;
        gradient.set_residual(core.eqn(1), p_in - p_out)?;
        gradient.set_residual(core.eqn(2), q_in - q_out - dvolume)?;
        Ok(())
    }

    fn set_activation_function(
        &mut self,
        activation: Box<dyn ActivationFunction>,
    ) -> ModelResult<()> {
        self.activation = Some(activation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{ActivationKind, TwoHillActivation};
    use crate::parameter::ParameterValues;
    use zd_core::{CoreError, Tolerances, nearly_equal};

    const P_IN: usize = 0;
    const VC: usize = 4;

    #[derive(Debug)]
    struct Constant {
        value: Real,
        params: ParameterValues,
    }

    impl Constant {
        fn boxed(value: Real) -> Box<dyn ActivationFunction> {
            Box::new(Self {
                value,
                params: ParameterValues::new("constant activation", vec![]),
            })
        }
    }

    impl ActivationFunction for Constant {
        fn kind(&self) -> ActivationKind {
            ActivationKind::HalfCosine
        }

        fn cardiac_period(&self) -> Real {
            1.0
        }

        fn parameters(&self) -> &ParameterValues {
            &self.params
        }

        fn set_param(&mut self, name: &str, value: Real) -> ModelResult<()> {
            self.params.set(name, value)
        }

        fn compute(&self, _time: Real) -> ModelResult<Real> {
            Ok(self.value)
        }
    }

    fn chamber() -> (LinearElastanceChamber, SparseSystem, Vec<Real>) {
        let mut block = LinearElastanceChamber::new(BlockId::from_index(0).unwrap(), "LV");
        let params = block.core_mut().params_mut();
        params.set("Emax", 2.0).unwrap();
        params.set("Epass", 0.5).unwrap();
        params.set("Vrest", 10.0).unwrap();

        let mut dofs = DofHandler::new();
        block.setup_dofs(&mut dofs).unwrap();
        assert_eq!(dofs.variable_name(VC), Some("Vc:LV"));
        let mut parameters = Vec::new();
        block.core_mut().register_parameters(&mut parameters);
        let system = SparseSystem::new(
            dofs.num_equations(),
            dofs.num_variables(),
            LinearElastanceChamber::NUM_TRIPLETS,
        );
        (block, system, parameters)
    }

    #[test]
    fn time_update_writes_elastance() {
        let (mut block, mut system, parameters) = chamber();
        block.set_activation_function(Constant::boxed(0.25)).unwrap();
        block.update_constant(&mut system, &parameters).unwrap();
        block.update_time(&mut system, &parameters, 0.3).unwrap();

        assert_eq!(block.elastance(), Some(1.0));
        assert_eq!(system.c()[0], 10.0);
        assert_eq!(system.f().get(0, VC), Some(-1.0));
        assert_eq!(system.f().get(0, P_IN), Some(1.0));
        assert_eq!(system.e().get(2, VC), Some(-1.0));
        assert!(system.used().fits_within(&LinearElastanceChamber::NUM_TRIPLETS));
        assert_eq!(system.used(), TripletBudget::new(6, 1, 0));
    }

    #[test]
    fn missing_activation_fails() {
        let (mut block, mut system, parameters) = chamber();
        block.update_constant(&mut system, &parameters).unwrap();
        let err = block.update_time(&mut system, &parameters, 0.0).unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingActivation {
                block: "LV".into()
            }
        );
        assert_eq!(system.f().get(0, VC), None);
    }

    #[test]
    fn activation_failure_leaves_system_untouched() {
        let (mut block, mut system, parameters) = chamber();
        block.set_activation_function(Constant::boxed(0.25)).unwrap();
        block.update_constant(&mut system, &parameters).unwrap();
        block.update_time(&mut system, &parameters, 0.0).unwrap();

        // Not finalized, so compute fails.
        block
            .set_activation_function(Box::new(TwoHillActivation::new(1.0)))
            .unwrap();
        let err = block.update_time(&mut system, &parameters, 0.5).unwrap_err();
        assert!(matches!(err, ModelError::NotFinalized { .. }));
        assert_eq!(system.f().get(0, VC), Some(-1.0));
        assert_eq!(system.c()[0], 10.0);
        assert_eq!(block.elastance(), Some(1.0));
    }

    #[test]
    fn non_finite_elastance_is_rejected() {
        let (mut block, mut system, parameters) = chamber();
        block.set_activation_function(Constant::boxed(Real::NAN)).unwrap();
        block.update_constant(&mut system, &parameters).unwrap();

        let err = block.update_time(&mut system, &parameters, 0.3).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Core(CoreError::NonFinite {
                what: "chamber elastance",
                ..
            })
        ));
        assert_eq!(system.f().get(0, VC), None);
        assert_eq!(block.elastance(), None);
    }

    #[test]
    fn gradient_requires_time_update() {
        let (mut block, mut system, parameters) = chamber();
        block.set_activation_function(Constant::boxed(0.25)).unwrap();
        block.update_constant(&mut system, &parameters).unwrap();

        let mut gradient = GradientSystem::new(3, parameters.len());
        let alpha = DVector::from_vec(parameters);
        let y = DVector::zeros(5);
        let err = block.update_gradient(&mut gradient, &alpha, &y, &y).unwrap_err();
        assert!(matches!(err, ModelError::PhaseOrder { .. }));
    }

    #[test]
    fn gradient_residual_matches_assembled_system() {
        let (mut block, mut system, parameters) = chamber();
        block.set_activation_function(Constant::boxed(0.25)).unwrap();
        block.update_constant(&mut system, &parameters).unwrap();
        block.update_time(&mut system, &parameters, 0.3).unwrap();

        let y = DVector::from_row_slice(&[12.0, 3.0, 11.5, 2.0, 40.0]);
        let ydot = DVector::from_row_slice(&[0.0, 0.0, 0.0, 0.0, 1.5]);
        let mut gradient = GradientSystem::new(3, parameters.len());
        let alpha = DVector::from_vec(parameters);
        block.update_gradient(&mut gradient, &alpha, &y, &ydot).unwrap();

        let assembled = -system.residual(&y, &ydot).unwrap();
        for eqn in 0..3 {
            assert!(nearly_equal(
                gradient.residual()[eqn],
                assembled[eqn],
                Tolerances::default()
            ));
        }
        let jac = gradient.jacobian();
        assert_eq!(jac.get(0, LinearElastanceChamber::EMAX), Some(-7.5));
        assert_eq!(jac.get(0, LinearElastanceChamber::EPASS), Some(-30.0));
        assert_eq!(jac.get(0, LinearElastanceChamber::VREST), Some(1.0));
    }
}
