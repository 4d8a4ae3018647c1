//! Activation functions driving time-varying chamber elastance.
//!
//! An activation function maps simulation time to a contraction signal in
//! `[0, 1]`, periodic with the cardiac cycle. Variants are selected by name
//! through [`create_activation`] and configured with
//! [`ActivationFunction::set_param`]; [`ActivationFunction::finalize`] must
//! run once after the last parameter is set and before the first
//! [`ActivationFunction::compute`].
//!
//! # Example
//!
//! ```
//! use zd_model::activation::{ActivationKind, create_activation};
//!
//! let mut act = create_activation(ActivationKind::HalfCosine, 1.0);
//! act.set_param("t_active", 0.2).unwrap();
//! act.set_param("t_twitch", 0.3).unwrap();
//! act.finalize().unwrap();
//!
//! assert_eq!(act.compute(0.1).unwrap(), 0.0);
//! assert!((act.compute(0.35).unwrap() - 1.0).abs() < 1e-12);
//! ```

use crate::error::{ModelError, ModelResult};
use crate::parameter::{ParameterDescriptor, ParameterValues};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;
use zd_core::{Real, wrap_into_period};

/// Time step of the scan that locates the two-hill maximum.
pub const NORMALIZATION_DT: Real = 1e-5;

/// Names of the available activation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    HalfCosine,
    PiecewiseCosine,
    TwoHill,
}

impl ActivationKind {
    pub const ALL: [ActivationKind; 3] = [
        ActivationKind::HalfCosine,
        ActivationKind::PiecewiseCosine,
        ActivationKind::TwoHill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivationKind::HalfCosine => "half_cosine",
            ActivationKind::PiecewiseCosine => "piecewise_cosine",
            ActivationKind::TwoHill => "two_hill",
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivationKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownActivation {
                name: s.to_string(),
            })
    }
}

/// Periodic contraction signal used to modulate elastance.
pub trait ActivationFunction: Send + Sync + fmt::Debug {
    fn kind(&self) -> ActivationKind;

    fn cardiac_period(&self) -> Real;

    fn parameters(&self) -> &ParameterValues;

    /// Set a declared numeric parameter, discarding anything
    /// [`ActivationFunction::finalize`] derived from the old value.
    fn set_param(&mut self, name: &str, value: Real) -> ModelResult<()>;

    /// Derive internal state from the current parameters.
    ///
    /// Called once after all parameters are set. Default no-op.
    fn finalize(&mut self) -> ModelResult<()> {
        Ok(())
    }

    /// Activation value at `time`, nominally in `[0, 1]`.
    fn compute(&self, time: Real) -> ModelResult<Real>;
}

/// Create an activation function with default parameter values.
pub fn create_activation(kind: ActivationKind, cardiac_period: Real) -> Box<dyn ActivationFunction> {
    match kind {
        ActivationKind::HalfCosine => Box::new(HalfCosineActivation::new(cardiac_period)),
        ActivationKind::PiecewiseCosine => {
            Box::new(PiecewiseCosineActivation::new(cardiac_period))
        }
        ActivationKind::TwoHill => Box::new(TwoHillActivation::new(cardiac_period)),
    }
}

/// Create an activation function from its type name.
pub fn create_activation_by_name(
    name: &str,
    cardiac_period: Real,
) -> ModelResult<Box<dyn ActivationFunction>> {
    Ok(create_activation(name.parse()?, cardiac_period))
}

/// Half cosine wave during the contraction window.
///
/// `t_contract = max(0, (t mod T) - t_active)`; the activation is
/// `0.5·(1 - cos(2π·t_contract/t_twitch))` while `t_contract ≤ t_twitch`
/// and zero afterward.
#[derive(Debug, Clone)]
pub struct HalfCosineActivation {
    cardiac_period: Real,
    params: ParameterValues,
}

impl HalfCosineActivation {
    pub fn new(cardiac_period: Real) -> Self {
        Self {
            cardiac_period,
            params: ParameterValues::new(
                "half_cosine activation",
                vec![
                    ParameterDescriptor::required("t_active"),
                    ParameterDescriptor::required("t_twitch"),
                ],
            ),
        }
    }
}

impl ActivationFunction for HalfCosineActivation {
    fn kind(&self) -> ActivationKind {
        ActivationKind::HalfCosine
    }

    fn cardiac_period(&self) -> Real {
        self.cardiac_period
    }

    fn parameters(&self) -> &ParameterValues {
        &self.params
    }

    fn set_param(&mut self, name: &str, value: Real) -> ModelResult<()> {
        self.params.set(name, value)
    }

    fn compute(&self, time: Real) -> ModelResult<Real> {
        let t_active = self.params.get("t_active")?;
        let t_twitch = self.params.get("t_twitch")?;

        let t_in_cycle = time % self.cardiac_period;
        let t_contract = if t_in_cycle >= t_active {
            t_in_cycle - t_active
        } else {
            0.0
        };

        if t_contract <= t_twitch {
            Ok(0.5 * (1.0 - (2.0 * PI * t_contract / t_twitch).cos()))
        } else {
            Ok(0.0)
        }
    }
}

/// Separate cosine contraction and relaxation phases.
///
/// Each window is measured from its own start time modulo the cardiac
/// period. The contraction window is checked first.
#[derive(Debug, Clone)]
pub struct PiecewiseCosineActivation {
    cardiac_period: Real,
    params: ParameterValues,
}

impl PiecewiseCosineActivation {
    pub fn new(cardiac_period: Real) -> Self {
        Self {
            cardiac_period,
            params: ParameterValues::new(
                "piecewise_cosine activation",
                vec![
                    ParameterDescriptor::required("contract_start"),
                    ParameterDescriptor::required("relax_start"),
                    ParameterDescriptor::required("contract_duration"),
                    ParameterDescriptor::required("relax_duration"),
                ],
            ),
        }
    }
}

impl ActivationFunction for PiecewiseCosineActivation {
    fn kind(&self) -> ActivationKind {
        ActivationKind::PiecewiseCosine
    }

    fn cardiac_period(&self) -> Real {
        self.cardiac_period
    }

    fn parameters(&self) -> &ParameterValues {
        &self.params
    }

    fn set_param(&mut self, name: &str, value: Real) -> ModelResult<()> {
        self.params.set(name, value)
    }

    fn compute(&self, time: Real) -> ModelResult<Real> {
        let contract_start = self.params.get("contract_start")?;
        let relax_start = self.params.get("relax_start")?;
        let contract_duration = self.params.get("contract_duration")?;
        let relax_duration = self.params.get("relax_duration")?;

        let phase = (time - contract_start) % self.cardiac_period;
        if (0.0..contract_duration).contains(&phase) {
            return Ok(0.5 * (1.0 - (PI * phase / contract_duration).cos()));
        }

        let phase = (time - relax_start) % self.cardiac_period;
        if (0.0..relax_duration).contains(&phase) {
            return Ok(0.5 * (1.0 + (PI * phase / relax_duration).cos()));
        }

        Ok(0.0)
    }
}

/// Two-hill activation, normalized so its peak over one cycle is 1.
///
/// ```text
/// A(t) = C · g1/(1 + g1) · 1/(1 + g2)
/// g1 = (t_s/tau_1)^m1,  g2 = (t_s/tau_2)^m2,  t_s = (t - t_shift) mod T
/// ```
///
/// `C` is found by [`ActivationFunction::finalize`]; computing before that
/// is an error. Changing a parameter discards `C`.
#[derive(Debug, Clone)]
pub struct TwoHillActivation {
    cardiac_period: Real,
    params: ParameterValues,
    normalization: Option<Real>,
}

impl TwoHillActivation {
    pub fn new(cardiac_period: Real) -> Self {
        Self {
            cardiac_period,
            params: ParameterValues::new(
                "two_hill activation",
                vec![
                    ParameterDescriptor::required("t_shift"),
                    ParameterDescriptor::required("tau_1"),
                    ParameterDescriptor::required("tau_2"),
                    ParameterDescriptor::required("m1"),
                    ParameterDescriptor::required("m2"),
                ],
            ),
            normalization: None,
        }
    }

    /// Normalization factor, once finalized.
    pub fn normalization_factor(&self) -> Option<Real> {
        self.normalization
    }

    fn raw(&self, t_shifted: Real) -> ModelResult<Real> {
        let tau_1 = self.params.get("tau_1")?;
        let tau_2 = self.params.get("tau_2")?;
        let m1 = self.params.get("m1")?;
        let m2 = self.params.get("m2")?;

        let g1 = (t_shifted / tau_1).powf(m1);
        let g2 = (t_shifted / tau_2).powf(m2);
        Ok((g1 / (1.0 + g1)) * (1.0 / (1.0 + g2)))
    }
}

impl ActivationFunction for TwoHillActivation {
    fn kind(&self) -> ActivationKind {
        ActivationKind::TwoHill
    }

    fn cardiac_period(&self) -> Real {
        self.cardiac_period
    }

    fn parameters(&self) -> &ParameterValues {
        &self.params
    }

    fn set_param(&mut self, name: &str, value: Real) -> ModelResult<()> {
        self.params.set(name, value)?;
        self.normalization = None;
        Ok(())
    }

    fn finalize(&mut self) -> ModelResult<()> {
        let period = self.cardiac_period;
        if !(period > 0.0) || !period.is_finite() {
            return Err(ModelError::InvalidCardiacPeriod { value: period });
        }

        let steps = (period / NORMALIZATION_DT).ceil() as usize;
        let mut max_value: Real = 0.0;
        for i in 0..steps {
            let t = i as Real * NORMALIZATION_DT;
            if t >= period {
                break;
            }
            max_value = max_value.max(self.raw(t)?);
        }

        if !(max_value > 0.0) || !max_value.is_finite() {
            return Err(ModelError::DegenerateNormalization { value: max_value });
        }

        let factor = 1.0 / max_value;
        debug!(max_value, factor, "two_hill normalization computed");
        self.normalization = Some(factor);
        Ok(())
    }

    fn compute(&self, time: Real) -> ModelResult<Real> {
        let factor = self.normalization.ok_or(ModelError::NotFinalized {
            what: "two_hill activation",
        })?;
        let t_shift = self.params.get("t_shift")?;
        let period = self.cardiac_period;

        let t_shifted = wrap_into_period((time % period) - t_shift, period);

        Ok(factor * self.raw(t_shifted)?)
    }
}
