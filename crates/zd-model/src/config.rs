//! Serializable model settings.
//!
//! Deserializing a configuration file into these types is handled by the
//! loader; this module only defines the shapes and validates them.

use crate::activation::{ActivationFunction, ActivationKind, create_activation};
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zd_core::Real;

/// Settings shared by every block in a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Length of one cardiac cycle, in seconds.
    pub cardiac_period: Real,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            cardiac_period: 1.0,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if !self.cardiac_period.is_finite() || self.cardiac_period <= 0.0 {
            return Err(ModelError::InvalidCardiacPeriod {
                value: self.cardiac_period,
            });
        }
        Ok(())
    }
}

/// An activation function by type name plus its parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(rename = "type")]
    pub kind: ActivationKind,
    #[serde(default)]
    pub params: BTreeMap<String, Real>,
}

impl ActivationConfig {
    /// Create the activation, apply every parameter, and finalize it.
    pub fn build(&self, cardiac_period: Real) -> ModelResult<Box<dyn ActivationFunction>> {
        let mut activation = create_activation(self.kind, cardiac_period);
        for (name, &value) in &self.params {
            activation.set_param(name, value)?;
        }
        activation.finalize()?;
        Ok(activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_period_is_one_second() {
        let config = ModelConfig::default();
        assert_eq!(config.cardiac_period, 1.0);
        assert!(config.validate().is_ok());

        let parsed: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_bad_period() {
        for value in [0.0, -1.0, Real::NAN, Real::INFINITY] {
            let config = ModelConfig {
                cardiac_period: value,
            };
            assert!(matches!(
                config.validate(),
                Err(ModelError::InvalidCardiacPeriod { .. })
            ));
        }
    }

    #[test]
    fn activation_config_builds_finalized_function() {
        let json = r#"{
            "type": "two_hill",
            "params": { "t_shift": 0.0, "tau_1": 0.2, "tau_2": 0.2, "m1": 2.0, "m2": 2.0 }
        }"#;
        let config: ActivationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.kind, ActivationKind::TwoHill);

        let activation = config.build(1.0).unwrap();
        assert_eq!(activation.kind(), ActivationKind::TwoHill);
        let value = activation.compute(0.2).unwrap();
        assert!((0.0..=1.0 + 1e-3).contains(&value));
    }

    #[test]
    fn activation_config_rejects_unknown_parameter() {
        let json = r#"{ "type": "half_cosine", "params": { "t_relax": 0.1 } }"#;
        let config: ActivationConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(1.0),
            Err(ModelError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn unknown_activation_type_fails_to_parse() {
        let json = r#"{ "type": "sawtooth" }"#;
        assert!(serde_json::from_str::<ActivationConfig>(json).is_err());
    }
}
