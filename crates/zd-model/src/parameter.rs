//! Declarative parameter metadata and per-owner parameter values.

use crate::error::{ModelError, ModelResult};
use std::collections::BTreeMap;
use zd_core::Real;

/// Description of one named input of a block or activation function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub is_number: bool,
    pub is_optional: bool,
    pub default: Real,
}

impl ParameterDescriptor {
    /// Numeric input that must be provided.
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            is_number: true,
            is_optional: false,
            default: 0.0,
        }
    }

    /// Numeric input that defaults to zero.
    pub const fn optional(name: &'static str) -> Self {
        Self::with_default(name, 0.0)
    }

    /// Numeric input with an explicit default.
    pub const fn with_default(name: &'static str, default: Real) -> Self {
        Self {
            name,
            is_number: true,
            is_optional: true,
            default,
        }
    }

    /// Structural input handled entirely by the loader.
    pub const fn non_numeric(name: &'static str) -> Self {
        Self {
            name,
            is_number: false,
            is_optional: true,
            default: 0.0,
        }
    }

    /// Value a numeric parameter holds before the loader sets it.
    pub fn initial_value(&self) -> Real {
        if self.is_optional { self.default } else { 0.0 }
    }
}

/// Current values of an owner's numeric parameters, keyed by name.
///
/// Only names declared in the descriptor list can be read or written.
#[derive(Debug, Clone)]
pub struct ParameterValues {
    owner: String,
    descriptors: Vec<ParameterDescriptor>,
    values: BTreeMap<&'static str, Real>,
}

impl ParameterValues {
    pub fn new(owner: impl Into<String>, descriptors: Vec<ParameterDescriptor>) -> Self {
        let values = descriptors
            .iter()
            .filter(|d| d.is_number)
            .map(|d| (d.name, d.initial_value()))
            .collect();
        Self {
            owner: owner.into(),
            descriptors,
            values,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> ModelResult<&ParameterDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ModelError::UnknownParameter {
                owner: self.owner.clone(),
                name: name.to_string(),
            })
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }

    pub fn set(&mut self, name: &str, value: Real) -> ModelResult<()> {
        let descriptor = *self.descriptor(name)?;
        if !descriptor.is_number {
            return Err(ModelError::NonNumericParameter {
                owner: self.owner.clone(),
                name: name.to_string(),
            });
        }
        self.values.insert(descriptor.name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> ModelResult<Real> {
        let descriptor = self.descriptor(name)?;
        self.values
            .get(descriptor.name)
            .copied()
            .ok_or_else(|| ModelError::NonNumericParameter {
                owner: self.owner.clone(),
                name: name.to_string(),
            })
    }

    /// Position of `name` among the numeric parameters, in declaration order.
    pub fn numeric_slot(&self, name: &str) -> ModelResult<usize> {
        self.descriptor(name)?;
        self.descriptors
            .iter()
            .filter(|d| d.is_number)
            .position(|d| d.name == name)
            .ok_or_else(|| ModelError::NonNumericParameter {
                owner: self.owner.clone(),
                name: name.to_string(),
            })
    }

    /// Numeric parameters in declaration order.
    pub fn numeric(&self) -> impl Iterator<Item = (&'static str, Real)> + '_ {
        self.descriptors
            .iter()
            .filter(|d| d.is_number)
            .map(|d| (d.name, self.values.get(d.name).copied().unwrap_or(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel_like() -> ParameterValues {
        ParameterValues::new(
            "block 'BV0'",
            vec![
                ParameterDescriptor::required("R_poiseuille"),
                ParameterDescriptor::optional("C"),
                ParameterDescriptor::with_default("L", 2.5),
                ParameterDescriptor::non_numeric("name"),
            ],
        )
    }

    #[test]
    fn seeded_from_descriptors() {
        let params = vessel_like();
        assert_eq!(params.get("R_poiseuille").unwrap(), 0.0);
        assert_eq!(params.get("C").unwrap(), 0.0);
        assert_eq!(params.get("L").unwrap(), 2.5);
    }

    #[test]
    fn set_overwrites_declared_value() {
        let mut params = vessel_like();
        params.set("R_poiseuille", 100.0).unwrap();
        assert_eq!(params.get("R_poiseuille").unwrap(), 100.0);
    }

    #[test]
    fn undeclared_name_is_rejected() {
        let mut params = vessel_like();
        let err = params.set("R", 1.0).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownParameter {
                owner: "block 'BV0'".into(),
                name: "R".into()
            }
        );
        assert!(params.get("R").is_err());
    }

    #[test]
    fn non_numeric_name_is_rejected() {
        let mut params = vessel_like();
        assert!(matches!(
            params.set("name", 1.0),
            Err(ModelError::NonNumericParameter { .. })
        ));
        assert!(params.get("name").is_err());
        assert!(params.is_declared("name"));
    }

    #[test]
    fn numeric_slots_skip_structural_inputs() {
        let params = vessel_like();
        assert_eq!(params.numeric_slot("R_poiseuille").unwrap(), 0);
        assert_eq!(params.numeric_slot("L").unwrap(), 2);
        assert!(params.numeric_slot("name").is_err());
        let names: Vec<_> = params.numeric().map(|(n, _)| n).collect();
        assert_eq!(names, ["R_poiseuille", "C", "L"]);
    }
}
