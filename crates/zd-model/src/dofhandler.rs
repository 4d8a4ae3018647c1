//! Global numbering of variables and equations.

use crate::error::{ModelError, ModelResult};
use std::collections::HashMap;
use tracing::trace;

/// Interface variables every block owns, in local order.
pub const INTERFACE_VARIABLES: [&str; 4] = ["pressure_in", "flow_in", "pressure_out", "flow_out"];

/// Indices handed to one block at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DofAssignment {
    /// Global variable indices: interface variables, then internal variables.
    pub variables: Vec<usize>,
    /// Global equation indices, one per governing equation.
    pub equations: Vec<usize>,
}

/// Sole authority for allocating variable and equation indices.
///
/// Indices are dense, zero-based, and never reused or compacted while the
/// handler is alive. Each variable carries a name `<quantity>:<block>` so
/// results can be located by the reporting layer.
#[derive(Debug, Clone, Default)]
pub struct DofHandler {
    variables: Vec<String>,
    by_name: HashMap<String, usize>,
    num_equations: usize,
}

impl DofHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate one named variable.
    pub fn register_variable(&mut self, name: String) -> ModelResult<usize> {
        if self.by_name.contains_key(&name) {
            return Err(ModelError::DuplicateName { name });
        }
        let index = self.variables.len();
        trace!(index, name = %name, "variable registered");
        self.by_name.insert(name.clone(), index);
        self.variables.push(name);
        Ok(index)
    }

    /// Allocate one equation.
    pub fn register_equation(&mut self) -> usize {
        let index = self.num_equations;
        self.num_equations += 1;
        index
    }

    /// Allocate the interface variables, `internal_variables`, and
    /// `num_equations` equations for one block.
    pub fn register(
        &mut self,
        block_name: &str,
        num_equations: usize,
        internal_variables: &[&str],
    ) -> ModelResult<DofAssignment> {
        // Check every name up front so a failure allocates nothing.
        let names: Vec<String> = INTERFACE_VARIABLES
            .iter()
            .chain(internal_variables)
            .map(|quantity| format!("{quantity}:{block_name}"))
            .collect();
        if let Some(taken) = names.iter().find(|n| self.by_name.contains_key(*n)) {
            return Err(ModelError::DuplicateName {
                name: taken.clone(),
            });
        }

        let variables = names
            .into_iter()
            .map(|name| self.register_variable(name))
            .collect::<ModelResult<Vec<_>>>()?;
        let equations = (0..num_equations)
            .map(|_| self.register_equation())
            .collect();

        Ok(DofAssignment {
            variables,
            equations,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_equations(&self) -> usize {
        self.num_equations
    }

    pub fn variable_name(&self, index: usize) -> Option<&str> {
        self.variables.get(index).map(String::as_str)
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}
