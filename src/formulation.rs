//! Assembly of the planning problem.
//!
//! [`ModelBuilder`] enforces the assembly order: sets, then parameters, then variables, then the
//! objective, then constraints for a chosen [`StorageMode`]. Each stage consumes the previous one,
//! so no stage can be run twice or skipped.
use crate::coefficients::Coefficients;
use crate::model::{Model, StorageMode};
use crate::problem::Problem;
use crate::sets::Sets;
use anyhow::{Context, Result};
use log::{debug, info};

pub mod constraints;
pub use constraints::ConstraintKeys;
use constraints::add_model_constraints;
mod objective;
use objective::add_objective;
pub mod variables;
pub use variables::VariableMap;

/// No sets have been given yet
pub struct Empty;

/// The index sets are known
pub struct SetsReady {
    sets: Sets,
}

/// Coefficients have been derived
pub struct ParametersReady<'a> {
    sets: Sets,
    coefficients: Coefficients<'a>,
}

/// All decision variables have been declared
pub struct VariablesReady<'a> {
    sets: Sets,
    coefficients: Coefficients<'a>,
    problem: Problem,
    variables: VariableMap,
}

/// The objective has been set
pub struct ObjectiveReady<'a>(VariablesReady<'a>);

/// Builds the problem one stage at a time
pub struct ModelBuilder<S> {
    state: S,
}

impl Default for ModelBuilder<Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder<Empty> {
    /// Start building a new problem
    pub fn new() -> Self {
        Self { state: Empty }
    }

    /// Provide the index sets
    pub fn with_sets(self, sets: Sets) -> ModelBuilder<SetsReady> {
        info!(
            "Sets: {} locations, {} edges, {} arcs, {} periods",
            sets.locations.len(),
            sets.edges.len(),
            sets.arcs.len(),
            sets.periods.len()
        );

        ModelBuilder {
            state: SetsReady { sets },
        }
    }
}

impl ModelBuilder<SetsReady> {
    /// Derive the coefficients from the model's input tables
    pub fn with_parameters(self, model: &Model) -> Result<ModelBuilder<ParametersReady<'_>>> {
        let SetsReady { sets } = self.state;
        let coefficients =
            Coefficients::derive(model, &sets).context("Failed to derive model coefficients")?;
        debug!(
            "Derived costs for reference period {}",
            model.parameters.reference_period()
        );

        Ok(ModelBuilder {
            state: ParametersReady { sets, coefficients },
        })
    }
}

impl<'a> ModelBuilder<ParametersReady<'a>> {
    /// Declare the decision variables
    pub fn add_variables(self) -> ModelBuilder<VariablesReady<'a>> {
        let ParametersReady { sets, coefficients } = self.state;
        let mut problem = Problem::default();
        let variables = VariableMap::new(&mut problem, &sets);
        info!("Added {} variables", problem.num_variables());

        ModelBuilder {
            state: VariablesReady {
                sets,
                coefficients,
                problem,
                variables,
            },
        }
    }
}

impl<'a> ModelBuilder<VariablesReady<'a>> {
    /// Set the objective: total discounted investment cost
    pub fn add_objective(self) -> ModelBuilder<ObjectiveReady<'a>> {
        let mut state = self.state;
        add_objective(
            &mut state.problem,
            &state.variables,
            &state.sets,
            &state.coefficients,
        );

        ModelBuilder {
            state: ObjectiveReady(state),
        }
    }
}

impl<'a> ModelBuilder<ObjectiveReady<'a>> {
    /// Install the constraints for the given storage mode, finishing assembly
    pub fn add_constraints(self, storage_mode: StorageMode) -> AssembledModel<'a> {
        let VariablesReady {
            sets,
            coefficients,
            mut problem,
            variables,
        } = self.state.0;
        let constraint_keys = add_model_constraints(
            &mut problem,
            &variables,
            &sets,
            &coefficients,
            storage_mode,
        );

        info!(
            "Added {} constraints ({storage_mode:?})",
            problem.num_constraints()
        );
        for (family, rows) in constraint_keys.iter_families() {
            debug!("{family}: {} rows", rows.len());
        }
        debug!(
            "Masked {} line investment and {} flow variables",
            constraint_keys.masked_line_investments, constraint_keys.masked_flows
        );

        AssembledModel {
            sets,
            coefficients,
            problem,
            variables,
            constraint_keys,
            storage_mode,
        }
    }
}

/// The fully assembled problem, ready to be solved
pub struct AssembledModel<'a> {
    /// The index sets
    pub sets: Sets,
    /// Derived coefficients
    pub coefficients: Coefficients<'a>,
    /// The MILP
    pub problem: Problem,
    /// Lookup of decision variables
    pub variables: VariableMap,
    /// Lookup of constraint rows
    pub constraint_keys: ConstraintKeys,
    /// The storage constraints that were installed
    pub storage_mode: StorageMode,
}

/// Assemble the problem for a model, using the storage mode from its parameters
pub fn assemble(model: &Model) -> Result<AssembledModel<'_>> {
    let sets = Sets::build(model).context("Failed to build index sets")?;
    let assembled = ModelBuilder::new()
        .with_sets(sets)
        .with_parameters(model)?
        .add_variables()
        .add_objective()
        .add_constraints(model.parameters.storage_mode);

    Ok(assembled)
}
