//! A solver-agnostic representation of a mixed-integer linear program.
//!
//! The formulation writes columns (variables) and rows (constraints) here; the solver adapter
//! translates the finished problem into the backend's own representation.
use indexmap::IndexMap;
use std::ops::{Bound, RangeBounds};

/// A decision variable in the problem.
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    /// The index of the column this variable refers to
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a variable may take fractional values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Any real value within the bounds
    Continuous,
    /// Whole numbers only
    Integer,
}

/// A column of the problem
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// Continuous or integer
    pub kind: VariableKind,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Coefficient in the (minimised) objective
    pub cost: f64,
}

/// A row of the problem: `min <= sum(coeff * variable) <= max`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Non-zero coefficients, at most one per variable
    pub terms: Vec<(Variable, f64)>,
}

impl Constraint {
    /// Evaluate the left-hand side for the given column values
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.index()])
            .sum()
    }
}

/// A minimisation MILP
#[derive(Debug, Default, Clone)]
pub struct Problem {
    variables: Vec<VariableDefinition>,
    constraints: Vec<Constraint>,
}

/// Convert a range into a pair of inclusive bounds, using infinities for open ends
fn to_bounds<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let min = match bounds.start_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let max = match bounds.end_bound() {
        Bound::Included(value) | Bound::Excluded(value) => *value,
        Bound::Unbounded => f64::INFINITY,
    };

    (min, max)
}

impl Problem {
    /// Add a variable with no objective cost
    pub fn add_variable<B: RangeBounds<f64>>(&mut self, kind: VariableKind, bounds: B) -> Variable {
        let (min, max) = to_bounds(&bounds);
        self.variables.push(VariableDefinition {
            kind,
            min,
            max,
            cost: 0.0,
        });

        Variable(self.variables.len() - 1)
    }

    /// Set the objective coefficient of a variable
    pub fn set_cost(&mut self, var: Variable, cost: f64) {
        self.variables[var.index()].cost = cost;
    }

    /// Force a variable to take exactly the given value
    pub fn fix(&mut self, var: Variable, value: f64) {
        let definition = &mut self.variables[var.index()];
        definition.min = value;
        definition.max = value;
    }

    /// Add a constraint, returning its row index.
    ///
    /// Repeated variables have their coefficients summed and zero coefficients are dropped.
    pub fn add_constraint<I, B>(&mut self, terms: I, bounds: B) -> usize
    where
        I: IntoIterator<Item = (Variable, f64)>,
        B: RangeBounds<f64>,
    {
        let mut merged: IndexMap<Variable, f64> = IndexMap::new();
        for (var, coeff) in terms {
            *merged.entry(var).or_default() += coeff;
        }

        let (min, max) = to_bounds(&bounds);
        self.constraints.push(Constraint {
            min,
            max,
            terms: merged
                .into_iter()
                .filter(|(_, coeff)| coeff.abs() > 0.0)
                .collect(),
        });

        self.constraints.len() - 1
    }

    /// The number of columns
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The number of rows
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Get the definition of a variable
    pub fn variable(&self, var: Variable) -> &VariableDefinition {
        &self.variables[var.index()]
    }

    /// Get a constraint by row index
    pub fn constraint(&self, row: usize) -> &Constraint {
        &self.constraints[row]
    }

    /// Iterate over the columns in order
    pub fn iter_variables(&self) -> impl Iterator<Item = &VariableDefinition> {
        self.variables.iter()
    }

    /// Iterate over the rows in order
    pub fn iter_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// The objective value of the given column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(definition, value)| definition.cost * value)
            .sum()
    }

    /// The index of the first row violated by the given column values, if any
    pub fn first_violated_constraint(&self, values: &[f64], tolerance: f64) -> Option<usize> {
        self.constraints.iter().position(|constraint| {
            let activity = constraint.activity(values);
            activity < constraint.min - tolerance || activity > constraint.max + tolerance
        })
    }

    /// Whether the given column values satisfy every bound and constraint
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(definition, value)| {
                    *value >= definition.min - tolerance && *value <= definition.max + tolerance
                })
            && self.first_violated_constraint(values, tolerance).is_none()
    }
}
