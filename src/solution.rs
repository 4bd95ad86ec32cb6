//! Solved values of the decision variables, keyed by the index tuples they were created for.
use crate::carrier::EnergyCarrier;
use crate::formulation::AssembledModel;
use crate::location::LocationID;
use crate::problem::Variable;
use crate::solver::{SolveOutcome, TerminationStatus};
use crate::technology::{EnergyConverter, Technology};
use crate::units::{Blocks, Money, MoneyPerBlock};
use indexmap::IndexMap;
use std::hash::Hash;

/// Operation values at or below this magnitude are treated as zero when reporting
const VALUE_TOLERANCE: f64 = 1e-9;

/// A new investment made in the solution
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentRecord<'a> {
    /// What was built
    pub technology: Technology,
    /// Where it was built (for lines, the first location of the edge)
    pub location: &'a LocationID,
    /// For lines, the other location of the edge
    pub location_to: Option<&'a LocationID>,
    /// The period of the investment
    pub period: u32,
    /// The number of blocks built
    pub count: Blocks,
    /// Discounted cost of one block
    pub unit_cost: MoneyPerBlock,
}

impl InvestmentRecord<'_> {
    /// The discounted cost of all blocks in this record
    pub fn total_cost(&self) -> Money {
        self.unit_cost * self.count
    }
}

/// The solution to an assembled problem
pub struct Solution<'a> {
    assembled: &'a AssembledModel<'a>,
    /// How the solver run ended
    pub status: TerminationStatus,
    /// The objective value reported by the solver
    pub objective_value: Money,
    values: Vec<f64>,
}

impl<'a> Solution<'a> {
    /// Create a [`Solution`] from a solver outcome.
    ///
    /// Returns `None` if the outcome carries no values (e.g. the problem was infeasible).
    pub fn new(assembled: &'a AssembledModel<'a>, outcome: SolveOutcome) -> Option<Self> {
        let values = outcome.values?;
        assert_eq!(
            values.len(),
            assembled.problem.num_variables(),
            "Solution does not match problem"
        );

        Some(Self {
            assembled,
            status: outcome.status,
            objective_value: Money(outcome.objective_value.unwrap_or_default()),
            values,
        })
    }

    /// The solved value of a variable
    pub fn value(&self, var: Variable) -> f64 {
        self.values[var.index()]
    }

    /// The solved values of every column, in column order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over the keys and solved values of one variable family
    fn iter_family<'b, K: Hash + Eq>(
        &'b self,
        family: &'b IndexMap<K, Variable>,
    ) -> impl Iterator<Item = (&'b K, f64)> {
        family.iter().map(|(key, var)| (key, self.value(*var)))
    }

    /// Iterate over line investments for every carrier, location pair and period
    pub fn iter_line_investments(
        &self,
    ) -> impl Iterator<Item = (EnergyCarrier, &LocationID, &LocationID, u32, f64)> {
        self.iter_family(&self.assembled.variables.line_investment)
            .map(|((carrier, from, to, period), value)| (*carrier, from, to, *period, value))
    }

    /// Iterate over primary supply for every carrier, location and period
    pub fn iter_supplied(&self) -> impl Iterator<Item = (EnergyCarrier, &LocationID, u32, f64)> {
        self.iter_family(&self.assembled.variables.supplied)
            .map(|((carrier, location, period), value)| (*carrier, location, *period, value))
    }

    /// Iterate over flows for every carrier, location pair and period
    pub fn iter_flows(
        &self,
    ) -> impl Iterator<Item = (EnergyCarrier, &LocationID, &LocationID, u32, f64)> {
        self.iter_family(&self.assembled.variables.flow)
            .map(|((carrier, from, to, period), value)| (*carrier, from, to, *period, value))
    }

    /// Iterate over conversion throughput for every carrier, converter, location and period
    pub fn iter_converted(
        &self,
    ) -> impl Iterator<Item = (EnergyCarrier, EnergyConverter, &LocationID, u32, f64)> {
        self.iter_family(&self.assembled.variables.converted).map(
            |((carrier, converter, location, period), value)| {
                (*carrier, *converter, location, *period, value)
            },
        )
    }

    /// Iterate over energy put into and taken out of storage for every carrier, location and
    /// period
    pub fn iter_storage(
        &self,
    ) -> impl Iterator<Item = (EnergyCarrier, &LocationID, u32, f64, f64)> {
        let variables = &self.assembled.variables;
        self.iter_family(&variables.stored_in).map(|((carrier, location, period), stored_in)| {
            let stored_out = self.value(variables.stored_out(*carrier, location, *period));
            (*carrier, location, *period, stored_in, stored_out)
        })
    }

    /// The new investments made, with strictly positive (rounded) block counts only.
    ///
    /// Lines are reported over edges only; all other pairs are fixed to zero.
    pub fn investments(&self) -> Vec<InvestmentRecord<'a>> {
        let assembled = self.assembled;
        let variables = &assembled.variables;
        let coefficients = &assembled.coefficients;
        let mut records = Vec::new();
        let mut push = |technology, location, location_to, period, var: Variable| {
            let count = self.value(var).round();
            if count > 0.0 {
                records.push(InvestmentRecord {
                    technology,
                    location,
                    location_to,
                    period,
                    count: Blocks(count),
                    unit_cost: coefficients.investment_cost(
                        technology,
                        location,
                        location_to,
                        period,
                    ),
                });
            }
        };

        for ((carrier, from, to, period), var) in &variables.line_investment {
            if assembled.sets.is_edge(from, to) {
                push(Technology::Line(*carrier), from, Some(to), *period, *var);
            }
        }
        for ((supply_type, location, period), var) in &variables.supply_investment {
            push(Technology::Supply(*supply_type), location, None, *period, *var);
        }
        for ((converter, location, period), var) in &variables.converter_investment {
            push(Technology::Converter(*converter), location, None, *period, *var);
        }
        for ((carrier, location, period), var) in &variables.storage_investment {
            push(Technology::Storage(*carrier), location, None, *period, *var);
        }

        records
    }

    /// The total discounted cost of all new investments
    pub fn total_investment_cost(&self) -> Money {
        self.investments()
            .iter()
            .map(InvestmentRecord::total_cost)
            .sum()
    }
}

/// Whether an operation value is large enough to report
pub fn is_nonzero(value: f64) -> bool {
    value.abs() > VALUE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::model;
    use crate::formulation::assemble;
    use crate::model::Model;
    use crate::technology::InvestmentCategory;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn outcome_with(assembled: &AssembledModel, set: &[(Variable, f64)]) -> SolveOutcome {
        let mut values = vec![0.0; assembled.problem.num_variables()];
        for (var, value) in set {
            values[var.index()] = *value;
        }

        SolveOutcome {
            status: TerminationStatus::Optimal,
            objective_value: Some(assembled.problem.objective_value(&values)),
            values: Some(values),
            mip_gap: Some(0.0),
        }
    }

    #[rstest]
    fn test_investments(model: Model) {
        let assembled = assemble(&model).unwrap();
        let variables = &assembled.variables;
        let n1: LocationID = "Node_1".into();
        let n2: LocationID = "Node_2".into();
        let line = variables.line_investment(EnergyCarrier::Electricity, &n1, &n2, 2018);
        let chp = variables.converter_investment(EnergyConverter::CHP, &n2, 2020);
        let flow = variables.flow(EnergyCarrier::Electricity, &n1, &n2, 2018);
        let outcome = outcome_with(&assembled, &[(line, 0.999_999_9), (chp, 2.0), (flow, 3.5)]);
        let solution = Solution::new(&assembled, outcome).unwrap();

        let investments = solution.investments();
        assert_eq!(investments.len(), 2);
        assert_eq!(investments[0].technology, Technology::Line(EnergyCarrier::Electricity));
        assert_eq!(investments[0].location_to, Some(&n2));
        assert_eq!(investments[0].count, Blocks(1.0));
        assert_eq!(investments[1].technology.category(), InvestmentCategory::Converter);
        assert_eq!(investments[1].count, Blocks(2.0));
        assert_approx_eq!(
            f64,
            solution.total_investment_cost().value(),
            solution.objective_value.value(),
            epsilon = 1e-3
        );

        let flows: Vec<_> = solution
            .iter_flows()
            .filter(|(.., value)| is_nonzero(*value))
            .collect();
        assert_eq!(flows, [(EnergyCarrier::Electricity, &n1, &n2, 2018, 3.5)]);
    }

    #[rstest]
    fn test_new_without_values(model: Model) {
        let assembled = assemble(&model).unwrap();
        let outcome = SolveOutcome {
            status: TerminationStatus::Infeasible,
            objective_value: None,
            values: None,
            mip_gap: None,
        };
        assert!(Solution::new(&assembled, outcome).is_none());
    }
}
