//! The objective: total discounted investment cost.
use super::VariableMap;
use crate::coefficients::Coefficients;
use crate::problem::Problem;
use crate::sets::Sets;
use itertools::iproduct;

/// Set the objective coefficients of the investment variables.
///
/// Line investments are costed over edges only; all other pairs are masked. Operation variables
/// carry no cost.
pub fn add_objective(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) {
    for (&carrier, (from, to), &period) in iproduct!(&sets.carriers, &sets.edges, &sets.periods) {
        let var = variables.line_investment(carrier, from, to, period);
        let cost = coefficients.network_cost(carrier, from, to, period);
        problem.set_cost(var, cost.value());
    }

    for ((supply_type, _, period), var) in &variables.supply_investment {
        let cost = coefficients.supply_cost(*supply_type, *period);
        problem.set_cost(*var, cost.value());
    }

    for ((converter, _, period), var) in &variables.converter_investment {
        let cost = coefficients.converter_cost(*converter, *period);
        problem.set_cost(*var, cost.value());
    }

    for ((carrier, _, period), var) in &variables.storage_investment {
        let cost = coefficients.storage_cost(*carrier, *period);
        problem.set_cost(*var, cost.value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::EnergyCarrier;
    use crate::fixture::{model, sets};
    use crate::location::LocationID;
    use crate::model::Model;
    use crate::technology::EnergyConverter;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_add_objective(model: Model, sets: Sets) {
        let coefficients = Coefficients::derive(&model, &sets).unwrap();
        let mut problem = Problem::default();
        let variables = VariableMap::new(&mut problem, &sets);
        add_objective(&mut problem, &variables, &sets, &coefficients);

        let n1: LocationID = "Node_1".into();
        let n2: LocationID = "Node_2".into();
        let cost = |var| problem.variable(var).cost;

        // Lines are costed in their edge orientation only
        let edge = variables.line_investment(EnergyCarrier::Electricity, &n1, &n2, 2018);
        assert_approx_eq!(f64, cost(edge), 100.0);
        let reverse = variables.line_investment(EnergyCarrier::Electricity, &n2, &n1, 2018);
        assert_approx_eq!(f64, cost(reverse), 0.0);

        let var = variables.converter_investment(EnergyConverter::CHP, &n2, 2022);
        assert_approx_eq!(f64, cost(var), 30.0 / 1.05f64.powi(4), epsilon = 1e-9);

        // Operation carries no cost
        for var in variables.flow.values().chain(variables.supplied.values()) {
            assert_approx_eq!(f64, cost(*var), 0.0);
        }
    }
}
