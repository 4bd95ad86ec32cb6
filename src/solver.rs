//! Solves an assembled [`Problem`] with an external MILP solver.
//!
//! Only HiGHS is supported. Infeasible or unbounded problems are not errors here: they are
//! reported through [`TerminationStatus`] and the caller decides how to react.
use crate::problem::{Problem, VariableKind};
use derive_more::Display;
use highs::{HighsModelStatus, RowProblem, Sense};
use log::{debug, info, log_enabled};
use std::error::Error;

/// The name of the only supported solver backend
pub const HIGHS_SOLVER_NAME: &str = "highs";

/// How the solver run ended
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    /// A proven optimum (within the gap tolerance) was found
    #[display("optimal")]
    Optimal,
    /// The time limit expired; the best incumbent, if any, is returned
    #[display("time-limit")]
    TimeLimit,
    /// No feasible solution exists
    #[display("infeasible")]
    Infeasible,
    /// The objective can decrease without bound
    #[display("unbounded")]
    Unbounded,
    /// The solver failed for some other reason
    #[display("error")]
    Error,
}

impl TerminationStatus {
    /// Whether the status is one that carries a usable solution
    pub fn is_usable(self) -> bool {
        matches!(self, Self::Optimal | Self::TimeLimit)
    }
}

impl From<HighsModelStatus> for TerminationStatus {
    fn from(status: HighsModelStatus) -> Self {
        match status {
            HighsModelStatus::Optimal => Self::Optimal,
            HighsModelStatus::ReachedTimeLimit => Self::TimeLimit,
            // Investment costs are non-negative, so the objective is bounded below
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                Self::Infeasible
            }
            HighsModelStatus::Unbounded => Self::Unbounded,
            _ => Self::Error,
        }
    }
}

/// Errors raised before any solve is attempted
#[derive(Debug, Display, Clone, PartialEq)]
pub enum SolverError {
    /// The requested solver backend is not available
    #[display("Solver \"{_0}\" is not available (supported: {})", HIGHS_SOLVER_NAME)]
    Unavailable(String),
}

impl Error for SolverError {}

/// The result of a solver run
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// How the run ended
    pub status: TerminationStatus,
    /// The objective value, if a solution is available
    pub objective_value: Option<f64>,
    /// The value of each column, in column order, if a solution is available
    pub values: Option<Vec<f64>>,
    /// The relative gap between the incumbent and the best bound, if a solution is available
    pub mip_gap: Option<f64>,
}

impl SolveOutcome {
    fn without_solution(status: TerminationStatus) -> Self {
        Self {
            status,
            objective_value: None,
            values: None,
            mip_gap: None,
        }
    }
}

/// Options for a solver run
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions<'a> {
    /// Name of the solver backend
    pub solver_name: &'a str,
    /// Wall-clock time limit in seconds
    pub time_limit: f64,
    /// Relative optimality gap at which the search stops
    pub mip_gap: f64,
}

/// Convert a [`Problem`] into the HiGHS representation
fn to_highs_problem(problem: &Problem) -> RowProblem {
    let mut highs_problem = RowProblem::default();
    let columns: Vec<_> = problem
        .iter_variables()
        .map(|definition| {
            let bounds = definition.min..=definition.max;
            match definition.kind {
                VariableKind::Continuous => highs_problem.add_column(definition.cost, bounds),
                VariableKind::Integer => highs_problem.add_integer_column(definition.cost, bounds),
            }
        })
        .collect();

    for constraint in problem.iter_constraints() {
        highs_problem.add_row(
            constraint.min..=constraint.max,
            constraint
                .terms
                .iter()
                .map(|(var, coeff)| (columns[var.index()], *coeff)),
        );
    }

    highs_problem
}

/// Solve the problem, minimising the objective.
///
/// # Arguments
///
/// * `problem` - The assembled problem
/// * `options` - Solver name, time limit and gap tolerance
///
/// # Returns
///
/// The termination status with the objective value and column values where available, or an
/// error if the requested solver is not available.
pub fn solve(problem: &Problem, options: &SolveOptions) -> Result<SolveOutcome, SolverError> {
    if !options.solver_name.eq_ignore_ascii_case(HIGHS_SOLVER_NAME) {
        return Err(SolverError::Unavailable(options.solver_name.to_string()));
    }

    info!(
        "Solving problem with {} variables and {} constraints",
        problem.num_variables(),
        problem.num_constraints()
    );
    let mut highs_model = to_highs_problem(problem).optimise(Sense::Minimise);
    highs_model.set_option("time_limit", options.time_limit);
    highs_model.set_option("mip_rel_gap", options.mip_gap);

    // HiGHS writes straight to the console, bypassing our logger
    let verbose = log_enabled!(log::Level::Debug);
    highs_model.set_option("output_flag", verbose);
    highs_model.set_option("log_to_console", verbose);

    let solved = match highs_model.try_solve() {
        Ok(solved) => solved,
        Err(status) => {
            debug!("HiGHS run failed: {status:?}");
            return Ok(SolveOutcome::without_solution(TerminationStatus::Error));
        }
    };

    let model_status = solved.status();
    debug!("HiGHS model status: {model_status:?}");
    let status = TerminationStatus::from(model_status);
    if !status.is_usable() {
        return Ok(SolveOutcome::without_solution(status));
    }

    let objective_value = solved.objective_value();
    let values = solved.get_solution().columns().to_vec();
    if !objective_value.is_finite() || values.len() != problem.num_variables() {
        // Time limit reached before any incumbent was found
        return Ok(SolveOutcome::without_solution(status));
    }

    // Infinite when the problem has no integer columns
    let mip_gap = Some(solved.mip_gap()).filter(|gap| gap.is_finite());
    if let Some(gap) = mip_gap {
        debug!("Achieved MIP gap: {gap}");
    }

    Ok(SolveOutcome {
        status,
        objective_value: Some(objective_value),
        values: Some(values),
        mip_gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn options(solver_name: &str) -> SolveOptions<'_> {
        SolveOptions {
            solver_name,
            time_limit: 10.0,
            mip_gap: 0.0,
        }
    }

    /// min 3x + 2y subject to x + y >= 2.5, x integer
    fn small_problem(x_max: f64) -> Problem {
        let mut problem = Problem::default();
        let x = problem.add_variable(VariableKind::Integer, 0.0..=x_max);
        let y = problem.add_variable(VariableKind::Continuous, 0.0..=1.0);
        problem.set_cost(x, 3.0);
        problem.set_cost(y, 2.0);
        problem.add_constraint([(x, 1.0), (y, 1.0)], 2.5..);
        problem
    }

    #[rstest]
    #[case("highs")]
    #[case("HiGHS")]
    fn test_solve_optimal(#[case] solver_name: &str) {
        let outcome = solve(&small_problem(10.0), &options(solver_name)).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);

        // x = 2, y = 0.5
        assert_approx_eq!(f64, outcome.objective_value.unwrap(), 7.0, epsilon = 1e-6);
        let values = outcome.values.unwrap();
        assert_approx_eq!(f64, values[0], 2.0, epsilon = 1e-6);
        assert_approx_eq!(f64, values[1], 0.5, epsilon = 1e-6);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.5)]
    fn test_solve_reports_mip_gap(#[case] mip_gap: f64) {
        let options = SolveOptions {
            mip_gap,
            ..options("highs")
        };
        let outcome = solve(&small_problem(10.0), &options).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);

        let gap = outcome.mip_gap.unwrap();
        assert!(gap >= 0.0);
        assert!(gap <= mip_gap + 1e-9);
    }

    #[test]
    fn test_solve_continuous_has_no_mip_gap() {
        let mut problem = Problem::default();
        let x = problem.add_variable(VariableKind::Continuous, 0.0..=10.0);
        problem.set_cost(x, 1.0);
        problem.add_constraint([(x, 1.0)], 2.0..);

        let outcome = solve(&problem, &options("highs")).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);
        assert_approx_eq!(f64, outcome.objective_value.unwrap(), 2.0, epsilon = 1e-6);
        assert!(outcome.mip_gap.is_none());
    }

    #[test]
    fn test_solve_infeasible() {
        let outcome = solve(&small_problem(1.0), &options("highs")).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Infeasible);
        assert!(outcome.values.is_none());
        assert!(outcome.objective_value.is_none());
        assert!(outcome.mip_gap.is_none());
    }

    #[test]
    fn test_solve_unavailable() {
        let result = solve(&small_problem(10.0), &options("cplex"));
        assert_eq!(result, Err(SolverError::Unavailable("cplex".into())));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Solver \"cplex\" is not available (supported: highs)"
        );
    }

    #[test]
    fn test_termination_status_display() {
        assert_eq!(TerminationStatus::TimeLimit.to_string(), "time-limit");
        assert!(TerminationStatus::TimeLimit.is_usable());
        assert!(!TerminationStatus::Unbounded.is_usable());
        assert_eq!(
            TerminationStatus::from(HighsModelStatus::UnboundedOrInfeasible),
            TerminationStatus::Infeasible
        );
    }
}
