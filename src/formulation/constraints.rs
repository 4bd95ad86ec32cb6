//! The constraint families of the formulation.
//!
//! Each family iterates over its valid index tuples and emits one row per tuple. Cumulative
//! capacity at period `t` is the brownfield offset plus the investments made at every period up to
//! and including `t`.
use super::VariableMap;
use crate::carrier::{EnergyCarrier, SupplyPolicy};
use crate::coefficients::Coefficients;
use crate::location::LocationID;
use crate::model::StorageMode;
use crate::problem::{Problem, Variable};
use crate::sets::Sets;
use crate::technology::{EnergyConverter, Technology};
use itertools::{chain, iproduct};
use std::ops::Range;

/// Corresponding keys for a family of constraints along with the row offset in the problem
#[derive(Debug, PartialEq)]
pub struct KeysWithOffset<T> {
    offset: usize,
    keys: Vec<T>,
}

impl<T> KeysWithOffset<T> {
    fn new(offset: usize) -> Self {
        Self {
            offset,
            keys: Vec::new(),
        }
    }

    /// Record a key for a row which has just been added
    fn push(&mut self, row: usize, key: T) {
        debug_assert_eq!(row, self.offset + self.keys.len(), "Rows must be contiguous");
        self.keys.push(key);
    }

    /// The rows covered by this family
    pub fn rows(&self) -> Range<usize> {
        self.offset..self.offset + self.keys.len()
    }

    /// The number of rows in this family
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether this family has no rows
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the row indices and their keys
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (self.offset + idx, key))
    }

    /// Get the key for a row, if the row belongs to this family
    pub fn get(&self, row: usize) -> Option<&T> {
        row.checked_sub(self.offset)
            .and_then(|idx| self.keys.get(idx))
    }
}

/// Keys indexed by carrier, location and period
pub type CarrierKeys = KeysWithOffset<(EnergyCarrier, LocationID, u32)>;

/// Keys for the max flow constraints: carrier, edge and period
pub type MaxFlowKeys = KeysWithOffset<(EnergyCarrier, LocationID, LocationID, u32)>;

/// Keys for the max conversion constraints: carrier, location, converter and period
pub type MaxConversionKeys = KeysWithOffset<(EnergyCarrier, LocationID, EnergyConverter, u32)>;

/// Keys for investment upper bounds: technology, location, other end of a line and period
pub type InvestmentLimitKeys = KeysWithOffset<(Technology, LocationID, Option<LocationID>, u32)>;

/// The keys for the different constraint families
#[derive(Debug, PartialEq)]
pub struct ConstraintKeys {
    /// Demand is a lower bound on the net energy available
    pub mass_balance: CarrierKeys,
    /// Carrier-dependent primary supply bounds
    pub max_supply: CarrierKeys,
    /// Flow in both directions along an edge is bounded by line capacity
    pub max_flow: MaxFlowKeys,
    /// Conversion throughput is bounded by converter capacity
    pub max_conversion: MaxConversionKeys,
    /// Upper bounds on new blocks per period
    pub investment_limits: InvestmentLimitKeys,
    /// Stored-in is bounded by capacity headroom. Only installed with storage.
    pub stored_in: CarrierKeys,
    /// Stored-out is bounded by decayed stock. Only installed with storage.
    pub stored_out: CarrierKeys,
    /// Stored-in is forced to zero. Only installed without storage.
    pub no_storage: CarrierKeys,
    /// Number of line investment variables fixed to zero for lying outside the edges
    pub masked_line_investments: usize,
    /// Number of flow variables fixed to zero for lying outside the arcs
    pub masked_flows: usize,
}

impl ConstraintKeys {
    /// Iterate over the names of the constraint families and their row ranges
    pub fn iter_families(&self) -> impl Iterator<Item = (&'static str, Range<usize>)> {
        [
            ("mass balance", self.mass_balance.rows()),
            ("max supply", self.max_supply.rows()),
            ("max flow", self.max_flow.rows()),
            ("max conversion", self.max_conversion.rows()),
            ("investment limits", self.investment_limits.rows()),
            ("stored in", self.stored_in.rows()),
            ("stored out", self.stored_out.rows()),
            ("no storage", self.no_storage.rows()),
        ]
        .into_iter()
    }

    /// Describe the constraint at the given row, for diagnostics
    pub fn describe_row(&self, row: usize) -> Option<String> {
        let describe = |family: &str, key: String| Some(format!("{family} ({key})"));

        if let Some((carrier, location, period)) = self.mass_balance.get(row) {
            return describe("mass balance", format!("{carrier}, {location}, {period}"));
        }
        if let Some((carrier, location, period)) = self.max_supply.get(row) {
            return describe("max supply", format!("{carrier}, {location}, {period}"));
        }
        if let Some((carrier, from, to, period)) = self.max_flow.get(row) {
            return describe("max flow", format!("{carrier}, {from}-{to}, {period}"));
        }
        if let Some((carrier, location, converter, period)) = self.max_conversion.get(row) {
            return describe(
                "max conversion",
                format!("{carrier}, {location}, {converter}, {period}"),
            );
        }
        if let Some((technology, location, location_to, period)) = self.investment_limits.get(row)
        {
            let location = match location_to {
                Some(to) => format!("{location}-{to}"),
                None => location.to_string(),
            };
            return describe("investment limit", format!("{technology}, {location}, {period}"));
        }
        for (family, keys) in [
            ("stored in", &self.stored_in),
            ("stored out", &self.stored_out),
            ("no storage", &self.no_storage),
        ] {
            if let Some((carrier, location, period)) = keys.get(row) {
                return describe(family, format!("{carrier}, {location}, {period}"));
            }
        }

        None
    }
}

/// Install every constraint family for the given storage mode.
///
/// # Arguments
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `sets` - The index sets
/// * `coefficients` - Derived coefficients
/// * `storage_mode` - Which storage constraints to install
///
/// # Returns
///
/// The keys for each constraint family
pub fn add_model_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
    storage_mode: StorageMode,
) -> ConstraintKeys {
    let (masked_line_investments, masked_flows) = add_topology_masking(problem, variables, sets);
    let mass_balance = add_mass_balance_constraints(problem, variables, sets, coefficients);
    let max_supply = add_max_supply_constraints(problem, variables, sets, coefficients);
    let max_flow = add_max_flow_constraints(problem, variables, sets, coefficients);
    let max_conversion = add_max_conversion_constraints(problem, variables, sets, coefficients);
    let investment_limits =
        add_investment_limit_constraints(problem, variables, sets, coefficients, storage_mode);

    let offset = problem.num_constraints();
    let (stored_in, stored_out, no_storage) = match storage_mode {
        StorageMode::WithStorage => {
            let stored_in = add_stored_in_constraints(problem, variables, sets, coefficients);
            let stored_out = add_stored_out_constraints(problem, variables, sets, coefficients);
            let no_storage = CarrierKeys::new(problem.num_constraints());
            (stored_in, stored_out, no_storage)
        }
        StorageMode::WithoutStorage => {
            let no_storage = add_no_storage_constraints(problem, variables, sets);
            (
                CarrierKeys::new(offset),
                CarrierKeys::new(offset),
                no_storage,
            )
        }
    };

    ConstraintKeys {
        mass_balance,
        max_supply,
        max_flow,
        max_conversion,
        investment_limits,
        stored_in,
        stored_out,
        no_storage,
        masked_line_investments,
        masked_flows,
    }
}

/// Fix line investments outside the edges and flows outside the arcs to exactly zero.
///
/// Returns the number of masked line investment and flow variables.
fn add_topology_masking(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
) -> (usize, usize) {
    let mut masked_line_investments = 0;
    for ((_, from, to, _), var) in &variables.line_investment {
        if !sets.is_edge(from, to) {
            problem.fix(*var, 0.0);
            masked_line_investments += 1;
        }
    }

    let mut masked_flows = 0;
    for ((_, from, to, _), var) in &variables.flow {
        if !sets.is_arc(from, to) {
            problem.fix(*var, 0.0);
            masked_flows += 1;
        }
    }

    (masked_line_investments, masked_flows)
}

/// Sum of the variables for the given periods, each multiplied by `coeff`
fn cumulative<'a, F>(
    sets: &'a Sets,
    period: u32,
    coeff: f64,
    mut get_var: F,
) -> impl Iterator<Item = (Variable, f64)> + 'a
where
    F: FnMut(u32) -> Variable + 'a,
{
    sets.periods_up_to(period)
        .map(move |period2| (get_var(period2), coeff))
}

/// Add mass balance constraints.
///
/// For every carrier, location and period:
///
/// `supplied + (1 - loss) * inflow - outflow + converted - stored_in + stored_out >= demand`
///
/// where `converted` sums the throughput of every source carrier on every converter, weighted by
/// the conversion efficiency into this carrier.
fn add_mass_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> CarrierKeys {
    let mut keys = CarrierKeys::new(problem.num_constraints());
    for (&carrier, location, &period) in
        iproduct!(&sets.carriers, &sets.locations, &sets.periods)
    {
        let retained = 1.0 - coefficients.line(carrier).loss_factor.value();
        let inflow = sets
            .iter_inbound(location)
            .map(|from| (variables.flow(carrier, from, location, period), retained));
        let outflow = sets
            .iter_outbound(location)
            .map(|to| (variables.flow(carrier, location, to, period), -1.0));
        let converted = iproduct!(&sets.carriers, &sets.converters).map(|(&source, &converter)| {
            let efficiency = coefficients.efficiency(carrier, source, converter).value();
            (
                variables.converted(source, converter, location, period),
                efficiency,
            )
        });
        let terms = chain!(
            [(variables.supplied(carrier, location, period), 1.0)],
            inflow,
            outflow,
            converted,
            [
                (variables.stored_in(carrier, location, period), -1.0),
                (variables.stored_out(carrier, location, period), 1.0),
            ]
        );

        let demand = coefficients.demand(carrier, location, period).value();
        let row = problem.add_constraint(terms, demand..);
        keys.push(row, (carrier, location.clone(), period));
    }

    keys
}

/// Add max supply constraints, following each carrier's supply policy.
///
/// * Electricity is bounded by the cumulative renewable capacity, scaled by availability
/// * Gas is bounded by the given supply
/// * Heat is forced to zero
fn add_max_supply_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> CarrierKeys {
    let mut keys = CarrierKeys::new(problem.num_constraints());
    for (&carrier, location, &period) in
        iproduct!(&sets.carriers, &sets.locations, &sets.periods)
    {
        let supplied = variables.supplied(carrier, location, period);
        let row = match carrier.supply_policy() {
            SupplyPolicy::Investment => {
                let mut terms = vec![(supplied, 1.0)];
                let mut existing = 0.0;
                for &supply_type in &sets.supply_types {
                    let unit = coefficients.supply_unit(supply_type);
                    let availability = coefficients.availability(supply_type, location, period);
                    let per_block = unit.max_supply.value() * availability.value();
                    existing += coefficients.brownfield(
                        Technology::Supply(supply_type),
                        location,
                        None,
                    ) * per_block;
                    terms.extend(cumulative(sets, period, -per_block, |period2| {
                        variables.supply_investment(supply_type, location, period2)
                    }));
                }
                problem.add_constraint(terms, ..=existing)
            }
            SupplyPolicy::Given => {
                let given = coefficients.given_gas(location, period).value();
                problem.add_constraint([(supplied, 1.0)], ..=given)
            }
            SupplyPolicy::None => problem.add_constraint([(supplied, 1.0)], 0.0..=0.0),
        };
        keys.push(row, (carrier, location.clone(), period));
    }

    keys
}

/// Add max flow constraints.
///
/// For every carrier, edge and period, the flow in both directions is bounded by the cumulative
/// line capacity on the edge.
fn add_max_flow_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> MaxFlowKeys {
    let mut keys = MaxFlowKeys::new(problem.num_constraints());
    for (&carrier, (from, to), &period) in iproduct!(&sets.carriers, &sets.edges, &sets.periods) {
        let max_flow = coefficients.line(carrier).max_flow.value();
        let existing =
            coefficients.brownfield(Technology::Line(carrier), from, Some(to)) * max_flow;
        let terms = chain!(
            [
                (variables.flow(carrier, from, to, period), 1.0),
                (variables.flow(carrier, to, from, period), 1.0),
            ],
            cumulative(sets, period, -max_flow, |period2| {
                variables.line_investment(carrier, from, to, period2)
            })
        );

        let row = problem.add_constraint(terms, ..=existing);
        keys.push(row, (carrier, from.clone(), to.clone(), period));
    }

    keys
}

/// Add max conversion constraints.
///
/// For every carrier, location, converter and period, the throughput of the carrier on the
/// converter is bounded by the cumulative converter capacity.
fn add_max_conversion_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> MaxConversionKeys {
    let mut keys = MaxConversionKeys::new(problem.num_constraints());
    for (&carrier, location, &converter, &period) in iproduct!(
        &sets.carriers,
        &sets.locations,
        &sets.converters,
        &sets.periods
    ) {
        let limit = coefficients.max_converted(carrier, converter).value();
        let existing =
            coefficients.brownfield(Technology::Converter(converter), location, None) * limit;
        let terms = chain!(
            [(
                variables.converted(carrier, converter, location, period),
                1.0
            )],
            cumulative(sets, period, -limit, |period2| {
                variables.converter_investment(converter, location, period2)
            })
        );

        let row = problem.add_constraint(terms, ..=existing);
        keys.push(row, (carrier, location.clone(), converter, period));
    }

    keys
}

/// Add upper bounds on the number of new blocks per period.
///
/// Line bounds apply to edges only. Storage bounds are only installed with storage.
fn add_investment_limit_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
    storage_mode: StorageMode,
) -> InvestmentLimitKeys {
    let mut keys = InvestmentLimitKeys::new(problem.num_constraints());
    let mut add_limit = |technology: Technology,
                         location: &LocationID,
                         location_to: Option<&LocationID>,
                         period: u32,
                         var: Variable| {
        let max = coefficients.max_investments(technology, location, location_to, period);
        let row = problem.add_constraint([(var, 1.0)], ..=max);
        keys.push(
            row,
            (technology, location.clone(), location_to.cloned(), period),
        );
    };

    for (&carrier, (from, to), &period) in iproduct!(&sets.carriers, &sets.edges, &sets.periods) {
        let var = variables.line_investment(carrier, from, to, period);
        add_limit(Technology::Line(carrier), from, Some(to), period, var);
    }

    for (&supply_type, location, &period) in
        iproduct!(&sets.supply_types, &sets.locations, &sets.periods)
    {
        let var = variables.supply_investment(supply_type, location, period);
        add_limit(Technology::Supply(supply_type), location, None, period, var);
    }

    for (&converter, location, &period) in
        iproduct!(&sets.converters, &sets.locations, &sets.periods)
    {
        let var = variables.converter_investment(converter, location, period);
        add_limit(Technology::Converter(converter), location, None, period, var);
    }

    if storage_mode == StorageMode::WithStorage {
        for (&carrier, location, &period) in
            iproduct!(&sets.carriers, &sets.locations, &sets.periods)
        {
            let var = variables.storage_investment(carrier, location, period);
            add_limit(Technology::Storage(carrier), location, None, period, var);
        }
    }

    keys
}

/// Terms for the decayed net stock accumulated strictly before `period`, multiplied by `sign`:
/// `sum(stored_in[t2] * decay^(period - t2)) - sum(stored_out[t2])` over `t2 < period`.
///
/// The decay exponent is the raw difference between the period labels.
fn decayed_stock<'a>(
    variables: &'a VariableMap,
    sets: &'a Sets,
    carrier: EnergyCarrier,
    location: &'a LocationID,
    period: u32,
    decay: f64,
    sign: f64,
) -> impl Iterator<Item = (Variable, f64)> + 'a {
    sets.periods_before(period).flat_map(move |period2| {
        let elapsed = f64::from(period) - f64::from(period2);
        [
            (
                variables.stored_in(carrier, location, period2),
                sign * decay.powf(elapsed),
            ),
            (variables.stored_out(carrier, location, period2), -sign),
        ]
    })
}

/// Add stored-in constraints.
///
/// For every carrier, location and period, energy put into storage is bounded by the cumulative
/// storage capacity less the decayed stock from earlier periods.
fn add_stored_in_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> CarrierKeys {
    let mut keys = CarrierKeys::new(problem.num_constraints());
    for (&carrier, location, &period) in
        iproduct!(&sets.carriers, &sets.locations, &sets.periods)
    {
        let unit = coefficients.storage_unit(carrier);
        let capacity = unit.max_level.value();
        let existing =
            coefficients.brownfield(Technology::Storage(carrier), location, None) * capacity;
        let terms = chain!(
            [(variables.stored_in(carrier, location, period), 1.0)],
            decayed_stock(
                variables,
                sets,
                carrier,
                location,
                period,
                unit.decay.value(),
                1.0
            ),
            cumulative(sets, period, -capacity, |period2| {
                variables.storage_investment(carrier, location, period2)
            })
        );

        let row = problem.add_constraint(terms, ..=existing);
        keys.push(row, (carrier, location.clone(), period));
    }

    keys
}

/// Add stored-out constraints.
///
/// For every carrier, location and period, energy taken out of storage is bounded by the decayed
/// stock from earlier periods.
fn add_stored_out_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
    coefficients: &Coefficients,
) -> CarrierKeys {
    let mut keys = CarrierKeys::new(problem.num_constraints());
    for (&carrier, location, &period) in
        iproduct!(&sets.carriers, &sets.locations, &sets.periods)
    {
        let decay = coefficients.storage_unit(carrier).decay.value();
        let terms = chain!(
            [(variables.stored_out(carrier, location, period), 1.0)],
            decayed_stock(variables, sets, carrier, location, period, decay, -1.0)
        );

        let row = problem.add_constraint(terms, ..=0.0);
        keys.push(row, (carrier, location.clone(), period));
    }

    keys
}

/// Force stored-in to zero for every carrier, location and period
fn add_no_storage_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    sets: &Sets,
) -> CarrierKeys {
    let mut keys = CarrierKeys::new(problem.num_constraints());
    for (&carrier, location, &period) in
        iproduct!(&sets.carriers, &sets.locations, &sets.periods)
    {
        let var = variables.stored_in(carrier, location, period);
        let row = problem.add_constraint([(var, 1.0)], 0.0..=0.0);
        keys.push(row, (carrier, location.clone(), period));
    }

    keys
}
