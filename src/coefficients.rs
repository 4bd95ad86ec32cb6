//! Derivation of the fully indexed coefficients of the formulation from the raw model tables.
//!
//! Investment costs are given at a reference period and discounted to every period with
//! [`discounted_cost`]. Sparse tables (efficiencies, demand, given supply) are looked up with a
//! default for absent entries.
use crate::carrier::EnergyCarrier;
use crate::input::check_keys_present;
use crate::location::LocationID;
use crate::model::Model;
use crate::sets::Sets;
use crate::technology::{
    EnergyConverter, InvestmentCategory, LineParameters, StorageUnit, SupplyType, SupplyUnit,
    Technology,
};
use crate::units::{Dimensionless, Energy, EnergyPerBlock, MoneyPerBlock};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use itertools::{Itertools, iproduct};
use log::warn;
use std::cell::Cell;

/// Discounted line costs keyed by carrier, location pair and period
pub type NetworkCostTable = IndexMap<(EnergyCarrier, LocationID, LocationID, u32), MoneyPerBlock>;

/// Discount a base cost to the given period.
///
/// The cost is divided by `(1 + discount_rate + development_rate)^(period - reference_period)`.
/// The exponent is the raw difference between the period labels and may be negative.
pub fn discounted_cost(
    base_cost: MoneyPerBlock,
    discount_rate: Dimensionless,
    development_rate: Dimensionless,
    period: u32,
    reference_period: u32,
) -> MoneyPerBlock {
    let exponent = f64::from(period) - f64::from(reference_period);
    let factor = (Dimensionless(1.0) + discount_rate + development_rate).powf(exponent);
    base_cost / factor
}

/// The coefficients of the formulation, derived once from a [`Model`]
#[derive(Debug)]
pub struct Coefficients<'a> {
    model: &'a Model,
    /// Dense over all carriers, location pairs and periods
    network_costs: NetworkCostTable,
    supply_costs: IndexMap<(SupplyType, u32), MoneyPerBlock>,
    converter_costs: IndexMap<(EnergyConverter, u32), MoneyPerBlock>,
    storage_costs: IndexMap<(EnergyCarrier, u32), MoneyPerBlock>,
    warned_availability: Cell<bool>,
}

impl<'a> Coefficients<'a> {
    /// Derive coefficients for every index tuple in `sets`.
    ///
    /// Fails if a technology in the decision-variable domain has no unit data.
    pub fn derive(model: &'a Model, sets: &Sets) -> Result<Self> {
        check_coverage(model, sets)?;

        let parameters = &model.parameters;
        let discount_rate = parameters.discount_rate;
        let reference_period = parameters.reference_period();
        let discount = |base_cost, development_rate, period| {
            discounted_cost(
                base_cost,
                discount_rate,
                development_rate,
                period,
                reference_period,
            )
        };

        let network_costs = iproduct!(
            sets.carriers.iter(),
            sets.locations.iter(),
            sets.locations.iter(),
            sets.periods.iter()
        )
        .map(|(&carrier, from, to, &period)| {
            let base_cost = base_network_cost(model, carrier, from, to);
            let cost = discount(base_cost, Dimensionless(0.0), period);
            ((carrier, from.clone(), to.clone(), period), cost)
        })
        .collect();

        let supply_costs = iproduct!(sets.supply_types.iter(), sets.periods.iter())
            .map(|(&supply_type, &period)| {
                let unit = &model.supply_units[&supply_type];
                let cost = discount(unit.cost, unit.development_rate, period);
                ((supply_type, period), cost)
            })
            .collect();

        let converter_costs = iproduct!(sets.converters.iter(), sets.periods.iter())
            .map(|(&converter, &period)| {
                let unit = &model.converter_units[&converter];
                let cost = discount(unit.cost, unit.development_rate, period);
                ((converter, period), cost)
            })
            .collect();

        let storage_costs = iproduct!(sets.carriers.iter(), sets.periods.iter())
            .map(|(&carrier, &period)| {
                let unit = &model.storage_units[&carrier];
                let cost = discount(unit.cost, unit.development_rate, period);
                ((carrier, period), cost)
            })
            .collect();

        Ok(Self {
            model,
            network_costs,
            supply_costs,
            converter_costs,
            storage_costs,
            warned_availability: Cell::new(false),
        })
    }

    /// Discounted cost of a line block
    pub fn network_cost(
        &self,
        carrier: EnergyCarrier,
        from: &LocationID,
        to: &LocationID,
        period: u32,
    ) -> MoneyPerBlock {
        self.network_costs[&(carrier, from.clone(), to.clone(), period)]
    }

    /// Discounted cost of a supply block
    pub fn supply_cost(&self, supply_type: SupplyType, period: u32) -> MoneyPerBlock {
        self.supply_costs[&(supply_type, period)]
    }

    /// Discounted cost of a converter block
    pub fn converter_cost(&self, converter: EnergyConverter, period: u32) -> MoneyPerBlock {
        self.converter_costs[&(converter, period)]
    }

    /// Discounted cost of a storage block
    pub fn storage_cost(&self, carrier: EnergyCarrier, period: u32) -> MoneyPerBlock {
        self.storage_costs[&(carrier, period)]
    }

    /// Discounted cost of one block of the given technology.
    ///
    /// For lines, `location_to` is the other end of the edge.
    pub fn investment_cost(
        &self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
        period: u32,
    ) -> MoneyPerBlock {
        match technology {
            Technology::Line(carrier) => {
                let to = location_to.expect("Lines must have two locations");
                self.network_cost(carrier, location, to, period)
            }
            Technology::Supply(supply_type) => self.supply_cost(supply_type, period),
            Technology::Converter(converter) => self.converter_cost(converter, period),
            Technology::Storage(carrier) => self.storage_cost(carrier, period),
        }
    }

    /// Iterate over every derived investment cost, for reporting
    pub fn iter_costs(&self) -> impl Iterator<Item = CostEntry<'_>> {
        let lines = self
            .network_costs
            .iter()
            .map(|((carrier, from, to, period), cost)| CostEntry {
                technology: Technology::Line(*carrier),
                location_from: Some(from),
                location_to: Some(to),
                period: *period,
                cost: *cost,
            });
        let supply = self
            .supply_costs
            .iter()
            .map(|((supply_type, period), cost)| {
                CostEntry::unlocated(Technology::Supply(*supply_type), *period, *cost)
            });
        let converters = self
            .converter_costs
            .iter()
            .map(|((converter, period), cost)| {
                CostEntry::unlocated(Technology::Converter(*converter), *period, *cost)
            });
        let storage = self
            .storage_costs
            .iter()
            .map(|((carrier, period), cost)| {
                CostEntry::unlocated(Technology::Storage(*carrier), *period, *cost)
            });

        lines.chain(supply).chain(converters).chain(storage)
    }

    /// Line properties for a carrier
    pub fn line(&self, carrier: EnergyCarrier) -> &'a LineParameters {
        &self.model.line_parameters[&carrier]
    }

    /// Supply unit properties for a supply type
    pub fn supply_unit(&self, supply_type: SupplyType) -> &'a SupplyUnit {
        &self.model.supply_units[&supply_type]
    }

    /// Storage unit properties for a carrier
    pub fn storage_unit(&self, carrier: EnergyCarrier) -> &'a StorageUnit {
        &self.model.storage_units[&carrier]
    }

    /// Maximum throughput of `carrier` per converter block
    pub fn max_converted(&self, carrier: EnergyCarrier, converter: EnergyConverter) -> EnergyPerBlock {
        self.model.conversion_limits[&(carrier, converter)]
    }

    /// Contribution of one unit of `source` converted on `converter` to the balance of `carrier`
    pub fn efficiency(
        &self,
        carrier: EnergyCarrier,
        source: EnergyCarrier,
        converter: EnergyConverter,
    ) -> Dimensionless {
        self.model
            .conversion_efficiencies
            .get(&(carrier, source, converter))
            .copied()
            .unwrap_or_default()
    }

    /// Exogenous demand. Absent entries are zero.
    pub fn demand(&self, carrier: EnergyCarrier, location: &LocationID, period: u32) -> Energy {
        self.model
            .demand
            .get(&(carrier, location.clone(), period))
            .copied()
            .unwrap_or_default()
    }

    /// Exogenous gas supply. Absent entries are zero.
    pub fn given_gas(&self, location: &LocationID, period: u32) -> Energy {
        self.model
            .given_supply
            .gas
            .get(&(location.clone(), period))
            .copied()
            .unwrap_or_default()
    }

    /// Availability multiplier for renewable supply. Absent entries are one.
    pub fn availability(
        &self,
        supply_type: SupplyType,
        location: &LocationID,
        period: u32,
    ) -> Dimensionless {
        if let Some(value) = self
            .model
            .given_supply
            .availability
            .get(&(supply_type, location.clone(), period))
        {
            return *value;
        }

        if !self.warned_availability.replace(true) {
            warn!(
                "No availability given for some supply types, locations and periods \
                (first: {supply_type} at {location} in {period}). Assuming full availability."
            );
        }

        Dimensionless(1.0)
    }

    /// Brownfield blocks for a technology at a location (or, for lines, between two locations)
    pub fn brownfield(
        &self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
    ) -> f64 {
        let blocks = match (technology, location_to) {
            (Technology::Line(carrier), Some(to)) => {
                self.model.brownfield.line(carrier, location, to)
            }
            _ => self.model.brownfield.at_location(technology, location),
        };
        blocks.value()
    }

    /// Upper bound on new blocks of a technology in a period
    pub fn max_investments(
        &self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
        period: u32,
    ) -> f64 {
        self.model
            .investment_limits
            .max_investments(technology, location, location_to, period)
            .value()
    }
}

/// A derived investment cost, for reporting
#[derive(Debug, PartialEq)]
pub struct CostEntry<'a> {
    /// The technology
    pub technology: Technology,
    /// For lines, the first location of the pair
    pub location_from: Option<&'a LocationID>,
    /// For lines, the second location of the pair
    pub location_to: Option<&'a LocationID>,
    /// The period
    pub period: u32,
    /// Discounted cost of one block
    pub cost: MoneyPerBlock,
}

impl CostEntry<'_> {
    fn unlocated(technology: Technology, period: u32, cost: MoneyPerBlock) -> Self {
        Self {
            technology,
            location_from: None,
            location_to: None,
            period,
            cost,
        }
    }

    /// The investment category of the entry
    pub fn category(&self) -> InvestmentCategory {
        self.technology.category()
    }
}

/// Base line cost for a location pair, taken from either orientation. Absent pairs cost nothing.
fn base_network_cost(
    model: &Model,
    carrier: EnergyCarrier,
    from: &LocationID,
    to: &LocationID,
) -> MoneyPerBlock {
    model
        .network
        .get(&(carrier, from.clone(), to.clone()))
        .or_else(|| model.network.get(&(carrier, to.clone(), from.clone())))
        .copied()
        .unwrap_or_default()
}

/// Check that every technology in the decision-variable domain has the data it needs
fn check_coverage(model: &Model, sets: &Sets) -> Result<()> {
    let missing_network_costs = iproduct!(sets.carriers.iter(), sets.edges.iter())
        .filter(|(carrier, (from, to))| {
            !model.network.contains_key(&(**carrier, from.clone(), to.clone()))
                && !model.network.contains_key(&(**carrier, to.clone(), from.clone()))
        })
        .map(|(carrier, (from, to))| format!("{carrier} {from}-{to}"))
        .join(", ");
    ensure!(
        missing_network_costs.is_empty(),
        "Missing network cost for: {missing_network_costs}"
    );

    check_keys_present(
        &model.line_parameters,
        sets.carriers.iter().copied(),
        "line parameters",
    )?;
    check_keys_present(
        &model.supply_units,
        sets.supply_types.iter().copied(),
        "supply unit",
    )?;
    check_keys_present(
        &model.converter_units,
        sets.converters.iter().copied(),
        "converter unit",
    )?;

    let missing_limits = iproduct!(sets.carriers.iter(), sets.converters.iter())
        .filter(|(carrier, converter)| {
            !model
                .conversion_limits
                .contains_key(&(**carrier, **converter))
        })
        .map(|(carrier, converter)| format!("{carrier} {converter}"))
        .join(", ");
    ensure!(
        missing_limits.is_empty(),
        "Missing conversion limit for: {missing_limits}"
    );

    check_keys_present(
        &model.storage_units,
        sets.carriers.iter().copied(),
        "storage unit",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, model, sets};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(2018, 100.0)]
    #[case(2020, 100.0 / 1.1 / 1.1)]
    #[case(2016, 100.0 * 1.1 * 1.1)]
    fn test_discounted_cost(#[case] period: u32, #[case] expected: f64) {
        let cost = discounted_cost(
            MoneyPerBlock(100.0),
            Dimensionless(0.05),
            Dimensionless(0.05),
            period,
            2018,
        );
        assert_approx_eq!(f64, cost.value(), expected, epsilon = 1e-9);
    }

    #[rstest]
    fn test_derive_costs(model: Model, sets: Sets) {
        let coefficients = Coefficients::derive(&model, &sets).unwrap();

        // Solar has a development rate, wind does not
        assert_approx_eq!(
            f64,
            coefficients.supply_cost(SupplyType::Solar, 2020).value(),
            10.0 / 1.1f64.powi(2),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            coefficients.supply_cost(SupplyType::Wind, 2022).value(),
            20.0 / 1.05f64.powi(4),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            coefficients
                .converter_cost(EnergyConverter::HP, 2022)
                .value(),
            40.0 / 1.06f64.powi(4),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            coefficients.storage_cost(EnergyCarrier::Heat, 2018).value(),
            60.0
        );
    }

    #[rstest]
    fn test_network_costs_dense(model: Model, sets: Sets) {
        let coefficients = Coefficients::derive(&model, &sets).unwrap();
        let n1 = "Node_1".into();
        let n2 = "Node_2".into();
        let n3 = "Node_3".into();

        // Either orientation of the input row is used
        assert_approx_eq!(
            f64,
            coefficients
                .network_cost(EnergyCarrier::Electricity, &n2, &n1, 2018)
                .value(),
            100.0
        );
        assert_approx_eq!(
            f64,
            coefficients
                .network_cost(EnergyCarrier::Electricity, &n1, &n2, 2020)
                .value(),
            100.0 / 1.05f64.powi(2),
            epsilon = 1e-9
        );

        // Pairs without data are present and cost nothing
        assert_approx_eq!(
            f64,
            coefficients
                .network_cost(EnergyCarrier::Electricity, &n1, &n3, 2022)
                .value(),
            0.0
        );
        assert_eq!(coefficients.iter_costs().count(), 3 * 9 * 3 + 2 * 3 + 3 * 3 + 3 * 3);
    }

    #[rstest]
    fn test_sparse_defaults(model: Model, sets: Sets) {
        let coefficients = Coefficients::derive(&model, &sets).unwrap();
        let n1 = "Node_1".into();
        let n2 = "Node_2".into();

        assert_eq!(
            coefficients.demand(EnergyCarrier::Electricity, &n2, 2018),
            Energy(10.0)
        );
        assert_eq!(
            coefficients.demand(EnergyCarrier::Electricity, &n2, 2020),
            Energy(0.0)
        );
        assert_eq!(coefficients.given_gas(&n1, 2018), Energy(5.0));
        assert_eq!(coefficients.given_gas(&n1, 2020), Energy(0.0));
        assert_eq!(
            coefficients.availability(SupplyType::Solar, &n1, 2018),
            Dimensionless(0.5)
        );
        assert_eq!(
            coefficients.availability(SupplyType::Wind, &n1, 2018),
            Dimensionless(1.0)
        );
        assert_eq!(
            coefficients.efficiency(EnergyCarrier::Heat, EnergyCarrier::Electricity, EnergyConverter::HP),
            Dimensionless(3.0)
        );
        assert_eq!(
            coefficients.efficiency(EnergyCarrier::Heat, EnergyCarrier::Heat, EnergyConverter::P2G),
            Dimensionless(0.0)
        );
    }

    #[rstest]
    fn test_missing_network_cost(mut model: Model, sets: Sets) {
        model.network.shift_remove(&(
            EnergyCarrier::Gas,
            "Node_1".into(),
            "Node_2".into(),
        ));
        assert_error!(
            Coefficients::derive(&model, &sets),
            "Missing network cost for: Gas Node_1-Node_2"
        );
    }

    #[rstest]
    fn test_missing_units(mut model: Model, sets: Sets) {
        model.supply_units.shift_remove(&SupplyType::Wind);
        assert_error!(
            Coefficients::derive(&model, &sets),
            "Missing supply unit for: Wind"
        );
    }

    #[rstest]
    fn test_missing_conversion_limit(mut model: Model, sets: Sets) {
        model
            .conversion_limits
            .shift_remove(&(EnergyCarrier::Heat, EnergyConverter::CHP));
        assert_error!(
            Coefficients::derive(&model, &sets),
            "Missing conversion limit for: Heat CHP"
        );
    }
}
