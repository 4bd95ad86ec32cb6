//! Declaration of the decision variables.
use crate::carrier::EnergyCarrier;
use crate::location::LocationID;
use crate::problem::{Problem, Variable, VariableKind};
use crate::sets::Sets;
use crate::technology::{EnergyConverter, SupplyType};
use indexmap::IndexMap;
use itertools::iproduct;

/// Variables keyed by carrier, location pair and period
pub type PairVariableMap = IndexMap<(EnergyCarrier, LocationID, LocationID, u32), Variable>;

/// Variables keyed by carrier, location and period
pub type CarrierVariableMap = IndexMap<(EnergyCarrier, LocationID, u32), Variable>;

/// Supply investment variables keyed by supply type, location and period
pub type SupplyVariableMap = IndexMap<(SupplyType, LocationID, u32), Variable>;

/// Converter investment variables keyed by converter, location and period
pub type ConverterVariableMap = IndexMap<(EnergyConverter, LocationID, u32), Variable>;

/// Conversion throughput variables keyed by carrier, converter, location and period
pub type ConvertedVariableMap = IndexMap<(EnergyCarrier, EnergyConverter, LocationID, u32), Variable>;

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]).
///
/// We use this data structure for two things:
///
/// 1. In order to define constraints for the optimisation
/// 2. To keep track of the combination of parameters that each variable corresponds to, for when we
///    are reading the results of the optimisation.
///
/// Line investment and flow variables exist for every ordered location pair. Those outside the
/// topology are fixed to zero when the constraints are installed.
#[derive(Debug, Default)]
pub struct VariableMap {
    /// New line blocks (integer)
    pub line_investment: PairVariableMap,
    /// New supply blocks (integer)
    pub supply_investment: SupplyVariableMap,
    /// New converter blocks (integer)
    pub converter_investment: ConverterVariableMap,
    /// New storage blocks (integer)
    pub storage_investment: CarrierVariableMap,
    /// Primary supply
    pub supplied: CarrierVariableMap,
    /// Directed flow between two locations
    pub flow: PairVariableMap,
    /// Amount of a carrier fed through a converter
    pub converted: ConvertedVariableMap,
    /// Energy put into storage
    pub stored_in: CarrierVariableMap,
    /// Energy taken out of storage
    pub stored_out: CarrierVariableMap,
}

impl VariableMap {
    /// Create a [`VariableMap`] and add all decision variables to the problem.
    ///
    /// Every variable is non-negative. Investment variables are integer.
    pub fn new(problem: &mut Problem, sets: &Sets) -> Self {
        let mut add_integer = || problem.add_variable(VariableKind::Integer, 0.0..);
        let pairs = || {
            iproduct!(
                sets.carriers.iter(),
                sets.locations.iter(),
                sets.locations.iter(),
                sets.periods.iter()
            )
            .map(|(&carrier, from, to, &period)| (carrier, from.clone(), to.clone(), period))
        };
        let by_carrier = || {
            iproduct!(
                sets.carriers.iter(),
                sets.locations.iter(),
                sets.periods.iter()
            )
            .map(|(&carrier, location, &period)| (carrier, location.clone(), period))
        };

        let line_investment = pairs().map(|key| (key, add_integer())).collect();
        let supply_investment = iproduct!(
            sets.supply_types.iter(),
            sets.locations.iter(),
            sets.periods.iter()
        )
        .map(|(&supply_type, location, &period)| {
            ((supply_type, location.clone(), period), add_integer())
        })
        .collect();
        let converter_investment = iproduct!(
            sets.converters.iter(),
            sets.locations.iter(),
            sets.periods.iter()
        )
        .map(|(&converter, location, &period)| {
            ((converter, location.clone(), period), add_integer())
        })
        .collect();
        let storage_investment = by_carrier().map(|key| (key, add_integer())).collect();

        let mut add_continuous = || problem.add_variable(VariableKind::Continuous, 0.0..);
        let supplied = by_carrier().map(|key| (key, add_continuous())).collect();
        let flow = pairs().map(|key| (key, add_continuous())).collect();
        let converted = iproduct!(
            sets.carriers.iter(),
            sets.converters.iter(),
            sets.locations.iter(),
            sets.periods.iter()
        )
        .map(|(&carrier, &converter, location, &period)| {
            ((carrier, converter, location.clone(), period), add_continuous())
        })
        .collect();
        let stored_in = by_carrier().map(|key| (key, add_continuous())).collect();
        let stored_out = by_carrier().map(|key| (key, add_continuous())).collect();

        Self {
            line_investment,
            supply_investment,
            converter_investment,
            storage_investment,
            supplied,
            flow,
            converted,
            stored_in,
            stored_out,
        }
    }

    /// The total number of variables
    pub fn len(&self) -> usize {
        self.line_investment.len()
            + self.supply_investment.len()
            + self.converter_investment.len()
            + self.storage_investment.len()
            + self.supplied.len()
            + self.flow.len()
            + self.converted.len()
            + self.stored_in.len()
            + self.stored_out.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the line investment variable for the given parameters
    pub fn line_investment(
        &self,
        carrier: EnergyCarrier,
        from: &LocationID,
        to: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .line_investment
            .get(&(carrier, from.clone(), to.clone(), period))
            .expect("No line investment variable found for given params")
    }

    /// Get the supply investment variable for the given parameters
    pub fn supply_investment(
        &self,
        supply_type: SupplyType,
        location: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .supply_investment
            .get(&(supply_type, location.clone(), period))
            .expect("No supply investment variable found for given params")
    }

    /// Get the converter investment variable for the given parameters
    pub fn converter_investment(
        &self,
        converter: EnergyConverter,
        location: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .converter_investment
            .get(&(converter, location.clone(), period))
            .expect("No converter investment variable found for given params")
    }

    /// Get the storage investment variable for the given parameters
    pub fn storage_investment(
        &self,
        carrier: EnergyCarrier,
        location: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .storage_investment
            .get(&(carrier, location.clone(), period))
            .expect("No storage investment variable found for given params")
    }

    /// Get the supplied variable for the given parameters
    pub fn supplied(&self, carrier: EnergyCarrier, location: &LocationID, period: u32) -> Variable {
        *self
            .supplied
            .get(&(carrier, location.clone(), period))
            .expect("No supplied variable found for given params")
    }

    /// Get the flow variable for the given parameters
    pub fn flow(
        &self,
        carrier: EnergyCarrier,
        from: &LocationID,
        to: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .flow
            .get(&(carrier, from.clone(), to.clone(), period))
            .expect("No flow variable found for given params")
    }

    /// Get the converted variable for the given parameters
    pub fn converted(
        &self,
        carrier: EnergyCarrier,
        converter: EnergyConverter,
        location: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .converted
            .get(&(carrier, converter, location.clone(), period))
            .expect("No converted variable found for given params")
    }

    /// Get the stored-in variable for the given parameters
    pub fn stored_in(&self, carrier: EnergyCarrier, location: &LocationID, period: u32) -> Variable {
        *self
            .stored_in
            .get(&(carrier, location.clone(), period))
            .expect("No stored-in variable found for given params")
    }

    /// Get the stored-out variable for the given parameters
    pub fn stored_out(
        &self,
        carrier: EnergyCarrier,
        location: &LocationID,
        period: u32,
    ) -> Variable {
        *self
            .stored_out
            .get(&(carrier, location.clone(), period))
            .expect("No stored-out variable found for given params")
    }
}
