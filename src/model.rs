//! The model represents the static input data provided by the user.
use crate::brownfield::Brownfield;
use crate::carrier::EnergyCarrier;
use crate::limits::InvestmentLimits;
use crate::location::{LocationID, LocationMap};
use crate::technology::{
    ConverterUnit, EnergyConverter, LineParameters, StorageUnit, SupplyType, SupplyUnit,
};
use crate::units::{Dimensionless, Energy, EnergyPerBlock, MoneyPerBlock};
use indexmap::IndexMap;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{ModelParameters, SolverSettings, StorageMode};

/// Base line costs at the reference period, keyed by carrier and ordered location pair.
///
/// Entries appear in the order of the input file, which determines the order of edges.
pub type NetworkCostMap = IndexMap<(EnergyCarrier, LocationID, LocationID), MoneyPerBlock>;

/// Maximum conversion throughput per converter block, for each output carrier
pub type ConversionLimitMap = IndexMap<(EnergyCarrier, EnergyConverter), EnergyPerBlock>;

/// Conversion efficiencies keyed by (carrier, source carrier, converter)
pub type ConversionEfficiencyMap =
    IndexMap<(EnergyCarrier, EnergyCarrier, EnergyConverter), Dimensionless>;

/// Exogenous demand keyed by carrier, location and period
pub type DemandMap = IndexMap<(EnergyCarrier, LocationID, u32), Energy>;

/// The exogenous supply table, split by product
#[derive(Debug, Default, PartialEq)]
pub struct GivenSupply {
    /// Gas available at each location and period
    pub gas: IndexMap<(LocationID, u32), Energy>,
    /// Availability multiplier for renewable supply (weather or capacity factor proxy)
    pub availability: IndexMap<(SupplyType, LocationID, u32), Dimensionless>,
}

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Locations (network nodes)
    pub locations: LocationMap,
    /// Base line costs, which also define the network topology
    pub network: NetworkCostMap,
    /// Per-carrier line properties
    pub line_parameters: IndexMap<EnergyCarrier, LineParameters>,
    /// Renewable supply units
    pub supply_units: IndexMap<SupplyType, SupplyUnit>,
    /// Converter units
    pub converter_units: IndexMap<EnergyConverter, ConverterUnit>,
    /// Conversion limits per converter block
    pub conversion_limits: ConversionLimitMap,
    /// Sparse conversion efficiencies
    pub conversion_efficiencies: ConversionEfficiencyMap,
    /// Per-carrier storage units
    pub storage_units: IndexMap<EnergyCarrier, StorageUnit>,
    /// Sparse exogenous demand
    pub demand: DemandMap,
    /// Exogenous gas supply and renewable availability
    pub given_supply: GivenSupply,
    /// Capacity built before the first period
    pub brownfield: Brownfield,
    /// Upper bounds on new investments per period
    pub investment_limits: InvestmentLimits,
}

impl Model {
    /// Iterate over the model's periods
    pub fn iter_periods(&self) -> impl Iterator<Item = u32> + '_ {
        self.parameters.periods.iter().copied()
    }

    /// Iterate over the model's location IDs
    pub fn iter_locations(&self) -> impl Iterator<Item = &LocationID> {
        self.locations.keys()
    }
}
