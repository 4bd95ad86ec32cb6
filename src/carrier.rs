//! Energy carriers are the commodities transported, converted and stored in the network.
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use strum::{EnumIter, IntoEnumIterator};

/// An energy carrier
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum EnergyCarrier {
    /// Electricity
    #[string = "Electricity"]
    Electricity,
    /// Gas (natural gas or synthetic gas from power-to-gas)
    #[string = "Gas"]
    Gas,
    /// Heat
    #[string = "Heat"]
    Heat,
}

/// How primary supply of a carrier is bounded at a location
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyPolicy {
    /// Supply is limited by installed renewable capacity (brownfield plus investments so far),
    /// scaled by an availability multiplier
    Investment,
    /// Supply is limited by an exogenous amount given for each location and period
    Given,
    /// There is no primary supply; the carrier only enters the system through conversion
    None,
}

impl EnergyCarrier {
    /// Iterate over all carriers in a fixed order
    pub fn all() -> impl Iterator<Item = EnergyCarrier> + Clone {
        EnergyCarrier::iter()
    }

    /// The policy bounding primary supply of this carrier
    pub fn supply_policy(self) -> SupplyPolicy {
        match self {
            EnergyCarrier::Electricity => SupplyPolicy::Investment,
            EnergyCarrier::Gas => SupplyPolicy::Given,
            EnergyCarrier::Heat => SupplyPolicy::None,
        }
    }

    /// Parse a carrier from its label
    pub fn from_label(label: &str) -> Option<Self> {
        EnergyCarrier::iter().find(|carrier| carrier.to_string() == label.trim())
    }
}
