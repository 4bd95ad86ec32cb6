//! Investable technologies and their per-block unit parameters.
use crate::carrier::EnergyCarrier;
use crate::units::{Dimensionless, EnergyPerBlock, MoneyPerBlock};
use anyhow::{Context, Result};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

/// A unit converting one energy carrier into another
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
pub enum EnergyConverter {
    /// Combined heat and power
    #[string = "CHP"]
    CHP,
    /// Heat pump
    #[string = "HP"]
    HP,
    /// Power-to-gas
    #[string = "P2G"]
    P2G,
}

/// A class of renewable electricity supply which can be invested in
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
pub enum SupplyType {
    /// Solar photovoltaics
    #[string = "Solar"]
    Solar,
    /// Wind turbines
    #[string = "Wind"]
    Wind,
}

/// The four kinds of investment decision
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum InvestmentCategory {
    /// Transmission lines along network corridors
    #[string = "line"]
    Line,
    /// Renewable supply capacity
    #[string = "supply"]
    Supply,
    /// Conversion units
    #[string = "converter"]
    Converter,
    /// Storage units
    #[string = "storage"]
    Storage,
}

impl EnergyConverter {
    /// Iterate over all converters in a fixed order
    pub fn all() -> impl Iterator<Item = EnergyConverter> + Clone {
        EnergyConverter::iter()
    }
}

impl SupplyType {
    /// Iterate over all supply types in a fixed order
    pub fn all() -> impl Iterator<Item = SupplyType> + Clone {
        SupplyType::iter()
    }

    /// Parse a supply type from its label
    pub fn from_label(label: &str) -> Option<Self> {
        SupplyType::iter().find(|supply_type| supply_type.to_string() == label.trim())
    }
}

/// A specific investable technology, i.e. a category together with the thing being built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Technology {
    /// A line carrying the given carrier
    Line(EnergyCarrier),
    /// Renewable supply of the given type
    Supply(SupplyType),
    /// A converter of the given type
    Converter(EnergyConverter),
    /// Storage for the given carrier
    Storage(EnergyCarrier),
}

impl Technology {
    /// Parse a technology from a category and a technology name (e.g. `supply` and `Wind`)
    pub fn parse(category: InvestmentCategory, name: &str) -> Result<Self> {
        let name = name.trim();
        let parse_carrier =
            || EnergyCarrier::from_label(name).with_context(|| format!("Unknown carrier {name}"));

        Ok(match category {
            InvestmentCategory::Line => Technology::Line(parse_carrier()?),
            InvestmentCategory::Supply => Technology::Supply(
                SupplyType::from_label(name)
                    .with_context(|| format!("Unknown supply type {name}"))?,
            ),
            InvestmentCategory::Converter => Technology::Converter(
                EnergyConverter::iter()
                    .find(|converter| converter.to_string() == name)
                    .with_context(|| format!("Unknown converter {name}"))?,
            ),
            InvestmentCategory::Storage => Technology::Storage(parse_carrier()?),
        })
    }

    /// The investment category this technology belongs to
    pub fn category(&self) -> InvestmentCategory {
        match self {
            Technology::Line(_) => InvestmentCategory::Line,
            Technology::Supply(_) => InvestmentCategory::Supply,
            Technology::Converter(_) => InvestmentCategory::Converter,
            Technology::Storage(_) => InvestmentCategory::Storage,
        }
    }

    /// The name of the thing being built, without its category
    pub fn name(&self) -> String {
        match self {
            Technology::Line(carrier) | Technology::Storage(carrier) => carrier.to_string(),
            Technology::Supply(supply_type) => supply_type.to_string(),
            Technology::Converter(converter) => converter.to_string(),
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category(), self.name())
    }
}

/// Per-carrier properties of network lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParameters {
    /// Maximum flow (both directions combined) granted by one line block
    pub max_flow: EnergyPerBlock,
    /// Proportion of flow lost in transmission
    pub loss_factor: Dimensionless,
}

/// Properties of a renewable supply type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyUnit {
    /// Investment cost per block at the reference period
    pub cost: MoneyPerBlock,
    /// Additional discounting reflecting expected cost reduction
    pub development_rate: Dimensionless,
    /// Maximum electricity supplied per block per period
    pub max_supply: EnergyPerBlock,
}

/// Properties of a converter type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConverterUnit {
    /// Investment cost per block at the reference period
    pub cost: MoneyPerBlock,
    /// Additional discounting reflecting expected cost reduction
    pub development_rate: Dimensionless,
}

/// Per-carrier properties of storage units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageUnit {
    /// Investment cost per block at the reference period
    pub cost: MoneyPerBlock,
    /// Additional discounting reflecting expected cost reduction
    pub development_rate: Dimensionless,
    /// Fraction of stored energy retained per unit of period-label difference
    pub decay: Dimensionless,
    /// Minimum storage level per block. Loaded and checked but not used in the formulation.
    pub min_level: EnergyPerBlock,
    /// Storage capacity per block
    pub max_level: EnergyPerBlock,
}
