//! Fixtures for tests

use crate::brownfield::Brownfield;
use crate::carrier::EnergyCarrier;
use crate::limits::{InvestmentLimitDefaults, InvestmentLimits};
use crate::location::{Location, LocationID, LocationMap};
use crate::model::{
    ConversionEfficiencyMap, ConversionLimitMap, DemandMap, GivenSupply, Model, ModelParameters,
    NetworkCostMap,
};
use crate::sets::Sets;
use crate::technology::{
    ConverterUnit, EnergyConverter, LineParameters, StorageUnit, SupplyType, SupplyUnit,
};
use crate::units::{Dimensionless, Energy, EnergyPerBlock, MoneyPerBlock};
use indexmap::{IndexMap, IndexSet, indexmap};
use itertools::iproduct;
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn location_ids() -> IndexSet<LocationID> {
    ["Node_1".into(), "Node_2".into(), "Node_3".into()]
        .into_iter()
        .collect()
}

#[fixture]
pub fn locations(location_ids: IndexSet<LocationID>) -> LocationMap {
    location_ids
        .into_iter()
        .map(|id| {
            let location = Location {
                id: id.clone(),
                description: format!("Location {id}"),
            };
            (id, location)
        })
        .collect()
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    toml::from_str(
        "periods = [2018, 2020, 2022]
discount_rate = 0.05",
    )
    .unwrap()
}

/// Corridors Node_1-Node_2 and Node_2-Node_3 for every carrier
#[fixture]
pub fn network() -> NetworkCostMap {
    indexmap! {
        (EnergyCarrier::Electricity, "Node_1".into(), "Node_2".into()) => MoneyPerBlock(100.0),
        (EnergyCarrier::Electricity, "Node_2".into(), "Node_3".into()) => MoneyPerBlock(200.0),
        (EnergyCarrier::Gas, "Node_1".into(), "Node_2".into()) => MoneyPerBlock(50.0),
        (EnergyCarrier::Gas, "Node_2".into(), "Node_3".into()) => MoneyPerBlock(50.0),
        (EnergyCarrier::Heat, "Node_1".into(), "Node_2".into()) => MoneyPerBlock(80.0),
        (EnergyCarrier::Heat, "Node_2".into(), "Node_3".into()) => MoneyPerBlock(80.0),
    }
}

#[fixture]
pub fn sets(location_ids: IndexSet<LocationID>, network: NetworkCostMap) -> Sets {
    let pairs = network
        .keys()
        .filter(|(carrier, _, _)| *carrier == EnergyCarrier::Electricity)
        .map(|(_, from, to)| (from.clone(), to.clone()));
    Sets::new(location_ids, vec![2018, 2020, 2022], pairs).unwrap()
}

fn line_parameters() -> IndexMap<EnergyCarrier, LineParameters> {
    EnergyCarrier::all()
        .map(|carrier| {
            let parameters = LineParameters {
                max_flow: EnergyPerBlock(20.0),
                loss_factor: Dimensionless(0.1),
            };
            (carrier, parameters)
        })
        .collect()
}

fn storage_units() -> IndexMap<EnergyCarrier, StorageUnit> {
    EnergyCarrier::all()
        .map(|carrier| {
            let unit = StorageUnit {
                cost: MoneyPerBlock(60.0),
                development_rate: Dimensionless(0.05),
                decay: Dimensionless(0.9),
                min_level: EnergyPerBlock(0.0),
                max_level: EnergyPerBlock(10.0),
            };
            (carrier, unit)
        })
        .collect()
}

fn conversion_efficiencies() -> ConversionEfficiencyMap {
    use EnergyCarrier::{Electricity, Gas, Heat};
    use EnergyConverter::{CHP, HP, P2G};

    indexmap! {
        (Gas, Gas, CHP) => Dimensionless(-1.0),
        (Electricity, Gas, CHP) => Dimensionless(0.4),
        (Heat, Gas, CHP) => Dimensionless(0.5),
        (Electricity, Electricity, HP) => Dimensionless(-1.0),
        (Heat, Electricity, HP) => Dimensionless(3.0),
        (Electricity, Electricity, P2G) => Dimensionless(-1.0),
        (Gas, Electricity, P2G) => Dimensionless(0.6),
    }
}

/// A small three-node model with every input table populated
#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    locations: LocationMap,
    network: NetworkCostMap,
) -> Model {
    let supply_units = indexmap! {
        SupplyType::Solar => SupplyUnit {
            cost: MoneyPerBlock(10.0),
            development_rate: Dimensionless(0.05),
            max_supply: EnergyPerBlock(5.0),
        },
        SupplyType::Wind => SupplyUnit {
            cost: MoneyPerBlock(20.0),
            development_rate: Dimensionless(0.0),
            max_supply: EnergyPerBlock(10.0),
        },
    };
    let converter_units = indexmap! {
        EnergyConverter::CHP => ConverterUnit {
            cost: MoneyPerBlock(30.0),
            development_rate: Dimensionless(0.0),
        },
        EnergyConverter::HP => ConverterUnit {
            cost: MoneyPerBlock(40.0),
            development_rate: Dimensionless(0.01),
        },
        EnergyConverter::P2G => ConverterUnit {
            cost: MoneyPerBlock(50.0),
            development_rate: Dimensionless(0.0),
        },
    };
    let conversion_limits: ConversionLimitMap =
        iproduct!(EnergyCarrier::all(), EnergyConverter::all())
            .map(|key| (key, EnergyPerBlock(15.0)))
            .collect();
    let demand: DemandMap = indexmap! {
        (EnergyCarrier::Electricity, "Node_2".into(), 2018) => Energy(10.0),
        (EnergyCarrier::Heat, "Node_3".into(), 2022) => Energy(4.0),
    };
    let given_supply = GivenSupply {
        gas: indexmap! { ("Node_1".into(), 2018) => Energy(5.0) },
        availability: indexmap! {
            (SupplyType::Solar, "Node_1".into(), 2018) => Dimensionless(0.5),
        },
    };

    Model {
        model_path: PathBuf::from("model"),
        parameters: model_parameters,
        locations,
        network,
        line_parameters: line_parameters(),
        supply_units,
        converter_units,
        conversion_limits,
        conversion_efficiencies: conversion_efficiencies(),
        storage_units: storage_units(),
        demand,
        given_supply,
        brownfield: Brownfield::default(),
        investment_limits: InvestmentLimits::new(InvestmentLimitDefaults::default(), Vec::new()),
    }
}
