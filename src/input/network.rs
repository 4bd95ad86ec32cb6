//! Code for reading the network cost and line parameter files.
use super::*;
use crate::carrier::EnergyCarrier;
use crate::id::IDCollection;
use crate::model::NetworkCostMap;
use crate::technology::LineParameters;
use crate::units::{Dimensionless, EnergyPerBlock, MoneyPerBlock};
use serde::Deserialize;

const NETWORK_FILE_NAME: &str = "network.csv";
const LINE_PARAMETERS_FILE_NAME: &str = "line_parameters.csv";

/// A row of the network file: the base cost of a line between two locations
#[derive(Debug, PartialEq, Deserialize)]
struct NetworkRaw {
    carrier: EnergyCarrier,
    location_from: String,
    location_to: String,
    cost: MoneyPerBlock,
}

#[derive(Debug, PartialEq, Deserialize)]
struct LineParametersRaw {
    carrier: EnergyCarrier,
    max_flow: EnergyPerBlock,
    #[serde(deserialize_with = "deserialise_proportion")]
    loss_factor: Dimensionless,
}

/// Read base line costs from the network file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `location_ids` - All valid location IDs
///
/// # Returns
///
/// Line costs keyed by carrier and location pair, in file order
pub fn read_network(
    model_dir: &Path,
    location_ids: &IndexSet<LocationID>,
) -> Result<NetworkCostMap> {
    let file_path = model_dir.join(NETWORK_FILE_NAME);
    let network_csv = read_csv(&file_path)?;
    read_network_from_iter(network_csv, location_ids).with_context(|| input_err_msg(&file_path))
}

fn read_network_from_iter<I>(iter: I, location_ids: &IndexSet<LocationID>) -> Result<NetworkCostMap>
where
    I: Iterator<Item = NetworkRaw>,
{
    let mut network = NetworkCostMap::new();
    for record in iter {
        let from = location_ids.get_id(&record.location_from)?;
        let to = location_ids.get_id(&record.location_to)?;
        check_non_negative(record.cost.value(), "cost")?;
        try_insert(&mut network, (record.carrier, from, to), record.cost)?;
    }

    Ok(network)
}

/// Read per-carrier line properties.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_line_parameters(model_dir: &Path) -> Result<IndexMap<EnergyCarrier, LineParameters>> {
    let file_path = model_dir.join(LINE_PARAMETERS_FILE_NAME);
    let line_csv = read_csv(&file_path)?;
    read_line_parameters_from_iter(line_csv).with_context(|| input_err_msg(&file_path))
}

fn read_line_parameters_from_iter<I>(iter: I) -> Result<IndexMap<EnergyCarrier, LineParameters>>
where
    I: Iterator<Item = LineParametersRaw>,
{
    let mut map = IndexMap::new();
    for record in iter {
        check_non_negative(record.max_flow.value(), "max_flow")?;
        let parameters = LineParameters {
            max_flow: record.max_flow,
            loss_factor: record.loss_factor,
        };
        try_insert(&mut map, record.carrier, parameters)?;
    }

    Ok(map)
}
