//! Code for reading the exogenous demand file.
use super::*;
use crate::carrier::EnergyCarrier;
use crate::id::IDCollection;
use crate::model::DemandMap;
use crate::units::Energy;
use serde::Deserialize;

const DEMAND_FILE_NAME: &str = "demand.csv";

/// Represents a single demand entry in the dataset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct Demand {
    /// The carrier demanded
    carrier: EnergyCarrier,
    /// The location of the demand entry
    location: String,
    /// The period of the demand entry
    period: u32,
    /// Demand quantity
    demand: Energy,
}

/// Reads sparse demand data. Absent entries are treated as zero.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `location_ids` - All valid location IDs
/// * `periods` - The model's periods
pub fn read_demand(
    model_dir: &Path,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
) -> Result<DemandMap> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let demand_csv = read_csv_optional(&file_path)?;
    read_demand_from_iter(demand_csv, location_ids, periods)
        .with_context(|| input_err_msg(&file_path))
}

fn read_demand_from_iter<I>(
    iter: I,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
) -> Result<DemandMap>
where
    I: Iterator<Item = Demand>,
{
    let mut map = DemandMap::new();
    for record in iter {
        let location = location_ids.get_id(&record.location)?;
        ensure!(
            periods.contains(&record.period),
            "Period {} is not one of the model's periods",
            record.period
        );
        check_non_negative(record.demand.value(), "demand")?;
        try_insert(
            &mut map,
            (record.carrier, location, record.period),
            record.demand,
        )?;
    }

    Ok(map)
}
