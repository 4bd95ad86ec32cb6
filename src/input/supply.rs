//! Code for reading the renewable supply units file.
use super::*;
use crate::technology::{SupplyType, SupplyUnit};
use crate::units::{Dimensionless, EnergyPerBlock, MoneyPerBlock};
use serde::Deserialize;

const SUPPLY_UNITS_FILE_NAME: &str = "supply_units.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct SupplyUnitRaw {
    supply_type: SupplyType,
    cost: MoneyPerBlock,
    development_rate: Dimensionless,
    max_supply: EnergyPerBlock,
}

impl SupplyUnitRaw {
    fn validate(&self) -> Result<()> {
        check_non_negative(self.cost.value(), "cost")?;
        check_non_negative(self.development_rate.value(), "development_rate")?;
        check_non_negative(self.max_supply.value(), "max_supply")?;

        Ok(())
    }
}

/// Read renewable supply units.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_supply_units(model_dir: &Path) -> Result<IndexMap<SupplyType, SupplyUnit>> {
    let file_path = model_dir.join(SUPPLY_UNITS_FILE_NAME);
    let supply_csv = read_csv(&file_path)?;
    read_supply_units_from_iter(supply_csv).with_context(|| input_err_msg(&file_path))
}

fn read_supply_units_from_iter<I>(iter: I) -> Result<IndexMap<SupplyType, SupplyUnit>>
where
    I: Iterator<Item = SupplyUnitRaw>,
{
    let mut map = IndexMap::new();
    for record in iter {
        record.validate()?;
        let unit = SupplyUnit {
            cost: record.cost,
            development_rate: record.development_rate,
            max_supply: record.max_supply,
        };
        try_insert(&mut map, record.supply_type, unit)?;
    }

    Ok(map)
}
