//! Code for reading the storage units file.
use super::*;
use crate::carrier::EnergyCarrier;
use crate::technology::StorageUnit;
use crate::units::{Dimensionless, EnergyPerBlock, MoneyPerBlock};
use serde::Deserialize;

const STORAGE_UNITS_FILE_NAME: &str = "storage_units.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct StorageUnitRaw {
    carrier: EnergyCarrier,
    cost: MoneyPerBlock,
    development_rate: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    decay: Dimensionless,
    min_level: EnergyPerBlock,
    max_level: EnergyPerBlock,
}

impl StorageUnitRaw {
    fn validate(&self) -> Result<()> {
        check_non_negative(self.cost.value(), "cost")?;
        check_non_negative(self.development_rate.value(), "development_rate")?;
        check_non_negative(self.min_level.value(), "min_level")?;
        check_non_negative(self.max_level.value(), "max_level")?;
        ensure!(
            self.min_level <= self.max_level,
            "min_level ({}) cannot be greater than max_level ({})",
            self.min_level,
            self.max_level
        );

        Ok(())
    }
}

/// Read per-carrier storage units.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_storage_units(model_dir: &Path) -> Result<IndexMap<EnergyCarrier, StorageUnit>> {
    let file_path = model_dir.join(STORAGE_UNITS_FILE_NAME);
    let storage_csv = read_csv(&file_path)?;
    read_storage_units_from_iter(storage_csv).with_context(|| input_err_msg(&file_path))
}

fn read_storage_units_from_iter<I>(iter: I) -> Result<IndexMap<EnergyCarrier, StorageUnit>>
where
    I: Iterator<Item = StorageUnitRaw>,
{
    let mut map = IndexMap::new();
    for record in iter {
        record.validate()?;
        let unit = StorageUnit {
            cost: record.cost,
            development_rate: record.development_rate,
            decay: record.decay,
            min_level: record.min_level,
            max_level: record.max_level,
        };
        try_insert(&mut map, record.carrier, unit)?;
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn storage_row(min_level: f64, max_level: f64) -> StorageUnitRaw {
        StorageUnitRaw {
            carrier: EnergyCarrier::Heat,
            cost: MoneyPerBlock(10.0),
            development_rate: Dimensionless(0.016),
            decay: Dimensionless(0.9),
            min_level: EnergyPerBlock(min_level),
            max_level: EnergyPerBlock(max_level),
        }
    }

    #[test]
    fn test_read_storage_units_from_iter() {
        let units = read_storage_units_from_iter(std::iter::once(storage_row(0.0, 4.0))).unwrap();
        assert_eq!(units[&EnergyCarrier::Heat].max_level, EnergyPerBlock(4.0));
        assert_eq!(units[&EnergyCarrier::Heat].decay, Dimensionless(0.9));
    }

    #[test]
    fn test_read_storage_units_from_iter_bad_levels() {
        assert_error!(
            read_storage_units_from_iter(std::iter::once(storage_row(5.0, 4.0))),
            "min_level (5) cannot be greater than max_level (4)"
        );
    }

    #[test]
    fn test_read_storage_units_bad_decay() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(STORAGE_UNITS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "carrier,cost,development_rate,decay,min_level,max_level
Gas,10,0,1.2,0,4"
            )
            .unwrap();
        }

        assert!(read_storage_units(dir.path()).is_err());
    }
}
