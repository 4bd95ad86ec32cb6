//! Code for reading converter units, conversion limits and conversion efficiencies.
use super::*;
use crate::carrier::EnergyCarrier;
use crate::model::{ConversionEfficiencyMap, ConversionLimitMap};
use crate::technology::{ConverterUnit, EnergyConverter};
use crate::units::{Dimensionless, EnergyPerBlock, MoneyPerBlock};
use serde::Deserialize;

const CONVERSION_UNITS_FILE_NAME: &str = "conversion_units.csv";
const CONVERSION_LIMITS_FILE_NAME: &str = "conversion_limits.csv";
const CONVERSION_EFFICIENCIES_FILE_NAME: &str = "conversion_efficiencies.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct ConverterUnitRaw {
    converter: EnergyConverter,
    cost: MoneyPerBlock,
    development_rate: Dimensionless,
}

#[derive(Debug, PartialEq, Deserialize)]
struct ConversionLimitRaw {
    carrier: EnergyCarrier,
    converter: EnergyConverter,
    max_converted: EnergyPerBlock,
}

/// A row of the efficiencies file.
///
/// Throughput of `source_carrier` on `converter` contributes `efficiency` units to the balance of
/// `carrier`. Negative values consume.
#[derive(Debug, PartialEq, Deserialize)]
struct ConversionEfficiencyRaw {
    carrier: EnergyCarrier,
    source_carrier: EnergyCarrier,
    converter: EnergyConverter,
    efficiency: Dimensionless,
}

/// Read converter units.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_conversion_units(
    model_dir: &Path,
) -> Result<IndexMap<EnergyConverter, ConverterUnit>> {
    let file_path = model_dir.join(CONVERSION_UNITS_FILE_NAME);
    let units_csv = read_csv(&file_path)?;
    read_conversion_units_from_iter(units_csv).with_context(|| input_err_msg(&file_path))
}

fn read_conversion_units_from_iter<I>(iter: I) -> Result<IndexMap<EnergyConverter, ConverterUnit>>
where
    I: Iterator<Item = ConverterUnitRaw>,
{
    let mut map = IndexMap::new();
    for record in iter {
        check_non_negative(record.cost.value(), "cost")?;
        check_non_negative(record.development_rate.value(), "development_rate")?;
        let unit = ConverterUnit {
            cost: record.cost,
            development_rate: record.development_rate,
        };
        try_insert(&mut map, record.converter, unit)?;
    }

    Ok(map)
}

/// Read conversion limits per converter block.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_conversion_limits(model_dir: &Path) -> Result<ConversionLimitMap> {
    let file_path = model_dir.join(CONVERSION_LIMITS_FILE_NAME);
    let limits_csv = read_csv(&file_path)?;
    read_conversion_limits_from_iter(limits_csv).with_context(|| input_err_msg(&file_path))
}

fn read_conversion_limits_from_iter<I>(iter: I) -> Result<ConversionLimitMap>
where
    I: Iterator<Item = ConversionLimitRaw>,
{
    let mut map = ConversionLimitMap::new();
    for record in iter {
        check_non_negative(record.max_converted.value(), "max_converted")?;
        try_insert(
            &mut map,
            (record.carrier, record.converter),
            record.max_converted,
        )?;
    }

    Ok(map)
}

/// Read sparse conversion efficiencies. Absent entries are treated as zero.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_conversion_efficiencies(model_dir: &Path) -> Result<ConversionEfficiencyMap> {
    let file_path = model_dir.join(CONVERSION_EFFICIENCIES_FILE_NAME);
    let efficiencies_csv = read_csv_optional(&file_path)?;
    read_conversion_efficiencies_from_iter(efficiencies_csv)
        .with_context(|| input_err_msg(&file_path))
}

fn read_conversion_efficiencies_from_iter<I>(iter: I) -> Result<ConversionEfficiencyMap>
where
    I: Iterator<Item = ConversionEfficiencyRaw>,
{
    let mut map = ConversionEfficiencyMap::new();
    for record in iter {
        ensure!(
            record.efficiency.is_finite(),
            "Invalid efficiency for {} from {} on {}",
            record.carrier,
            record.source_carrier,
            record.converter
        );
        try_insert(
            &mut map,
            (record.carrier, record.source_carrier, record.converter),
            record.efficiency,
        )?;
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_conversion_units_from_iter() {
        let units = read_conversion_units_from_iter(
            [
                ConverterUnitRaw {
                    converter: EnergyConverter::CHP,
                    cost: MoneyPerBlock(200.0),
                    development_rate: Dimensionless(0.0),
                },
                ConverterUnitRaw {
                    converter: EnergyConverter::P2G,
                    cost: MoneyPerBlock(300.0),
                    development_rate: Dimensionless(0.079),
                },
            ]
            .into_iter(),
        )
        .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(
            units[&EnergyConverter::P2G].development_rate,
            Dimensionless(0.079)
        );
    }

    #[test]
    fn test_read_conversion_limits_from_iter_negative() {
        assert!(
            read_conversion_limits_from_iter(std::iter::once(ConversionLimitRaw {
                carrier: EnergyCarrier::Heat,
                converter: EnergyConverter::HP,
                max_converted: EnergyPerBlock(-1.0),
            }))
            .is_err()
        );
    }

    #[test]
    fn test_read_conversion_efficiencies() {
        let dir = tempdir().unwrap();

        // Missing file means no conversion at all
        assert!(read_conversion_efficiencies(dir.path()).unwrap().is_empty());

        {
            let mut file =
                File::create(dir.path().join(CONVERSION_EFFICIENCIES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "carrier,source_carrier,converter,efficiency
Heat,Heat,HP,3.5
Electricity,Heat,HP,-1"
            )
            .unwrap();
        }

        let efficiencies = read_conversion_efficiencies(dir.path()).unwrap();
        assert_eq!(
            efficiencies[&(EnergyCarrier::Heat, EnergyCarrier::Heat, EnergyConverter::HP)],
            Dimensionless(3.5)
        );
        assert_eq!(
            efficiencies[&(
                EnergyCarrier::Electricity,
                EnergyCarrier::Heat,
                EnergyConverter::HP
            )],
            Dimensionless(-1.0)
        );
    }
}
