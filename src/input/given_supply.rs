//! Code for reading the exogenous supply table.
//!
//! The table holds one column per scenario. Rows for product `Gas` give the gas available at each
//! location and period; rows for a renewable supply type give its availability multiplier.
use super::*;
use crate::id::IDCollection;
use crate::model::GivenSupply;
use crate::technology::SupplyType;
use crate::units::{Dimensionless, Energy};
use log::debug;

const GIVEN_SUPPLY_FILE_NAME: &str = "given_supply.csv";

/// The product label for gas rows
const GAS_PRODUCT: &str = "Gas";

/// The number of key columns before the scenario columns
const NUM_KEY_COLUMNS: usize = 3;

/// Read the given supply table.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `location_ids` - All valid location IDs
/// * `periods` - The model's periods
/// * `scenario` - The scenario column to read. May be omitted if there is only one.
pub fn read_given_supply(
    model_dir: &Path,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
    scenario: Option<&str>,
) -> Result<GivenSupply> {
    let file_path = model_dir.join(GIVEN_SUPPLY_FILE_NAME);
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&file_path)
        .with_context(|| input_err_msg(&file_path))?;
    read_given_supply_from_reader(reader, location_ids, periods, scenario)
        .with_context(|| input_err_msg(&file_path))
}

fn read_given_supply_from_reader<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
    scenario: Option<&str>,
) -> Result<GivenSupply> {
    let headers = reader.headers()?.clone();
    ensure!(
        headers.iter().take(NUM_KEY_COLUMNS).eq(["product", "location", "period"]),
        "The first columns must be product, location and period"
    );
    let scenarios = headers.iter().skip(NUM_KEY_COLUMNS).collect_vec();
    let column = match scenario {
        Some(name) => scenarios
            .iter()
            .position(|s| *s == name)
            .with_context(|| format!("Scenario {name} not found"))?,
        None => {
            ensure!(
                scenarios.len() == 1,
                "supply_scenario must be given when there is not exactly one scenario column \
                (found: {})",
                scenarios.join(", ")
            );
            0
        }
    } + NUM_KEY_COLUMNS;
    debug!("Reading given supply scenario {}", &headers[column]);

    let mut given_supply = GivenSupply::default();
    for record in reader.records() {
        let record = record?;
        let product = &record[0];
        let location = location_ids.get_id(&record[1])?;
        let period: u32 = record[2]
            .parse()
            .with_context(|| format!("Invalid period {}", &record[2]))?;
        ensure!(
            periods.contains(&period),
            "Period {period} is not one of the model's periods"
        );
        let value: f64 = record
            .get(column)
            .context("Row is missing the scenario column")?
            .parse()
            .with_context(|| format!("Invalid value for {product} at {location} in {period}"))?;
        check_non_negative(value, product)?;

        if product == GAS_PRODUCT {
            try_insert(&mut given_supply.gas, (location, period), Energy(value))?;
        } else {
            let supply_type = SupplyType::from_label(product)
                .with_context(|| format!("Unknown product {product}"))?;
            try_insert(
                &mut given_supply.availability,
                (supply_type, location, period),
                Dimensionless(value),
            )?;
        }
    }

    Ok(given_supply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, location_ids};
    use rstest::rstest;

    fn reader(contents: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes())
    }

    const TWO_SCENARIOS: &str = "product,location,period,base,95%_red
Gas,Node_1,2020,100,40
Wind,Node_1,2020,0.8,0.6
Solar,Node_2,2020,0.5,0.5";

    #[rstest]
    fn test_read_given_supply_scenario(location_ids: IndexSet<LocationID>) {
        let given_supply = read_given_supply_from_reader(
            reader(TWO_SCENARIOS),
            &location_ids,
            &[2020],
            Some("95%_red"),
        )
        .unwrap();
        assert_eq!(given_supply.gas[&("Node_1".into(), 2020)], Energy(40.0));
        assert_eq!(
            given_supply.availability[&(SupplyType::Wind, "Node_1".into(), 2020)],
            Dimensionless(0.6)
        );
        assert_eq!(given_supply.availability.len(), 2);
    }

    #[rstest]
    fn test_read_given_supply_single_scenario(location_ids: IndexSet<LocationID>) {
        let given_supply = read_given_supply_from_reader(
            reader("product,location,period,base\nGas,Node_2,2020,7"),
            &location_ids,
            &[2020],
            None,
        )
        .unwrap();
        assert_eq!(given_supply.gas[&("Node_2".into(), 2020)], Energy(7.0));
    }

    #[rstest]
    fn test_read_given_supply_bad(location_ids: IndexSet<LocationID>) {
        assert_error!(
            read_given_supply_from_reader(reader(TWO_SCENARIOS), &location_ids, &[2020], None),
            "supply_scenario must be given when there is not exactly one scenario column \
            (found: base, 95%_red)"
        );
        assert_error!(
            read_given_supply_from_reader(
                reader(TWO_SCENARIOS),
                &location_ids,
                &[2020],
                Some("missing")
            ),
            "Scenario missing not found"
        );
        assert_error!(
            read_given_supply_from_reader(
                reader("product,location,period,base\nHydro,Node_2,2020,7"),
                &location_ids,
                &[2020],
                None
            ),
            "Unknown product Hydro"
        );
    }
}
