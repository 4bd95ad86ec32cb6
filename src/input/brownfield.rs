//! Code for reading the optional earlier investments file.
use super::*;
use crate::brownfield::Brownfield;
use crate::id::IDCollection;
use crate::technology::{InvestmentCategory, Technology};
use crate::units::Blocks;
use serde::Deserialize;

const EARLIER_INVESTMENTS_FILE_NAME: &str = "earlier_investments.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct EarlierInvestmentRaw {
    category: InvestmentCategory,
    technology: String,
    location: String,
    location_to: Option<String>,
    count: Blocks,
}

/// Read brownfield blocks. If the file is absent, there is no brownfield capacity.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `location_ids` - All valid location IDs
pub fn read_earlier_investments(
    model_dir: &Path,
    location_ids: &IndexSet<LocationID>,
) -> Result<Brownfield> {
    let file_path = model_dir.join(EARLIER_INVESTMENTS_FILE_NAME);
    let investments_csv = read_csv_optional(&file_path)?;
    read_earlier_investments_from_iter(investments_csv, location_ids)
        .with_context(|| input_err_msg(&file_path))
}

fn read_earlier_investments_from_iter<I>(
    iter: I,
    location_ids: &IndexSet<LocationID>,
) -> Result<Brownfield>
where
    I: Iterator<Item = EarlierInvestmentRaw>,
{
    let mut brownfield = Brownfield::default();
    for record in iter {
        let technology = Technology::parse(record.category, &record.technology)?;
        let location = location_ids.get_id(&record.location)?;
        let location_to = record
            .location_to
            .as_deref()
            .map(|id| location_ids.get_id(id))
            .transpose()?;
        check_non_negative(record.count.value(), "count")?;
        brownfield.insert(technology, &location, location_to.as_ref(), record.count)?;
    }

    Ok(brownfield)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::EnergyCarrier;
    use crate::fixture::location_ids;
    use crate::technology::SupplyType;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[rstest]
    fn test_read_earlier_investments(location_ids: IndexSet<LocationID>) {
        let dir = tempdir().unwrap();
        assert!(
            read_earlier_investments(dir.path(), &location_ids)
                .unwrap()
                .is_empty()
        );

        {
            let mut file = File::create(dir.path().join(EARLIER_INVESTMENTS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "category,technology,location,location_to,count
supply,Wind,Node_2,,3
line,Electricity,Node_2,Node_1,1"
            )
            .unwrap();
        }

        let brownfield = read_earlier_investments(dir.path(), &location_ids).unwrap();
        assert_eq!(
            brownfield.at_location(Technology::Supply(SupplyType::Wind), &"Node_2".into()),
            Blocks(3.0)
        );
        assert_eq!(
            brownfield.line(
                EnergyCarrier::Electricity,
                &"Node_1".into(),
                &"Node_2".into()
            ),
            Blocks(1.0)
        );
    }

    #[rstest]
    fn test_read_earlier_investments_from_iter_bad(location_ids: IndexSet<LocationID>) {
        let row = |technology: &str, location_to: Option<&str>| EarlierInvestmentRaw {
            category: InvestmentCategory::Line,
            technology: technology.into(),
            location: "Node_1".into(),
            location_to: location_to.map(String::from),
            count: Blocks(1.0),
        };

        // Line without a second location
        assert!(
            read_earlier_investments_from_iter(std::iter::once(row("Gas", None)), &location_ids)
                .is_err()
        );

        // Unknown carrier
        assert!(
            read_earlier_investments_from_iter(
                std::iter::once(row("Steam", Some("Node_2"))),
                &location_ids
            )
            .is_err()
        );
    }
}
