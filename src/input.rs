//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use crate::location::LocationID;
use crate::model::{Model, ModelParameters};
use anyhow::{Context, Result, bail, ensure};
use indexmap::{IndexMap, IndexSet};
use indexmap::map::Entry;
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fmt::Display;
use std::fs;
use std::hash::Hash;
use std::path::Path;

mod brownfield;
use brownfield::read_earlier_investments;
mod converter;
use converter::{read_conversion_efficiencies, read_conversion_limits, read_conversion_units};
mod demand;
use demand::read_demand;
mod given_supply;
use given_supply::read_given_supply;
mod investment_limits;
use investment_limits::read_investment_limits;
mod location;
use location::read_locations;
mod network;
use network::{read_line_parameters, read_network};
mod storage;
use storage::read_storage_units;
mod supply;
use supply::read_supply_units;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }
    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// Unlike [`read_csv`], an absent file or a file with only a header row is not an error.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    let vec = read_csv_internal(file_path)?;
    Ok(vec.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value.into())
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a CSV file of items with IDs.
///
/// As this function is only ever used for top-level CSV files (i.e. the ones which actually define
/// the IDs for a given type), we use an ordered map to maintain the order in the input files.
fn read_csv_id_file<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
{
    fn fill_and_validate_map<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
    where
        T: HasID<ID> + DeserializeOwned,
    {
        let mut map = IndexMap::new();
        for record in read_csv::<T>(file_path)? {
            let id = record.get_id().clone();
            let existing = map.insert(id.clone(), record).is_some();
            ensure!(!existing, "Duplicate ID found: {id}");
        }
        ensure!(!map.is_empty(), "CSV file is empty");

        Ok(map)
    }

    fill_and_validate_map(file_path).with_context(|| input_err_msg(file_path))
}

/// Check that fractional values are finite and non-negative
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "Invalid value for {name} ({value}): must be a finite number >= 0"
    );

    Ok(())
}

/// Indicates whether the values in the slice are unique and sorted in ascending order
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Insert a key-value pair into an [`IndexMap`] if the key does not already exist.
///
/// If the key already exists, an error is returned naming the key.
pub fn try_insert<K, V>(map: &mut IndexMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    match map.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
        Entry::Occupied(entry) => bail!("Key {:?} already exists in the map", entry.key()),
    }
}

/// Check that a map has an entry for every one of the expected keys
pub fn check_keys_present<K, V, I>(map: &IndexMap<K, V>, expected: I, what: &str) -> Result<()>
where
    K: Eq + Hash + Display,
    I: IntoIterator<Item = K>,
{
    let missing = expected
        .into_iter()
        .filter(|key| !map.contains_key(key))
        .join(", ");
    ensure!(missing.is_empty(), "Missing {what} for: {missing}");

    Ok(())
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;

    let locations = read_locations(model_dir)?;
    let location_ids: IndexSet<LocationID> = locations.keys().cloned().collect();
    let periods = &parameters.periods;

    let network = read_network(model_dir, &location_ids)?;
    let line_parameters = read_line_parameters(model_dir)?;
    let supply_units = read_supply_units(model_dir)?;
    let converter_units = read_conversion_units(model_dir)?;
    let conversion_limits = read_conversion_limits(model_dir)?;
    let conversion_efficiencies = read_conversion_efficiencies(model_dir)?;
    let storage_units = read_storage_units(model_dir)?;
    let demand = read_demand(model_dir, &location_ids, periods)?;
    let given_supply = read_given_supply(
        model_dir,
        &location_ids,
        periods,
        parameters.supply_scenario.as_deref(),
    )?;
    let brownfield = read_earlier_investments(model_dir, &location_ids)?;
    let investment_limits = read_investment_limits(
        model_dir,
        &location_ids,
        periods,
        parameters.investment_limits.clone(),
    )?;

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        locations,
        network,
        line_parameters,
        supply_units,
        converter_units,
        conversion_limits,
        conversion_efficiencies,
        storage_units,
        demand,
        given_supply,
        brownfield,
        investment_limits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    /// Test a normal read
    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // Whitespace around fields is trimmed
        let file_path = create_csv_file(dir.path(), "id , value\n hello , 1\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[Record {
                id: "hello".to_string(),
                value: 1,
            }]
        );

        // File with no data rows
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(
            read_csv_optional::<Record>(&file_path)
                .unwrap()
                .next()
                .is_none()
        );

        // Missing file
        let dir = tempdir().unwrap();
        assert!(
            read_csv_optional::<Record>(&dir.path().join("a"))
                .unwrap()
                .next()
                .is_none()
        );
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1,
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }

        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_is_sorted_and_unique() {
        assert!(is_sorted_and_unique([1, 2]));
        assert!(is_sorted_and_unique(["a", "b"]));
        assert!(is_sorted_and_unique(std::iter::empty::<u32>()));
        assert!(!is_sorted_and_unique([1, 1]));
        assert!(!is_sorted_and_unique([2, 1]));
    }

    #[test]
    fn test_try_insert() {
        let mut map = IndexMap::new();
        try_insert(&mut map, "key", 1).unwrap();
        assert_error!(
            try_insert(&mut map, "key", 2),
            "Key \"key\" already exists in the map"
        );
        assert_eq!(map["key"], 1);
    }

    #[test]
    fn test_check_keys_present() {
        let map: IndexMap<LocationID, u32> = [("A".into(), 1)].into_iter().collect();
        check_keys_present(&map, [LocationID::new("A")], "values").unwrap();
        assert_error!(
            check_keys_present(&map, ["A".into(), "B".into(), "C".into()], "values"),
            "Missing values for: B, C"
        );
    }

    #[test]
    fn test_check_non_negative() {
        assert!(check_non_negative(0.0, "x").is_ok());
        assert!(check_non_negative(1.5, "x").is_ok());
        assert!(check_non_negative(-0.1, "x").is_err());
        assert!(check_non_negative(f64::NAN, "x").is_err());
        assert!(check_non_negative(f64::INFINITY, "x").is_err());
    }
}
