//! Code for reading location-related information from CSV files.
use super::*;
use crate::location::LocationMap;
use std::path::Path;

const LOCATIONS_FILE_NAME: &str = "locations.csv";

/// Reads locations from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A `LocationMap` with the parsed locations in file order, or an error
pub fn read_locations(model_dir: &Path) -> Result<LocationMap> {
    read_csv_id_file(&model_dir.join(LOCATIONS_FILE_NAME))
}
