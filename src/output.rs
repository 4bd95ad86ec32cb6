//! The module responsible for writing output data to disk.
use crate::carrier::EnergyCarrier;
use crate::coefficients::Coefficients;
use crate::location::LocationID;
use crate::solution::{InvestmentRecord, Solution, is_nonzero};
use crate::solver::SolveOutcome;
use crate::technology::{EnergyConverter, InvestmentCategory};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "imes_results";

/// The output file name for new investments
const INVESTMENTS_FILE_NAME: &str = "investments.csv";

/// The output file name for primary supply
const SUPPLY_FILE_NAME: &str = "supply.csv";

/// The output file name for flows between locations
const FLOWS_FILE_NAME: &str = "flows.csv";

/// The output file name for conversion throughput
const CONVERSION_FILE_NAME: &str = "conversion.csv";

/// The output file name for storage operation
const STORAGE_FILE_NAME: &str = "storage.csv";

/// The output file name for the run summary
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for derived investment costs
const COSTS_FILE_NAME: &str = "debug_costs.csv";

/// Get the default output directory for the model at the specified path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing, non-empty directory is only reused if `allow_overwrite` is true.
///
/// # Returns
///
/// Whether existing output will be overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to overwrite it."
        );
        fs::remove_dir_all(output_dir)?;
        fs::create_dir_all(output_dir)?;
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the investments CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct InvestmentRow {
    category: InvestmentCategory,
    technology: String,
    location: LocationID,
    location_to: Option<LocationID>,
    period: u32,
    count: f64,
    unit_cost: f64,
    total_cost: f64,
}

impl From<&InvestmentRecord<'_>> for InvestmentRow {
    fn from(record: &InvestmentRecord) -> Self {
        Self {
            category: record.technology.category(),
            technology: record.technology.name(),
            location: record.location.clone(),
            location_to: record.location_to.cloned(),
            period: record.period,
            count: record.count.value(),
            unit_cost: record.unit_cost.value(),
            total_cost: record.total_cost().value(),
        }
    }
}

/// Represents a row in the supply CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SupplyRow {
    carrier: EnergyCarrier,
    location: LocationID,
    period: u32,
    supplied: f64,
}

/// Represents a row in the flows CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct FlowRow {
    carrier: EnergyCarrier,
    location_from: LocationID,
    location_to: LocationID,
    period: u32,
    flow: f64,
}

/// Represents a row in the conversion CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ConversionRow {
    carrier: EnergyCarrier,
    converter: EnergyConverter,
    location: LocationID,
    period: u32,
    converted: f64,
}

/// Represents a row in the storage CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct StorageRow {
    carrier: EnergyCarrier,
    location: LocationID,
    period: u32,
    stored_in: f64,
    stored_out: f64,
}

/// Represents a row in the summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    status: String,
    objective_value: Option<f64>,
    mip_gap: Option<f64>,
}

/// Represents a row in the debug costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CostRow {
    category: InvestmentCategory,
    technology: String,
    location_from: Option<LocationID>,
    location_to: Option<LocationID>,
    period: u32,
    cost: f64,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    costs_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        Ok(Self {
            costs_writer: csv::Writer::from_path(output_path.join(COSTS_FILE_NAME))?,
        })
    }

    /// Write every derived investment cost to file
    fn write_costs(&mut self, coefficients: &Coefficients) -> Result<()> {
        for entry in coefficients.iter_costs() {
            let row = CostRow {
                category: entry.category(),
                technology: entry.technology.name(),
                location_from: entry.location_from.cloned(),
                location_to: entry.location_to.cloned(),
                period: entry.period,
                cost: entry.cost.value(),
            };
            self.costs_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.costs_writer.flush()?;

        Ok(())
    }
}

/// An object for writing solved values and the run summary to file
pub struct DataWriter {
    output_path: PathBuf,
    summary_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            output_path: output_path.to_path_buf(),
            summary_writer: csv::Writer::from_path(output_path.join(SUMMARY_FILE_NAME))?,
            debug_writer,
        })
    }

    /// Open a writer for one of the solution files
    fn new_writer(&self, file_name: &str) -> Result<csv::Writer<File>> {
        let file_path = self.output_path.join(file_name);
        csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))
    }

    /// Write the termination status, objective value and achieved MIP gap
    pub fn write_summary(&mut self, outcome: &SolveOutcome) -> Result<()> {
        self.summary_writer.serialize(SummaryRow {
            status: outcome.status.to_string(),
            objective_value: outcome.objective_value,
            mip_gap: outcome.mip_gap,
        })?;

        Ok(())
    }

    /// Write the solved values to CSV files.
    ///
    /// Only new investments and non-zero operation values are written.
    pub fn write_solution(&mut self, solution: &Solution) -> Result<()> {
        let mut writer = self.new_writer(INVESTMENTS_FILE_NAME)?;
        for record in &solution.investments() {
            writer.serialize(InvestmentRow::from(record))?;
        }
        writer.flush()?;

        let mut writer = self.new_writer(SUPPLY_FILE_NAME)?;
        for (carrier, location, period, supplied) in solution.iter_supplied() {
            if is_nonzero(supplied) {
                writer.serialize(SupplyRow {
                    carrier,
                    location: location.clone(),
                    period,
                    supplied,
                })?;
            }
        }
        writer.flush()?;

        let mut writer = self.new_writer(FLOWS_FILE_NAME)?;
        for (carrier, from, to, period, flow) in solution.iter_flows() {
            if is_nonzero(flow) {
                writer.serialize(FlowRow {
                    carrier,
                    location_from: from.clone(),
                    location_to: to.clone(),
                    period,
                    flow,
                })?;
            }
        }
        writer.flush()?;

        let mut writer = self.new_writer(CONVERSION_FILE_NAME)?;
        for (carrier, converter, location, period, converted) in solution.iter_converted() {
            if is_nonzero(converted) {
                writer.serialize(ConversionRow {
                    carrier,
                    converter,
                    location: location.clone(),
                    period,
                    converted,
                })?;
            }
        }
        writer.flush()?;

        let mut writer = self.new_writer(STORAGE_FILE_NAME)?;
        for (carrier, location, period, stored_in, stored_out) in solution.iter_storage() {
            if is_nonzero(stored_in) || is_nonzero(stored_out) {
                writer.serialize(StorageRow {
                    carrier,
                    location: location.clone(),
                    period,
                    stored_in,
                    stored_out,
                })?;
            }
        }
        writer.flush()?;

        Ok(())
    }

    /// Write debug information to CSV files
    pub fn write_debug_info(&mut self, coefficients: &Coefficients) -> Result<()> {
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_costs(coefficients)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.summary_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
