//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::carrier::EnergyCarrier;
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::limits::InvestmentLimitDefaults;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_discount_rate, Dimensionless, 0.045);
define_unit_param_default!(default_mip_gap, Dimensionless, 0.001);
define_param_default!(default_topology_carrier, EnergyCarrier, EnergyCarrier::Electricity);
define_param_default!(default_solver_name, String, "highs".to_string());
define_param_default!(default_time_limit, f64, 100.0);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Ordered period labels (e.g. years)
    pub periods: Vec<u32>,
    /// The period at which base costs are given. Defaults to the first period.
    #[serde(default)]
    reference_period: Option<u32>,
    /// Annual discount rate applied to all investment costs
    #[serde(default = "default_discount_rate")]
    pub discount_rate: Dimensionless,
    /// Which set of storage constraints to install
    #[serde(default)]
    pub storage_mode: StorageMode,
    /// The carrier whose network rows define the investable corridors
    #[serde(default = "default_topology_carrier")]
    pub topology_carrier: EnergyCarrier,
    /// The scenario column to read from the given supply file
    #[serde(default)]
    pub supply_scenario: Option<String>,
    /// Default upper bounds on new investments per period, by category
    #[serde(default)]
    pub investment_limits: InvestmentLimitDefaults,
    /// Options for the MILP solver
    #[serde(default)]
    pub solver: SolverSettings,
}

/// Selects which storage constraints are installed when the model is assembled
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum StorageMode {
    /// Storage is bounded by installed capacity and the decayed stock of earlier periods
    #[default]
    #[string = "with"]
    WithStorage,
    /// Nothing may be stored
    #[string = "without"]
    WithoutStorage,
}

/// Options passed to the MILP solver
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct SolverSettings {
    /// Name of the solver backend
    #[serde(default = "default_solver_name")]
    pub name: String,
    /// Wall-clock time limit in seconds
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Relative optimality gap at which the search stops
    #[serde(default = "default_mip_gap")]
    pub mip_gap: Dimensionless,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            name: default_solver_name(),
            time_limit: default_time_limit(),
            mip_gap: default_mip_gap(),
        }
    }
}

/// Check that the `periods` parameter is valid
fn check_periods(periods: &[u32]) -> Result<()> {
    ensure!(!periods.is_empty(), "`periods` is empty");

    ensure!(
        is_sorted_and_unique(periods),
        "`periods` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the `discount_rate` parameter is valid
fn check_discount_rate(value: Dimensionless) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Dimensionless(0.0),
        "discount_rate must be a finite number >= 0"
    );

    Ok(())
}

/// Check that the solver options are valid
fn check_solver_settings(settings: &SolverSettings) -> Result<()> {
    ensure!(
        settings.time_limit.is_finite() && settings.time_limit > 0.0,
        "solver.time_limit must be a finite number greater than zero"
    );
    ensure!(
        settings.mip_gap.is_finite() && settings.mip_gap >= Dimensionless(0.0),
        "solver.mip_gap must be a finite number >= 0"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The period at which base costs are given
    pub fn reference_period(&self) -> u32 {
        self.reference_period.unwrap_or(self.periods[0])
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_periods(&self.periods)?;
        check_discount_rate(self.discount_rate)?;
        self.investment_limits
            .validate()
            .context("Invalid value for investment_limits")?;
        check_solver_settings(&self.solver)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Blocks;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_model_file(dir: &Path, contents: &str) {
        let mut file = File::create(dir.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_check_periods() {
        // Valid
        assert!(check_periods(&[2018]).is_ok());
        assert!(check_periods(&[2018, 2020]).is_ok());

        // Invalid
        assert!(check_periods(&[]).is_err());
        assert!(check_periods(&[2018, 2018]).is_err());
        assert!(check_periods(&[2020, 2018]).is_err());
    }

    #[test]
    fn test_model_params_from_path_defaults() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "periods = [2018, 2020, 2022]");

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.periods, [2018, 2020, 2022]);
        assert_eq!(params.reference_period(), 2018);
        assert_eq!(params.discount_rate, Dimensionless(0.045));
        assert_eq!(params.storage_mode, StorageMode::WithStorage);
        assert_eq!(params.topology_carrier, EnergyCarrier::Electricity);
        assert_eq!(params.supply_scenario, None);
        assert_eq!(params.investment_limits.supply, Blocks(8.0));
        assert_eq!(params.solver, SolverSettings::default());
        assert_eq!(params.solver.name, "highs");
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_file(
            dir.path(),
            "periods = [2018, 2020]
reference_period = 2020
discount_rate = 0.0
storage_mode = \"without\"
supply_scenario = \"95%_red\"

[investment_limits]
line = 2

[solver]
time_limit = 10
mip_gap = 0.01",
        );

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.reference_period(), 2020);
        assert_eq!(params.storage_mode, StorageMode::WithoutStorage);
        assert_eq!(params.supply_scenario.as_deref(), Some("95%_red"));
        assert_eq!(params.investment_limits.line, Blocks(2.0));
        assert_eq!(params.investment_limits.storage, Blocks(5.0));
        assert_approx_eq!(f64, params.solver.time_limit, 10.0);
        assert_eq!(params.solver.mip_gap, Dimensionless(0.01));
    }

    #[rstest]
    #[case("periods = []")]
    #[case("periods = [2020, 2018]")]
    #[case("periods = [2018]\ndiscount_rate = -0.1")]
    #[case("periods = [2018]\nstorage_mode = \"sometimes\"")]
    #[case("periods = [2018]\n[solver]\ntime_limit = 0")]
    #[case("periods = [2018]\n[investment_limits]\nline = -1")]
    fn test_model_params_from_path_invalid(#[case] contents: &str) {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), contents);
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }
}
