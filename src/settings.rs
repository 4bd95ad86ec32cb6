//! Code for loading program settings.
use crate::get_imes_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Result, anyhow};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for imes.
# Uncomment a setting to change it from its default value.
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_imes_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level (overridden by the `IMES_LOG_LEVEL` environment variable)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// Whether to write the derived investment costs to an extra CSV file
    #[serde(default)]
    pub debug_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            debug_model: false,
        }
    }
}

impl Settings {
    /// Load settings from the user's config directory, using defaults if there is no file
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, falling back to defaults if the file is absent
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// A settings file in which every option is commented out and documented.
    ///
    /// Parsing the result gives [`Settings::default`].
    pub fn default_file_contents() -> Result<String> {
        let defaults = toml::to_string(&Settings::default())?;

        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in defaults.lines() {
            let Some((field, _)) = line.split_once('=') else {
                continue;
            };
            let docs = Settings::get_field_docs(field.trim())
                .map_err(|_| anyhow!("Setting {} is undocumented", field.trim()))?;
            for doc_line in docs.lines() {
                write!(out, "\n# # {}\n", doc_line.trim())?;
            }
            writeln!(out, "# {}", line.trim())?;
        }

        Ok(out)
    }
}
