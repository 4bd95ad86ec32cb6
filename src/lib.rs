//! Multi-period capacity expansion planning for integrated multi-energy systems.
//!
//! A model describes a network of locations exchanging electricity, gas and heat. The planning
//! problem chooses, period by period, how many blocks of lines, renewable supply, converters and
//! storage to build so that demand is met at the least total discounted investment cost.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod brownfield;
pub mod carrier;
pub mod cli;
pub mod coefficients;
pub mod formulation;
pub mod id;
pub mod input;
pub mod limits;
pub mod location;
pub mod log;
pub mod model;
pub mod output;
pub mod problem;
pub mod sets;
pub mod settings;
pub mod solution;
pub mod solver;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This is a subdirectory of the user's configuration directory (e.g. `~/.config/imes` on Linux).
pub fn get_imes_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform; fall back to the current directory
        return PathBuf::new();
    };
    config_dir.push("imes");

    config_dir
}
