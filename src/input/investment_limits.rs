//! Code for reading the optional investment limit overrides.
use super::*;
use crate::id::IDCollection;
use crate::limits::{InvestmentLimitDefaults, InvestmentLimitRule, InvestmentLimits};
use crate::technology::{InvestmentCategory, Technology};
use crate::units::Blocks;
use log::debug;
use serde::Deserialize;

const INVESTMENT_LIMITS_FILE_NAME: &str = "investment_limits.csv";

/// A row of the overrides file. Empty cells are wildcards.
#[derive(Debug, PartialEq, Deserialize)]
struct InvestmentLimitRaw {
    category: InvestmentCategory,
    technology: Option<String>,
    location: Option<String>,
    period: Option<u32>,
    max_investments: Blocks,
}

/// Read investment limit overrides, in file order.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `location_ids` - All valid location IDs
/// * `periods` - The model's periods
/// * `defaults` - Category defaults from `model.toml`
pub fn read_investment_limits(
    model_dir: &Path,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
    defaults: InvestmentLimitDefaults,
) -> Result<InvestmentLimits> {
    let file_path = model_dir.join(INVESTMENT_LIMITS_FILE_NAME);
    let limits_csv = read_csv_optional(&file_path)?;
    let rules = read_investment_limit_rules_from_iter(limits_csv, location_ids, periods)
        .with_context(|| input_err_msg(&file_path))?;
    debug!("Read {} investment limit overrides", rules.len());

    Ok(InvestmentLimits::new(defaults, rules))
}

fn read_investment_limit_rules_from_iter<I>(
    iter: I,
    location_ids: &IndexSet<LocationID>,
    periods: &[u32],
) -> Result<Vec<InvestmentLimitRule>>
where
    I: Iterator<Item = InvestmentLimitRaw>,
{
    iter.map(|record| -> Result<InvestmentLimitRule> {
        let technology = record
            .technology
            .as_deref()
            .map(|name| Technology::parse(record.category, name))
            .transpose()?;
        let location = record
            .location
            .as_deref()
            .map(|id| location_ids.get_id(id))
            .transpose()?;
        if let Some(period) = record.period {
            ensure!(
                periods.contains(&period),
                "Period {period} is not one of the model's periods"
            );
        }
        check_non_negative(record.max_investments.value(), "max_investments")?;

        Ok(InvestmentLimitRule {
            category: record.category,
            technology,
            location,
            period: record.period,
            max_investments: record.max_investments,
        })
    })
    .collect()
}
