//! Upper bounds on the number of new investment blocks per period.
//!
//! Limits are policy constants rather than derived data. Each category has a default, which can be
//! overridden by an ordered list of rules; the first rule matching a decision wins.
use crate::location::LocationID;
use crate::technology::{InvestmentCategory, Technology};
use crate::units::Blocks;
use anyhow::{Result, ensure};
use serde::Deserialize;

macro_rules! define_limit_default {
    ($name:ident, $value: expr) => {
        fn $name() -> Blocks {
            Blocks($value)
        }
    };
}

define_limit_default!(default_line_limit, 5.0);
define_limit_default!(default_supply_limit, 8.0);
define_limit_default!(default_converter_limit, 5.0);
define_limit_default!(default_storage_limit, 5.0);

/// Default per-period limits for each investment category
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct InvestmentLimitDefaults {
    /// New line blocks per edge, carrier and period
    #[serde(default = "default_line_limit")]
    pub line: Blocks,
    /// New supply blocks per supply type, location and period
    #[serde(default = "default_supply_limit")]
    pub supply: Blocks,
    /// New converter blocks per converter, location and period
    #[serde(default = "default_converter_limit")]
    pub converter: Blocks,
    /// New storage blocks per carrier, location and period
    #[serde(default = "default_storage_limit")]
    pub storage: Blocks,
}

impl Default for InvestmentLimitDefaults {
    fn default() -> Self {
        Self {
            line: default_line_limit(),
            supply: default_supply_limit(),
            converter: default_converter_limit(),
            storage: default_storage_limit(),
        }
    }
}

impl InvestmentLimitDefaults {
    /// Get the default for the given category
    pub fn get(&self, category: InvestmentCategory) -> Blocks {
        match category {
            InvestmentCategory::Line => self.line,
            InvestmentCategory::Supply => self.supply,
            InvestmentCategory::Converter => self.converter,
            InvestmentCategory::Storage => self.storage,
        }
    }

    /// Check that all defaults are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("line", self.line),
            ("supply", self.supply),
            ("converter", self.converter),
            ("storage", self.storage),
        ] {
            ensure!(
                value.is_finite() && value >= Blocks(0.0),
                "{name} limit must be a finite number >= 0"
            );
        }

        Ok(())
    }
}

/// A single override of the default limits.
///
/// `None` fields are wildcards.
#[derive(Debug, PartialEq, Clone)]
pub struct InvestmentLimitRule {
    /// The category this rule applies to
    pub category: InvestmentCategory,
    /// The technology within the category
    pub technology: Option<Technology>,
    /// The location. For lines, matches either end of the edge.
    pub location: Option<LocationID>,
    /// The period
    pub period: Option<u32>,
    /// Maximum new blocks per period
    pub max_investments: Blocks,
}

impl InvestmentLimitRule {
    fn matches(
        &self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
        period: u32,
    ) -> bool {
        self.category == technology.category()
            && self.technology.is_none_or(|t| t == technology)
            && self
                .location
                .as_ref()
                .is_none_or(|loc| loc == location || location_to == Some(loc))
            && self.period.is_none_or(|p| p == period)
    }
}

/// The lookup table of investment upper bounds
#[derive(Debug, Default, PartialEq)]
pub struct InvestmentLimits {
    defaults: InvestmentLimitDefaults,
    rules: Vec<InvestmentLimitRule>,
}

impl InvestmentLimits {
    /// Create a new table from the category defaults and ordered override rules
    pub fn new(defaults: InvestmentLimitDefaults, rules: Vec<InvestmentLimitRule>) -> Self {
        Self { defaults, rules }
    }

    /// The maximum number of new blocks of `technology` at `location` in `period`.
    ///
    /// For lines, `location_to` is the other end of the edge.
    pub fn max_investments(
        &self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
        period: u32,
    ) -> Blocks {
        self.rules
            .iter()
            .find(|rule| rule.matches(technology, location, location_to, period))
            .map_or_else(
                || self.defaults.get(technology.category()),
                |rule| rule.max_investments,
            )
    }

    /// The number of override rules
    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::EnergyCarrier;
    use crate::technology::{EnergyConverter, SupplyType};
    use rstest::{fixture, rstest};

    /// The ramp-up policy used by the bundled multi-energy demo
    #[fixture]
    fn limits() -> InvestmentLimits {
        let wind = Some(Technology::Supply(SupplyType::Wind));
        let solar = Some(Technology::Supply(SupplyType::Solar));
        let rule = |technology, location: Option<&str>, period, max| InvestmentLimitRule {
            category: InvestmentCategory::Supply,
            technology,
            location: location.map(LocationID::from),
            period,
            max_investments: Blocks(max),
        };

        InvestmentLimits::new(
            InvestmentLimitDefaults::default(),
            vec![
                rule(wind, Some("Node_1"), None, 0.0),
                rule(wind, Some("Node_5"), None, 0.0),
                rule(wind, None, Some(2018), 4.0),
                rule(solar, None, Some(2018), 6.0),
                rule(wind, None, Some(2020), 5.0),
                rule(solar, None, Some(2020), 7.0),
                rule(wind, None, None, 5.0),
                InvestmentLimitRule {
                    category: InvestmentCategory::Line,
                    technology: None,
                    location: Some("Node_2".into()),
                    period: None,
                    max_investments: Blocks(1.0),
                },
            ],
        )
    }

    #[rstest]
    #[case(Technology::Supply(SupplyType::Wind), "Node_1", 2018, 0.0)]
    #[case(Technology::Supply(SupplyType::Wind), "Node_5", 2024, 0.0)]
    #[case(Technology::Supply(SupplyType::Wind), "Node_2", 2018, 4.0)]
    #[case(Technology::Supply(SupplyType::Solar), "Node_1", 2018, 6.0)]
    #[case(Technology::Supply(SupplyType::Wind), "Node_2", 2020, 5.0)]
    #[case(Technology::Supply(SupplyType::Solar), "Node_2", 2020, 7.0)]
    #[case(Technology::Supply(SupplyType::Wind), "Node_2", 2022, 5.0)]
    #[case(Technology::Supply(SupplyType::Solar), "Node_2", 2022, 8.0)]
    #[case(Technology::Converter(EnergyConverter::HP), "Node_1", 2018, 5.0)]
    #[case(Technology::Storage(EnergyCarrier::Heat), "Node_1", 2018, 5.0)]
    fn test_max_investments(
        limits: InvestmentLimits,
        #[case] technology: Technology,
        #[case] location: &str,
        #[case] period: u32,
        #[case] expected: f64,
    ) {
        assert_eq!(
            limits.max_investments(technology, &location.into(), None, period),
            Blocks(expected)
        );
    }

    #[rstest]
    fn test_max_investments_line_either_end(limits: InvestmentLimits) {
        let line = Technology::Line(EnergyCarrier::Gas);
        let from = "Node_1".into();
        let to = "Node_2".into();
        assert_eq!(
            limits.max_investments(line, &from, Some(&to), 2018),
            Blocks(1.0)
        );
        assert_eq!(
            limits.max_investments(line, &to, Some(&from), 2018),
            Blocks(1.0)
        );
        assert_eq!(
            limits.max_investments(line, &from, Some(&"Node_3".into()), 2018),
            Blocks(5.0)
        );
    }

    #[test]
    fn test_defaults_validate() {
        assert!(InvestmentLimitDefaults::default().validate().is_ok());
        let defaults = InvestmentLimitDefaults {
            storage: Blocks(f64::NAN),
            ..InvestmentLimitDefaults::default()
        };
        assert!(defaults.validate().is_err());
    }
}
