//! Capacity built before the first period ("earlier investments").
//!
//! Brownfield blocks are added as a constant offset to every period's cumulative investment.
use crate::carrier::EnergyCarrier;
use crate::location::LocationID;
use crate::technology::Technology;
use crate::units::Blocks;
use anyhow::{Result, ensure};
use std::collections::HashMap;

/// Identifies where brownfield capacity is installed.
///
/// Line keys hold their two locations in sorted order, so lookups ignore orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BrownfieldKey {
    technology: Technology,
    location: LocationID,
    location_to: Option<LocationID>,
}

impl BrownfieldKey {
    fn new(technology: Technology, location: &LocationID, location_to: Option<&LocationID>) -> Self {
        match location_to {
            Some(to) if to < location => Self {
                technology,
                location: to.clone(),
                location_to: Some(location.clone()),
            },
            _ => Self {
                technology,
                location: location.clone(),
                location_to: location_to.cloned(),
            },
        }
    }
}

/// Brownfield blocks for every technology and location. Absent entries are zero.
#[derive(Debug, Default, PartialEq)]
pub struct Brownfield(HashMap<BrownfieldKey, Blocks>);

impl Brownfield {
    /// Record brownfield blocks.
    ///
    /// `location_to` must be given for lines and only for lines.
    pub fn insert(
        &mut self,
        technology: Technology,
        location: &LocationID,
        location_to: Option<&LocationID>,
        count: Blocks,
    ) -> Result<()> {
        let is_line = matches!(technology, Technology::Line(_));
        ensure!(
            is_line == location_to.is_some(),
            "location_to must be given for lines and only for lines ({technology})"
        );
        if let Some(to) = location_to {
            ensure!(to != location, "Line cannot start and end at {location}");
        }

        let key = BrownfieldKey::new(technology, location, location_to);
        let existing = self.0.insert(key, count).is_some();
        ensure!(
            !existing,
            "Duplicate earlier investment for {technology} at {location}"
        );

        Ok(())
    }

    /// Brownfield blocks for a technology installed at a single location
    pub fn at_location(&self, technology: Technology, location: &LocationID) -> Blocks {
        self.get(&BrownfieldKey::new(technology, location, None))
    }

    /// Brownfield line blocks between two locations, in either orientation
    pub fn line(&self, carrier: EnergyCarrier, from: &LocationID, to: &LocationID) -> Blocks {
        self.get(&BrownfieldKey::new(Technology::Line(carrier), from, Some(to)))
    }

    fn get(&self, key: &BrownfieldKey) -> Blocks {
        self.0.get(key).copied().unwrap_or_default()
    }

    /// Whether there is no brownfield capacity at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
