//! The index domains of the formulation.
//!
//! Edges are unordered corridors where lines may be built; arcs are the directed flow channels,
//! two per edge.
use crate::carrier::EnergyCarrier;
use crate::location::LocationID;
use crate::model::Model;
use crate::technology::{EnergyConverter, SupplyType};
use anyhow::{Result, ensure};
use indexmap::{IndexMap, IndexSet};
use log::warn;

/// An ordered pair of locations
pub type LocationPair = (LocationID, LocationID);

/// The index sets over which variables and constraints are defined
#[derive(Debug, Clone, PartialEq)]
pub struct Sets {
    /// Locations, in input order
    pub locations: IndexSet<LocationID>,
    /// Energy carriers
    pub carriers: Vec<EnergyCarrier>,
    /// Converter types
    pub converters: Vec<EnergyConverter>,
    /// Renewable supply types
    pub supply_types: Vec<SupplyType>,
    /// Ordered periods
    pub periods: Vec<u32>,
    /// Investable corridors, each stored in the orientation first given in the input
    pub edges: IndexSet<LocationPair>,
    /// Directed flow channels: both orientations of every edge
    pub arcs: IndexSet<LocationPair>,
    inbound: IndexMap<LocationID, Vec<LocationID>>,
    outbound: IndexMap<LocationID, Vec<LocationID>>,
}

impl Sets {
    /// Build the sets for a model.
    ///
    /// Edges are taken from the network rows of the model's topology carrier.
    pub fn build(model: &Model) -> Result<Self> {
        let topology_carrier = model.parameters.topology_carrier;
        let pairs = model
            .network
            .keys()
            .filter(|(carrier, _, _)| *carrier == topology_carrier)
            .map(|(_, from, to)| (from.clone(), to.clone()));

        Self::new(
            model.iter_locations().cloned(),
            model.iter_periods().collect(),
            pairs,
        )
    }

    /// Create sets from locations, periods and candidate location pairs.
    ///
    /// Self-loops and pairs that repeat an existing edge (in either orientation) are skipped.
    pub fn new<L, P>(locations: L, periods: Vec<u32>, pairs: P) -> Result<Self>
    where
        L: IntoIterator<Item = LocationID>,
        P: IntoIterator<Item = LocationPair>,
    {
        let locations: IndexSet<LocationID> = locations.into_iter().collect();
        ensure!(!locations.is_empty(), "There must be at least one location");
        ensure!(!periods.is_empty(), "There must be at least one period");

        let mut edges = IndexSet::new();
        for (from, to) in pairs {
            ensure!(
                locations.contains(&from) && locations.contains(&to),
                "Edge {from}-{to} refers to an unknown location"
            );
            if from == to {
                warn!("Ignoring network self-loop at {from}");
                continue;
            }
            if edges.contains(&(to.clone(), from.clone())) {
                warn!("Ignoring duplicate network edge {from}-{to}");
                continue;
            }
            edges.insert((from, to));
        }

        let arcs: IndexSet<LocationPair> = edges
            .iter()
            .flat_map(|(a, b)| [(a.clone(), b.clone()), (b.clone(), a.clone())])
            .collect();

        let mut inbound: IndexMap<LocationID, Vec<LocationID>> =
            locations.iter().map(|loc| (loc.clone(), Vec::new())).collect();
        let mut outbound = inbound.clone();
        for (from, to) in &arcs {
            inbound[to].push(from.clone());
            outbound[from].push(to.clone());
        }

        Ok(Self {
            locations,
            carriers: EnergyCarrier::all().collect(),
            converters: EnergyConverter::all().collect(),
            supply_types: SupplyType::all().collect(),
            periods,
            edges,
            arcs,
            inbound,
            outbound,
        })
    }

    /// Locations with an arc into `location`
    pub fn iter_inbound(&self, location: &LocationID) -> impl Iterator<Item = &LocationID> {
        self.inbound[location].iter()
    }

    /// Locations with an arc out of `location`
    pub fn iter_outbound(&self, location: &LocationID) -> impl Iterator<Item = &LocationID> {
        self.outbound[location].iter()
    }

    /// Periods up to and including `period`
    pub fn periods_up_to(&self, period: u32) -> impl Iterator<Item = u32> + '_ {
        self.periods.iter().copied().filter(move |t| *t <= period)
    }

    /// Periods strictly before `period`
    pub fn periods_before(&self, period: u32) -> impl Iterator<Item = u32> + '_ {
        self.periods.iter().copied().filter(move |t| *t < period)
    }

    /// Whether `(from, to)` is an edge in its stored orientation
    pub fn is_edge(&self, from: &LocationID, to: &LocationID) -> bool {
        self.edges.contains(&(from.clone(), to.clone()))
    }

    /// Whether `(from, to)` is an arc
    pub fn is_arc(&self, from: &LocationID, to: &LocationID) -> bool {
        self.arcs.contains(&(from.clone(), to.clone()))
    }
}
