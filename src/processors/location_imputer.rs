use rayon::prelude::*;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::debug;

use crate::models::{LocalityLookup, LocatedRecord, Location, NormalizedRecord, PropertyRecord};
use crate::utils::constants::COORDINATE_MISSING;

/// How Stage 1 treated one record's location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOutcome {
    /// A name was already present
    Kept,
    /// Filled from the gazetteer by coordinate
    Resolved,
    /// Neither name nor coordinates were available
    NoLocation,
    /// Coordinates known but not in the gazetteer
    Unresolved,
}

/// How Stage 2 treated one record's coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinateOutcome {
    pub latitude_filled: bool,
    pub longitude_filled: bool,
    pub name_matched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameResolutionStats {
    pub kept: usize,
    pub resolved: usize,
    pub no_location: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinateResolutionStats {
    pub latitudes_filled: usize,
    pub longitudes_filled: usize,
    /// Named records whose name is not in the gazetteer
    pub unmatched_names: usize,
}

impl AddAssign<&NameResolutionStats> for NameResolutionStats {
    fn add_assign(&mut self, other: &NameResolutionStats) {
        self.kept += other.kept;
        self.resolved += other.resolved;
        self.no_location += other.no_location;
        self.unresolved += other.unresolved;
    }
}

impl AddAssign<&CoordinateResolutionStats> for CoordinateResolutionStats {
    fn add_assign(&mut self, other: &CoordinateResolutionStats) {
        self.latitudes_filled += other.latitudes_filled;
        self.longitudes_filled += other.longitudes_filled;
        self.unmatched_names += other.unmatched_names;
    }
}

#[derive(Debug, Clone)]
pub struct NameResolution {
    pub records: Vec<LocatedRecord>,
    pub stats: NameResolutionStats,
}

#[derive(Debug, Clone)]
pub struct CoordinateResolution {
    pub records: Vec<PropertyRecord>,
    pub stats: CoordinateResolutionStats,
}

/// Two-stage location recovery against a reference table.
///
/// Stage 1 ([`resolve_names`](Self::resolve_names)) turns normalized records
/// into located ones; Stage 2 ([`resolve_coordinates`](Self::resolve_coordinates))
/// only accepts located records, so it always sees the names Stage 1 recovered.
pub struct LocationImputer<'g, G> {
    gazetteer: &'g G,
}

impl<'g, G> LocationImputer<'g, G>
where
    G: LocalityLookup + Sync,
{
    pub fn new(gazetteer: &'g G) -> Self {
        Self { gazetteer }
    }

    /// Stage 1 for a single record
    pub fn resolve_name(&self, record: NormalizedRecord) -> (LocatedRecord, NameOutcome) {
        let unknown_coordinates = record.has_unknown_coordinates();

        let (location, outcome) = match Location::from_raw(record.location.as_deref()) {
            Location::Named(name) => (Location::Named(name), NameOutcome::Kept),
            _ if unknown_coordinates => (Location::NoLocation, NameOutcome::NoLocation),
            current => match self
                .gazetteer
                .lookup_by_coordinates(record.latitude, record.longitude)
            {
                Some(name) => (Location::Named(name.to_string()), NameOutcome::Resolved),
                // A previous run's "No location" survives an unmatched lookup
                None if current == Location::NoLocation => {
                    (Location::NoLocation, NameOutcome::NoLocation)
                }
                None => (Location::Unresolved, NameOutcome::Unresolved),
            },
        };

        let located = LocatedRecord {
            latitude: record.latitude,
            longitude: record.longitude,
            location,
            attributes: record.attributes,
        };

        (located, outcome)
    }

    /// Stage 1: coordinates → name. Known names are never overwritten.
    pub fn resolve_names(&self, records: Vec<NormalizedRecord>) -> NameResolution {
        let (records, outcomes): (Vec<LocatedRecord>, Vec<NameOutcome>) = records
            .into_par_iter()
            .map(|record| self.resolve_name(record))
            .unzip();

        let mut stats = NameResolutionStats::default();
        for outcome in outcomes {
            match outcome {
                NameOutcome::Kept => stats.kept += 1,
                NameOutcome::Resolved => stats.resolved += 1,
                NameOutcome::NoLocation => stats.no_location += 1,
                NameOutcome::Unresolved => stats.unresolved += 1,
            }
        }

        debug!(
            kept = stats.kept,
            resolved = stats.resolved,
            no_location = stats.no_location,
            unresolved = stats.unresolved,
            "stage 1 (coordinates to name) complete"
        );

        NameResolution { records, stats }
    }

    /// Stage 2 for a single record
    pub fn resolve_record_coordinates(
        &self,
        record: LocatedRecord,
    ) -> (PropertyRecord, CoordinateOutcome) {
        let mut latitude = record.latitude;
        let mut longitude = record.longitude;
        let mut outcome = CoordinateOutcome::default();

        if let Some((gazetteer_lat, gazetteer_lng)) = record
            .location
            .name()
            .and_then(|name| self.gazetteer.lookup_by_name(name))
        {
            outcome.name_matched = true;

            if latitude == COORDINATE_MISSING {
                latitude = gazetteer_lat;
                outcome.latitude_filled = true;
            }
            if longitude == COORDINATE_MISSING {
                longitude = gazetteer_lng;
                outcome.longitude_filled = true;
            }
        }

        let resolved = PropertyRecord {
            latitude,
            longitude,
            location: record.location,
            attributes: record.attributes,
        };

        (resolved, outcome)
    }

    /// Stage 2: name → coordinates. Only sentinel coordinates are replaced.
    pub fn resolve_coordinates(&self, records: Vec<LocatedRecord>) -> CoordinateResolution {
        let named: Vec<bool> = records.iter().map(|r| r.location.is_named()).collect();

        let (records, outcomes): (Vec<PropertyRecord>, Vec<CoordinateOutcome>) = records
            .into_par_iter()
            .map(|record| self.resolve_record_coordinates(record))
            .unzip();

        let mut stats = CoordinateResolutionStats::default();
        for (outcome, is_named) in outcomes.iter().zip(named) {
            if outcome.latitude_filled {
                stats.latitudes_filled += 1;
            }
            if outcome.longitude_filled {
                stats.longitudes_filled += 1;
            }
            if is_named && !outcome.name_matched {
                stats.unmatched_names += 1;
            }
        }

        debug!(
            latitudes_filled = stats.latitudes_filled,
            longitudes_filled = stats.longitudes_filled,
            unmatched_names = stats.unmatched_names,
            "stage 2 (name to coordinates) complete"
        );

        CoordinateResolution { records, stats }
    }
}
