use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::utils::coordinates::{round_to_precision, scaled_coordinate};

/// One row of the reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GazetteerEntry {
    #[validate(length(min = 1))]
    pub locality_name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl GazetteerEntry {
    pub fn new(locality_name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            locality_name: locality_name.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Exact-match join key: a coordinate pair scaled to the join precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    latitude: i64,
    longitude: i64,
}

impl CoordinateKey {
    pub fn new(latitude: f64, longitude: f64, precision: u32) -> Self {
        Self {
            latitude: scaled_coordinate(latitude, precision),
            longitude: scaled_coordinate(longitude, precision),
        }
    }
}

/// The two lookups the imputation stages need from a reference table
pub trait LocalityLookup {
    /// Canonical name at a coordinate, compared at the table's precision
    fn lookup_by_coordinates(&self, latitude: f64, longitude: f64) -> Option<&str>;

    /// Canonical coordinate of a name (exact, case-sensitive)
    fn lookup_by_name(&self, locality_name: &str) -> Option<(f64, f64)>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GazetteerStats {
    pub entries: usize,
    pub distinct_coordinates: usize,
    pub distinct_names: usize,
    pub duplicate_coordinate_keys: usize,
    pub duplicate_names: usize,
}

/// Read-only reference table indexed by rounded coordinate and by name.
///
/// When several rows share a key the first row in source order wins.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
    precision: u32,
    by_coordinates: HashMap<CoordinateKey, usize>,
    by_name: HashMap<String, usize>,
    stats: GazetteerStats,
}

impl Gazetteer {
    /// Build the table. Coordinates are rounded to `precision` digits on ingestion.
    pub fn from_entries<I>(entries: I, precision: u32) -> Self
    where
        I: IntoIterator<Item = GazetteerEntry>,
    {
        let entries: Vec<GazetteerEntry> = entries
            .into_iter()
            .map(|entry| GazetteerEntry {
                latitude: round_to_precision(entry.latitude, precision),
                longitude: round_to_precision(entry.longitude, precision),
                locality_name: entry.locality_name,
            })
            .collect();

        let mut by_coordinates = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut stats = GazetteerStats {
            entries: entries.len(),
            ..GazetteerStats::default()
        };

        for (index, entry) in entries.iter().enumerate() {
            let key = CoordinateKey::new(entry.latitude, entry.longitude, precision);
            if by_coordinates.contains_key(&key) {
                stats.duplicate_coordinate_keys += 1;
            } else {
                by_coordinates.insert(key, index);
            }

            if by_name.contains_key(&entry.locality_name) {
                stats.duplicate_names += 1;
            } else {
                by_name.insert(entry.locality_name.clone(), index);
            }
        }

        stats.distinct_coordinates = by_coordinates.len();
        stats.distinct_names = by_name.len();

        Self {
            entries,
            precision,
            by_coordinates,
            by_name,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &GazetteerStats {
        &self.stats
    }
}

impl LocalityLookup for Gazetteer {
    fn lookup_by_coordinates(&self, latitude: f64, longitude: f64) -> Option<&str> {
        let key = CoordinateKey::new(latitude, longitude, self.precision);
        self.by_coordinates
            .get(&key)
            .map(|&index| self.entries[index].locality_name.as_str())
    }

    fn lookup_by_name(&self, locality_name: &str) -> Option<(f64, f64)> {
        self.by_name.get(locality_name).map(|&index| {
            let entry = &self.entries[index];
            (entry.latitude, entry.longitude)
        })
    }
}
