use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

use crate::config::{delimiter_byte, GazetteerSettings};
use crate::error::{CleansingError, Result};
use crate::models::{Gazetteer, GazetteerEntry};
use crate::processors::coordinate_normalizer::{parse_coordinate, ParsedCoordinate};
use crate::readers::property_reader::decode_bytes;

pub struct GazetteerReader {
    settings: GazetteerSettings,
}

impl GazetteerReader {
    pub fn new(settings: GazetteerSettings) -> Self {
        Self { settings }
    }

    /// Load the reference table. Any failure here is fatal for the run.
    pub fn read_gazetteer(&self, path: &Path) -> Result<Gazetteer> {
        let load = || -> Result<Gazetteer> {
            let bytes = std::fs::read(path)?;
            let text = decode_bytes(&bytes, &self.settings.encoding)?;
            self.parse_gazetteer(&text)
        };

        load().map_err(|e| match e {
            CleansingError::GazetteerLoad(_) => e,
            other => CleansingError::GazetteerLoad(format!("{}: {}", path.display(), other)),
        })
    }

    /// Parse gazetteer text with a header row
    pub fn parse_gazetteer(&self, text: &str) -> Result<Gazetteer> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_byte(&self.settings.delimiter)?)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| CleansingError::GazetteerLoad(format!("missing column '{}'", name)))
        };
        let name_idx = column(&self.settings.locality)?;
        let lat_idx = column(&self.settings.latitude)?;
        let lng_idx = column(&self.settings.longitude)?;

        let mut entries = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;

            let locality_name = record.get(name_idx).unwrap_or_default().trim();
            if locality_name.is_empty() {
                return Err(CleansingError::GazetteerLoad(format!(
                    "row {}: empty locality name",
                    row
                )));
            }

            let latitude = Self::coordinate(record.get(lat_idx), row, &self.settings.latitude)?;
            let longitude = Self::coordinate(record.get(lng_idx), row, &self.settings.longitude)?;

            let entry = GazetteerEntry::new(locality_name, latitude, longitude);
            entry.validate().map_err(|e| {
                CleansingError::GazetteerLoad(format!("row {}: {}", row, e))
            })?;
            entries.push(entry);
        }

        let gazetteer = Gazetteer::from_entries(entries, self.settings.precision);
        let stats = gazetteer.stats();
        info!(
            entries = stats.entries,
            distinct_coordinates = stats.distinct_coordinates,
            distinct_names = stats.distinct_names,
            "gazetteer loaded"
        );
        if stats.duplicate_coordinate_keys > 0 || stats.duplicate_names > 0 {
            warn!(
                duplicate_coordinate_keys = stats.duplicate_coordinate_keys,
                duplicate_names = stats.duplicate_names,
                "gazetteer has duplicate keys; the first row in file order wins"
            );
        }

        Ok(gazetteer)
    }

    fn coordinate(raw: Option<&str>, row: usize, column: &str) -> Result<f64> {
        match parse_coordinate(raw) {
            ParsedCoordinate::Value(value) => Ok(value),
            ParsedCoordinate::Missing => Err(CleansingError::GazetteerLoad(format!(
                "row {}: missing {}",
                row, column
            ))),
            ParsedCoordinate::Unparseable(text) => Err(CleansingError::GazetteerLoad(format!(
                "row {}: invalid {} '{}'",
                row, column, text
            ))),
        }
    }
}

impl Default for GazetteerReader {
    fn default() -> Self {
        Self::new(GazetteerSettings::default())
    }
}
