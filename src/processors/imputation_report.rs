use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use validator::Validate;

use crate::error::Result;
use crate::models::{GazetteerStats, Location, PropertyRecord};
use crate::processors::attribute_cleaner::AttributeCleaningStats;
use crate::processors::coordinate_processor::{CoordinateColumn, RejectedCoordinate};
use crate::processors::location_imputer::{CoordinateResolutionStats, NameResolutionStats};

/// What cleaning one coordinate column took
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateColumnReport {
    pub column: String,
    pub repaired: usize,
    pub missing: usize,
    pub rejected: Vec<RejectedCoordinate>,
}

impl CoordinateColumnReport {
    pub fn from_column(column: &str, cleaned: &CoordinateColumn) -> Self {
        Self {
            column: column.to_string(),
            repaired: cleaned.repaired,
            missing: cleaned.missing,
            rejected: cleaned.rejected.clone(),
        }
    }
}

/// Counts gathered over one cleansing run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputationReport {
    pub total_records: usize,
    pub latitude: CoordinateColumnReport,
    pub longitude: CoordinateColumnReport,
    pub attributes: AttributeCleaningStats,
    pub gazetteer: GazetteerStats,
    pub names: NameResolutionStats,
    pub coordinates: CoordinateResolutionStats,
    /// Records whose coordinates fall outside the plausible range
    pub out_of_range_records: usize,
    pub final_no_location: usize,
    pub final_unresolved: usize,
    pub final_incomplete_coordinates: usize,
}

impl ImputationReport {
    /// Fill in the counts that depend on the finished records
    pub fn record_final_state(&mut self, records: &[PropertyRecord]) {
        self.total_records = records.len();
        self.out_of_range_records = records.iter().filter(|r| r.validate().is_err()).count();
        self.final_no_location = records
            .iter()
            .filter(|r| r.location == Location::NoLocation)
            .count();
        self.final_unresolved = records.iter().filter(|r| r.location.is_unresolved()).count();
        self.final_incomplete_coordinates = records
            .iter()
            .filter(|r| !r.is_coordinate_complete())
            .count();
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total_records as f64
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Imputation Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", self.total_records));
        summary.push_str(&format!(
            "Gazetteer: {} entries ({} duplicate coordinates, {} duplicate names)\n",
            self.gazetteer.entries,
            self.gazetteer.duplicate_coordinate_keys,
            self.gazetteer.duplicate_names
        ));

        summary.push_str("\nCoordinates:\n");
        for column in [&self.latitude, &self.longitude] {
            summary.push_str(&format!(
                "  {}: {} repaired, {} missing, {} unparseable\n",
                column.column,
                column.repaired,
                column.missing,
                column.rejected.len()
            ));
        }
        summary.push_str(&format!(
            "  Out of range: {}\n",
            self.out_of_range_records
        ));

        summary.push_str("\nStage 1 (coordinates -> name):\n");
        summary.push_str(&format!("  Kept: {}\n", self.names.kept));
        summary.push_str(&format!(
            "  Resolved: {} ({:.1}%)\n",
            self.names.resolved,
            self.percentage(self.names.resolved)
        ));
        summary.push_str(&format!("  No location: {}\n", self.names.no_location));
        summary.push_str(&format!("  Unresolved: {}\n", self.names.unresolved));

        summary.push_str("\nStage 2 (name -> coordinates):\n");
        summary.push_str(&format!(
            "  Latitudes filled: {}\n",
            self.coordinates.latitudes_filled
        ));
        summary.push_str(&format!(
            "  Longitudes filled: {}\n",
            self.coordinates.longitudes_filled
        ));
        summary.push_str(&format!(
            "  Names not in gazetteer: {}\n",
            self.coordinates.unmatched_names
        ));

        if self.attributes != AttributeCleaningStats::default() {
            summary.push_str("\nAttributes:\n");
            summary.push_str(&format!(
                "  Decimals normalized: {} ({} unparseable)\n",
                self.attributes.decimals_normalized, self.attributes.unparseable_decimals
            ));
            summary.push_str(&format!(
                "  Prices reconciled: {} ({} not computable)\n",
                self.attributes.prices_reconciled, self.attributes.unreconcilable_prices
            ));
            summary.push_str(&format!(
                "  Property types mapped: {}\n",
                self.attributes.property_types_mapped
            ));
            summary.push_str(&format!("  Parking mapped: {}\n", self.attributes.parking_mapped));
            summary.push_str(&format!(
                "  Bedrooms extracted: {} ({} unparseable)\n",
                self.attributes.bedrooms_extracted, self.attributes.unparseable_bedrooms
            ));
        }

        summary.push_str(&format!(
            "\nFinal: {} without location, {} unresolved, {} with incomplete coordinates\n",
            self.final_no_location, self.final_unresolved, self.final_incomplete_coordinates
        ));

        summary
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
