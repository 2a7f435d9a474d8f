use std::path::Path;
use tracing::info;

use crate::config::CleansingConfig;
use crate::error::{CleansingError, Result};
use crate::models::{
    ColumnLayout, Gazetteer, LocatedRecord, NormalizedRecord, PropertyDataset, PropertyRecord,
    RawPropertyRecord,
};
use crate::processors::attribute_cleaner::AttributeCleaner;
use crate::processors::coordinate_processor::CoordinateProcessor;
use crate::processors::imputation_report::{CoordinateColumnReport, ImputationReport};
use crate::processors::location_imputer::{
    CoordinateResolutionStats, LocationImputer, NameResolutionStats,
};
use crate::readers::ConcurrentReader;
use crate::utils::progress::ProgressReporter;

/// The cleaned dataset together with what it took to produce it
#[derive(Debug, Clone)]
pub struct CleansingOutput {
    pub layout: ColumnLayout,
    pub records: Vec<PropertyRecord>,
    pub report: ImputationReport,
}

/// Runs attribute cleaning, coordinate normalization, Stage 1 and Stage 2
/// in that order over a whole dataset.
pub struct CleansingPipeline {
    config: CleansingConfig,
}

impl CleansingPipeline {
    pub fn new(config: CleansingConfig) -> Self {
        Self { config }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.config.processing.max_workers = max_workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.processing.chunk_size = chunk_size;
        self
    }

    pub fn config(&self) -> &CleansingConfig {
        &self.config
    }

    /// Read both inputs and clean the dataset
    pub async fn run(
        &self,
        dataset_path: &Path,
        gazetteer_path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<CleansingOutput> {
        if let Some(p) = progress {
            p.set_message("Reading dataset and gazetteer...");
        }

        let reader = ConcurrentReader::new(
            self.config.dataset.clone(),
            self.config.gazetteer.clone(),
        );
        let inputs = reader.read_inputs(dataset_path, gazetteer_path).await?;

        self.process(inputs.dataset, &inputs.gazetteer, progress)
    }

    /// Clean an in-memory dataset against a loaded gazetteer
    pub fn process(
        &self,
        dataset: PropertyDataset,
        gazetteer: &Gazetteer,
        progress: Option<&ProgressReporter>,
    ) -> Result<CleansingOutput> {
        self.config.check()?;

        // Configure Rayon thread pool
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.processing.max_workers)
            .build()
            .map_err(|e| CleansingError::Config(e.to_string()))?;

        pool.install(|| self.process_in_pool(dataset, gazetteer, progress))
    }

    fn process_in_pool(
        &self,
        dataset: PropertyDataset,
        gazetteer: &Gazetteer,
        progress: Option<&ProgressReporter>,
    ) -> Result<CleansingOutput> {
        let total_records = dataset.len();
        let PropertyDataset { layout, records } = dataset;
        let mut report = ImputationReport {
            gazetteer: gazetteer.stats().clone(),
            ..ImputationReport::default()
        };

        if let Some(p) = progress {
            p.set_message("Cleaning attributes...");
        }
        let cleaner = AttributeCleaner::new(self.config.attributes.clone())?;
        let (records, attribute_stats) = cleaner.clean(records);
        report.attributes = attribute_stats;

        if let Some(p) = progress {
            p.set_message("Normalizing coordinates...");
        }
        let normalized = self.normalize(&layout, records, &mut report)?;

        let imputer = LocationImputer::new(gazetteer);
        let chunk_size = self.config.processing.chunk_size;

        // Stage 1 finishes for every record before Stage 2 starts
        if let Some(p) = progress {
            p.set_message("Resolving names from coordinates...");
        }
        let mut located: Vec<LocatedRecord> = Vec::with_capacity(total_records);
        let mut name_stats = NameResolutionStats::default();
        let mut pending = normalized.into_iter();
        loop {
            let chunk: Vec<NormalizedRecord> = pending.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let count = chunk.len() as u64;
            let resolution = imputer.resolve_names(chunk);
            name_stats += &resolution.stats;
            located.extend(resolution.records);
            if let Some(p) = progress {
                p.increment(count);
            }
        }
        info!(
            kept = name_stats.kept,
            resolved = name_stats.resolved,
            no_location = name_stats.no_location,
            unresolved = name_stats.unresolved,
            "stage 1 (coordinates to name) complete"
        );

        if let Some(p) = progress {
            p.set_message("Resolving coordinates from names...");
        }
        let mut resolved: Vec<PropertyRecord> = Vec::with_capacity(total_records);
        let mut coordinate_stats = CoordinateResolutionStats::default();
        let mut pending = located.into_iter();
        loop {
            let chunk: Vec<LocatedRecord> = pending.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let count = chunk.len() as u64;
            let resolution = imputer.resolve_coordinates(chunk);
            coordinate_stats += &resolution.stats;
            resolved.extend(resolution.records);
            if let Some(p) = progress {
                p.increment(count);
            }
        }
        info!(
            latitudes_filled = coordinate_stats.latitudes_filled,
            longitudes_filled = coordinate_stats.longitudes_filled,
            unmatched_names = coordinate_stats.unmatched_names,
            "stage 2 (name to coordinates) complete"
        );

        if resolved.len() != total_records {
            return Err(CleansingError::InvalidFormat(format!(
                "Row count changed during imputation: {} in, {} out",
                total_records,
                resolved.len()
            )));
        }

        report.names = name_stats;
        report.coordinates = coordinate_stats;
        report.record_final_state(&resolved);

        if let Some(p) = progress {
            p.finish_with_message(&format!("Cleaned {} records", total_records));
        }

        Ok(CleansingOutput {
            layout,
            records: resolved,
            report,
        })
    }

    /// Clean both coordinate columns and pair them back with their rows
    fn normalize(
        &self,
        layout: &ColumnLayout,
        records: Vec<RawPropertyRecord>,
        report: &mut ImputationReport,
    ) -> Result<Vec<NormalizedRecord>> {
        let processor = CoordinateProcessor::with_strict(self.config.processing.strict_coordinates);

        let raw_latitudes: Vec<Option<&str>> =
            records.iter().map(|r| r.latitude.as_deref()).collect();
        let latitudes = processor.process_column(&layout.latitude, &raw_latitudes)?;

        let raw_longitudes: Vec<Option<&str>> =
            records.iter().map(|r| r.longitude.as_deref()).collect();
        let longitudes = processor.process_column(&layout.longitude, &raw_longitudes)?;

        report.latitude = CoordinateColumnReport::from_column(&layout.latitude, &latitudes);
        report.longitude = CoordinateColumnReport::from_column(&layout.longitude, &longitudes);
        info!(
            latitudes_repaired = latitudes.repaired,
            longitudes_repaired = longitudes.repaired,
            rejected = latitudes.rejected.len() + longitudes.rejected.len(),
            "coordinates normalized"
        );

        let normalized = records
            .into_iter()
            .zip(latitudes.values.into_iter().zip(longitudes.values))
            .map(|(record, (latitude, longitude))| NormalizedRecord {
                latitude,
                longitude,
                location: record.location,
                attributes: record.attributes,
            })
            .collect();

        Ok(normalized)
    }
}

impl Default for CleansingPipeline {
    fn default() -> Self {
        Self::new(CleansingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GazetteerEntry, Location};
    use crate::readers::PropertyReader;
    use pretty_assertions::assert_eq;

    fn athens_gazetteer() -> Gazetteer {
        Gazetteer::from_entries(
            vec![
                GazetteerEntry::new("Athens", 37.98, 23.73),
                GazetteerEntry::new("Piraeus", 37.94, 23.65),
            ],
            5,
        )
    }

    fn dataset(text: &str) -> PropertyDataset {
        PropertyReader::default()
            .parse_dataset(text)
            .expect("fixture should parse")
    }

    #[test]
    fn test_process_end_to_end() -> Result<()> {
        let input = dataset(
            "id,latitude,longitude,location\n\
             1,37.98,23.73,-\n\
             2,,,Athens\n\
             3,,,-\n\
             4,3794000000,-23.65,\n",
        );

        let output = CleansingPipeline::default()
            .with_chunk_size(2)
            .process(input, &athens_gazetteer(), None)?;

        let summary: Vec<(f64, f64, String, &str)> = output
            .records
            .iter()
            .map(|r| {
                (
                    r.latitude,
                    r.longitude,
                    r.location.to_string(),
                    r.attribute("id").unwrap_or_default(),
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                (37.98, 23.73, "Athens".to_string(), "1"),
                (37.98, 23.73, "Athens".to_string(), "2"),
                (0.0, 0.0, "No location".to_string(), "3"),
                (37.94, 23.65, "Piraeus".to_string(), "4"),
            ]
        );

        let report = &output.report;
        assert_eq!(report.total_records, 4);
        assert_eq!(report.latitude.repaired, 1);
        assert_eq!(report.names.resolved, 2);
        assert_eq!(report.names.kept, 1);
        assert_eq!(report.names.no_location, 1);
        assert_eq!(report.coordinates.latitudes_filled, 1);
        assert_eq!(report.final_no_location, 1);
        Ok(())
    }

    #[test]
    fn test_strict_coordinates_fail_the_run() {
        let mut config = CleansingConfig::default();
        config.processing.strict_coordinates = true;

        let input = dataset("latitude,longitude,location\nnorth,23.73,-\n");
        let result = CleansingPipeline::new(config).process(input, &athens_gazetteer(), None);

        assert!(matches!(result, Err(CleansingError::InvalidCoordinate(msg)) if msg.contains("row 0")));
    }

    #[test]
    fn test_lenient_coordinates_fall_back_to_sentinel() -> Result<()> {
        let input = dataset("latitude,longitude,location\nnorth,23.73,Athens\n");
        let output = CleansingPipeline::default().process(input, &athens_gazetteer(), None)?;

        assert_eq!(output.report.latitude.rejected.len(), 1);
        // Stage 2 fills the rejected latitude from the name
        assert_eq!(output.records[0].latitude, 37.98);
        assert_eq!(output.records[0].location, Location::Named("Athens".to_string()));
        Ok(())
    }

    #[test]
    fn test_invalid_worker_count() {
        let input = dataset("latitude,longitude,location\n37.98,23.73,-\n");
        let result = CleansingPipeline::default()
            .with_max_workers(0)
            .process(input, &athens_gazetteer(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_dataset() -> Result<()> {
        let input = dataset("latitude,longitude,location\n");
        let output = CleansingPipeline::default().process(input, &athens_gazetteer(), None)?;
        assert!(output.records.is_empty());
        assert_eq!(output.report.total_records, 0);
        Ok(())
    }
}
