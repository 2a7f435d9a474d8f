use std::path::Path;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{DatasetSettings, GazetteerSettings};
use crate::error::Result;
use crate::models::{Gazetteer, PropertyDataset};
use crate::readers::{GazetteerReader, PropertyReader};

/// Everything a cleansing run consumes
#[derive(Debug, Clone)]
pub struct CleansingInputs {
    pub dataset: PropertyDataset,
    pub gazetteer: Gazetteer,
}

pub struct ConcurrentReader {
    dataset: DatasetSettings,
    gazetteer: GazetteerSettings,
}

impl ConcurrentReader {
    pub fn new(dataset: DatasetSettings, gazetteer: GazetteerSettings) -> Self {
        Self { dataset, gazetteer }
    }

    /// Read the dataset and the gazetteer concurrently
    pub async fn read_inputs(
        &self,
        dataset_path: &Path,
        gazetteer_path: &Path,
    ) -> Result<CleansingInputs> {
        let dataset_reader = PropertyReader::new(self.dataset.clone());
        let dataset_path = dataset_path.to_path_buf();
        let dataset_handle: JoinHandle<Result<PropertyDataset>> =
            tokio::task::spawn_blocking(move || dataset_reader.read_dataset(&dataset_path));

        let gazetteer_reader = GazetteerReader::new(self.gazetteer.clone());
        let gazetteer_path = gazetteer_path.to_path_buf();
        let gazetteer_handle: JoinHandle<Result<Gazetteer>> =
            tokio::task::spawn_blocking(move || gazetteer_reader.read_gazetteer(&gazetteer_path));

        // Wait for both reads to complete
        let (dataset, gazetteer) = tokio::try_join!(dataset_handle, gazetteer_handle)?;
        let gazetteer = gazetteer?;
        let dataset = dataset?;

        info!(
            rows = dataset.len(),
            gazetteer_entries = gazetteer.len(),
            "inputs loaded"
        );

        Ok(CleansingInputs { dataset, gazetteer })
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new(DatasetSettings::default(), GazetteerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleansingError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_inputs() -> Result<()> {
        let mut dataset = NamedTempFile::new()?;
        writeln!(dataset, "latitude,longitude,location,price")?;
        writeln!(dataset, "37.98,23.73,-,100000")?;
        writeln!(dataset, ",,Athens,200000")?;

        let mut gazetteer = NamedTempFile::new()?;
        writeln!(gazetteer, "Locality,latitude,longitude")?;
        writeln!(gazetteer, "Athens,37.98,23.73")?;

        let inputs = ConcurrentReader::default()
            .read_inputs(dataset.path(), gazetteer.path())
            .await?;

        assert_eq!(inputs.dataset.len(), 2);
        assert_eq!(inputs.gazetteer.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_gazetteer_failure_is_fatal() -> Result<()> {
        let mut dataset = NamedTempFile::new()?;
        writeln!(dataset, "latitude,longitude,location")?;
        writeln!(dataset, "37.98,23.73,-")?;

        let result = ConcurrentReader::default()
            .read_inputs(dataset.path(), Path::new("no/such/gazetteer.csv"))
            .await;

        assert!(matches!(result, Err(CleansingError::GazetteerLoad(_))));
        Ok(())
    }
}
