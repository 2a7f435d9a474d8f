use memmap2::Mmap;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{delimiter_byte, encoding_label, DatasetSettings};
use crate::error::{CleansingError, Result};
use crate::models::{ColumnLayout, ColumnRole, PropertyDataset, RawPropertyRecord};

/// Decode file bytes with a WHATWG encoding label; a BOM takes precedence
pub(crate) fn decode_bytes<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let encoding = encoding_label(label)?;

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = used.name(), "input contained malformed byte sequences");
    }
    Ok(text)
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub struct PropertyReader {
    settings: DatasetSettings,
}

impl PropertyReader {
    pub fn new(settings: DatasetSettings) -> Self {
        Self { settings }
    }

    /// Read the working dataset from a delimited file
    pub fn read_dataset(&self, path: &Path) -> Result<PropertyDataset> {
        debug!(path = %path.display(), mmap = self.settings.use_mmap, "reading dataset");

        if self.settings.use_mmap {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            self.parse_bytes(&mmap)
        } else {
            let bytes = std::fs::read(path)?;
            self.parse_bytes(&bytes)
        }
    }

    fn parse_bytes(&self, bytes: &[u8]) -> Result<PropertyDataset> {
        let text = decode_bytes(bytes, &self.settings.encoding)?;
        self.parse_dataset(&text)
    }

    /// Parse dataset text with a header row
    pub fn parse_dataset(&self, text: &str) -> Result<PropertyDataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter_byte(&self.settings.delimiter)?)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(CleansingError::InvalidFormat(format!(
                "Duplicate column header: '{}'",
                duplicate
            )));
        }

        let layout = ColumnLayout::new(
            headers,
            &self.settings.latitude,
            &self.settings.longitude,
            &self.settings.location,
        )?;

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            let mut record = RawPropertyRecord::default();

            for (header, value) in layout.headers.iter().zip(row.iter()) {
                match layout.role(header) {
                    ColumnRole::Latitude => record.latitude = non_empty(value),
                    ColumnRole::Longitude => record.longitude = non_empty(value),
                    ColumnRole::Location => record.location = non_empty(value),
                    ColumnRole::Attribute(name) => {
                        record.attributes.insert(name.to_string(), value.to_string());
                    }
                }
            }

            records.push(record);
        }

        debug!(rows = records.len(), columns = layout.headers.len(), "dataset parsed");
        Ok(PropertyDataset::new(layout, records))
    }
}

impl Default for PropertyReader {
    fn default() -> Self {
        Self::new(DatasetSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
price,latitude,longitude,location,area
150000,37.98,23.73,Athens,\"85,5\"
,\"37,94\",-23.65,,60
90000,,,-,45
";

    #[test]
    fn test_parse_dataset() -> Result<()> {
        let reader = PropertyReader::default();
        let dataset = reader.parse_dataset(SAMPLE)?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.layout.headers,
            vec!["price", "latitude", "longitude", "location", "area"]
        );

        let first = &dataset.records[0];
        assert_eq!(first.latitude.as_deref(), Some("37.98"));
        assert_eq!(first.location.as_deref(), Some("Athens"));
        assert_eq!(first.attributes["area"], "85,5");

        let second = &dataset.records[1];
        assert_eq!(second.latitude.as_deref(), Some("37,94"));
        assert_eq!(second.longitude.as_deref(), Some("-23.65"));
        assert_eq!(second.location, None);
        assert_eq!(second.attributes["price"], "");

        let third = &dataset.records[2];
        assert_eq!(third.latitude, None);
        assert_eq!(third.location.as_deref(), Some("-"));
        Ok(())
    }

    #[test]
    fn test_missing_required_column() {
        let reader = PropertyReader::default();
        let result = reader.parse_dataset("price,lat,longitude,location\n1,2,3,x\n");
        assert!(matches!(result, Err(CleansingError::MissingColumn(c)) if c == "latitude"));
    }

    #[test]
    fn test_duplicate_header() {
        let reader = PropertyReader::default();
        let result = reader.parse_dataset("latitude,longitude,location,area,area\n1,2,x,3,4\n");
        assert!(matches!(result, Err(CleansingError::InvalidFormat(_))));
    }

    #[test]
    fn test_custom_columns_and_delimiter() -> Result<()> {
        let settings = DatasetSettings {
            latitude: "lat".to_string(),
            longitude: "lng".to_string(),
            location: "area_name".to_string(),
            delimiter: ";".to_string(),
            ..DatasetSettings::default()
        };
        let reader = PropertyReader::new(settings);
        let dataset = reader.parse_dataset("lat;lng;area_name\n37,98;23,73;Plaka\n")?;

        assert_eq!(dataset.records[0].latitude.as_deref(), Some("37,98"));
        assert_eq!(dataset.records[0].location.as_deref(), Some("Plaka"));
        assert!(dataset.records[0].attributes.is_empty());
        Ok(())
    }

    #[test]
    fn test_read_legacy_encoding_with_mmap() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        // "Αθήνα" in windows-1253
        let mut bytes = b"latitude,longitude,location\n37.98,23.73,".to_vec();
        bytes.extend_from_slice(&[0xC1, 0xE8, 0xDE, 0xED, 0xE1]);
        bytes.push(b'\n');
        temp_file.write_all(&bytes)?;

        let settings = DatasetSettings {
            encoding: "windows-1253".to_string(),
            use_mmap: true,
            ..DatasetSettings::default()
        };
        let dataset = PropertyReader::new(settings).read_dataset(temp_file.path())?;

        assert_eq!(dataset.records[0].location.as_deref(), Some("Αθήνα"));
        Ok(())
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(decode_bytes(b"abc", "klingon").is_err());
    }
}
