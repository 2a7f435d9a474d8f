use crate::config::DatasetSettings;
use crate::error::{CleansingError, Result};
use crate::models::{ColumnLayout, ColumnRole, PropertyRecord};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(CleansingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Write cleaned records to a Parquet file, columns in header order
    pub fn write_records(
        &self,
        layout: &ColumnLayout,
        records: &[PropertyRecord],
        path: &Path,
    ) -> Result<()> {
        self.write_records_batched(layout, records, path, records.len().max(1))
    }

    /// Write records in batches for memory efficiency
    pub fn write_records_batched(
        &self,
        layout: &ColumnLayout,
        records: &[PropertyRecord],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if batch_size == 0 {
            return Err(CleansingError::Config("Batch size must be positive".to_string()));
        }

        let schema = self.create_schema(layout);
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(self.writer_properties()))?;

        for chunk in records.chunks(batch_size) {
            let batch = self.records_to_batch(layout, chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// Core fields are typed; every attribute is nullable text
    fn create_schema(&self, layout: &ColumnLayout) -> Arc<Schema> {
        let fields: Vec<Field> = layout
            .headers
            .iter()
            .map(|header| match layout.role(header) {
                ColumnRole::Latitude | ColumnRole::Longitude => {
                    Field::new(header, DataType::Float64, false)
                }
                ColumnRole::Location => Field::new(header, DataType::Utf8, false),
                ColumnRole::Attribute(_) => Field::new(header, DataType::Utf8, true),
            })
            .collect();

        Arc::new(Schema::new(fields))
    }

    /// Convert records to Arrow RecordBatch
    fn records_to_batch(
        &self,
        layout: &ColumnLayout,
        records: &[PropertyRecord],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = layout
            .headers
            .iter()
            .map(|header| -> ArrayRef {
                match layout.role(header) {
                    ColumnRole::Latitude => Arc::new(Float64Array::from(
                        records.iter().map(|r| r.latitude).collect::<Vec<f64>>(),
                    )),
                    ColumnRole::Longitude => Arc::new(Float64Array::from(
                        records.iter().map(|r| r.longitude).collect::<Vec<f64>>(),
                    )),
                    ColumnRole::Location => Arc::new(StringArray::from(
                        records.iter().map(|r| r.location.as_str()).collect::<Vec<&str>>(),
                    )),
                    ColumnRole::Attribute(name) => Arc::new(StringArray::from(
                        records
                            .iter()
                            .map(|r| r.attribute(name).filter(|v| !v.is_empty()))
                            .collect::<Vec<Option<&str>>>(),
                    )),
                }
            })
            .collect();

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Read `(location, latitude, longitude)` for the first `limit` rows
    pub fn read_sample_records(
        &self,
        path: &Path,
        columns: &DatasetSettings,
        limit: usize,
    ) -> Result<Vec<SampleRecord>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.min(8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            let batch = batch_result?;

            let locations = string_column(&batch, &columns.location)?;
            let latitudes = float_column(&batch, &columns.latitude)?;
            let longitudes = float_column(&batch, &columns.longitude)?;

            let batch_records_to_read = batch.num_rows().min(limit - records.len());
            for i in 0..batch_records_to_read {
                records.push(SampleRecord {
                    location: locations.value(i).to_string(),
                    latitude: latitudes.value(i),
                    longitude: longitudes.value(i),
                });
            }

            if records.len() >= limit {
                break;
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        // Compression actually used in the file, not the writer's setting
        let compression = (row_groups > 0 && metadata.row_group(0).num_columns() > 0)
            .then(|| metadata.row_group(0).column(0).compression());

        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
        })
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| CleansingError::InvalidFormat(format!("Invalid {} column type", name)))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| CleansingError::InvalidFormat(format!("Invalid {} column type", name)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// The imputed fields of one stored row
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Option<Compression>,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        let compression = self
            .compression
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {}\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            compression,
            avg_rows,
            self.columns.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn layout() -> ColumnLayout {
        ColumnLayout::new(
            vec![
                "price".to_string(),
                "latitude".to_string(),
                "longitude".to_string(),
                "location".to_string(),
            ],
            "latitude",
            "longitude",
            "location",
        )
        .unwrap()
    }

    fn records() -> Vec<PropertyRecord> {
        let mut athens = PropertyRecord::new(37.98, 23.73, Location::Named("Athens".to_string()));
        athens.attributes.insert("price".to_string(), "150000".to_string());

        let mut nowhere = PropertyRecord::new(0.0, 0.0, Location::NoLocation);
        nowhere.attributes.insert("price".to_string(), String::new());

        vec![athens, nowhere, PropertyRecord::new(37.5, 0.0, Location::Unresolved)]
    }

    #[test]
    fn test_write_empty_records() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_records(&layout(), &[], temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        assert_eq!(info.columns, vec!["price", "latitude", "longitude", "location"]);
        Ok(())
    }

    #[test]
    fn test_write_and_sample() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_records(&layout(), &records(), temp_file.path())?;

        let samples =
            writer.read_sample_records(temp_file.path(), &DatasetSettings::default(), 2)?;
        assert_eq!(
            samples,
            vec![
                SampleRecord {
                    location: "Athens".to_string(),
                    latitude: 37.98,
                    longitude: 23.73,
                },
                SampleRecord {
                    location: "No location".to_string(),
                    latitude: 0.0,
                    longitude: 0.0,
                },
            ]
        );

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert!(info.summary().contains("Total rows: 3"));
        Ok(())
    }

    #[test]
    fn test_batched_write_row_groups() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(1);
        let temp_file = NamedTempFile::new()?;

        writer.write_records_batched(&layout(), &records(), temp_file.path(), 2)?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert_eq!(info.row_groups, 3);
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_records(&layout(), &records(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-ish").is_err());
        Ok(())
    }
}
