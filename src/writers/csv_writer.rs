use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::{ColumnLayout, ColumnRole, PropertyRecord};
use crate::processors::coordinate_normalizer::render_decimal;

/// Writes the cleaned dataset back as delimited text, same columns in the
/// same order as the input.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_records(
        &self,
        layout: &ColumnLayout,
        records: &[PropertyRecord],
        path: &Path,
    ) -> Result<()> {
        self.write_to(layout, records, File::create(path)?)
    }

    pub fn write_to<W: Write>(
        &self,
        layout: &ColumnLayout,
        records: &[PropertyRecord],
        sink: W,
    ) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);

        writer.write_record(&layout.headers)?;

        for record in records {
            let row: Vec<String> = layout
                .headers
                .iter()
                .map(|header| match layout.role(header) {
                    ColumnRole::Latitude => render_decimal(record.latitude),
                    ColumnRole::Longitude => render_decimal(record.longitude),
                    ColumnRole::Location => record.location.to_string(),
                    ColumnRole::Attribute(name) => {
                        record.attribute(name).unwrap_or_default().to_string()
                    }
                })
                .collect();
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
