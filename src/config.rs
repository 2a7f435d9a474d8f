use config::{Config, Environment, File};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

use crate::error::{CleansingError, Result};
use crate::utils::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_CHUNK_SIZE, DEFAULT_COORDINATE_PRECISION, DEFAULT_ENCODING,
    DEFAULT_LATITUDE_COLUMN, DEFAULT_LOCALITY_COLUMN, DEFAULT_LOCATION_COLUMN,
    DEFAULT_LONGITUDE_COLUMN,
};
use crate::utils::coordinates::validate_precision;

/// Where the core fields live in the working dataset and how to read it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatasetSettings {
    #[validate(length(min = 1))]
    pub latitude: String,
    #[validate(length(min = 1))]
    pub longitude: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub delimiter: String,
    pub encoding: String,
    pub use_mmap: bool,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE_COLUMN.to_string(),
            longitude: DEFAULT_LONGITUDE_COLUMN.to_string(),
            location: DEFAULT_LOCATION_COLUMN.to_string(),
            delimiter: ",".to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            use_mmap: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GazetteerSettings {
    #[validate(length(min = 1))]
    pub locality: String,
    #[validate(length(min = 1))]
    pub latitude: String,
    #[validate(length(min = 1))]
    pub longitude: String,
    pub precision: u32,
    pub delimiter: String,
    pub encoding: String,
}

impl Default for GazetteerSettings {
    fn default() -> Self {
        Self {
            locality: DEFAULT_LOCALITY_COLUMN.to_string(),
            latitude: DEFAULT_LATITUDE_COLUMN.to_string(),
            longitude: DEFAULT_LONGITUDE_COLUMN.to_string(),
            precision: DEFAULT_COORDINATE_PRECISION,
            delimiter: ",".to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

/// Business columns handled by the attribute cleaner; unset means skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeColumns {
    pub decimal_columns: Vec<String>,
    pub price: Option<String>,
    pub price_m2: Option<String>,
    pub area: Option<String>,
    pub property_type: Option<String>,
    pub has_parking: Option<String>,
    pub bedrooms: Option<String>,
}

impl AttributeColumns {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessingSettings {
    pub strict_coordinates: bool,
    #[validate(range(min = 1))]
    pub max_workers: usize,
    #[validate(range(min = 1))]
    pub chunk_size: usize,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            strict_coordinates: false,
            max_workers: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CleansingConfig {
    #[validate(nested)]
    pub dataset: DatasetSettings,
    #[validate(nested)]
    pub gazetteer: GazetteerSettings,
    pub attributes: AttributeColumns,
    #[validate(nested)]
    pub processing: ProcessingSettings,
}

impl CleansingConfig {
    /// Layer built-in defaults, an optional settings file and
    /// `ESTATE_CLEANSER_*` environment variables (`__` separates sections).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "loading settings file");
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Validate field ranges and delimiters
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        delimiter_byte(&self.dataset.delimiter)?;
        delimiter_byte(&self.gazetteer.delimiter)?;
        encoding_label(&self.dataset.encoding)?;
        encoding_label(&self.gazetteer.encoding)?;
        validate_precision(self.gazetteer.precision)?;
        Ok(())
    }
}

/// Resolve a WHATWG encoding label such as `utf-8` or `windows-1253`
pub fn encoding_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| CleansingError::Config(format!("Unknown encoding: '{}'", label)))
}

/// A delimiter setting as the single byte the CSV reader wants
pub fn delimiter_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ if delimiter == "\\t" => Ok(b'\t'),
        _ => Err(CleansingError::Config(format!(
            "Delimiter must be a single ASCII character, got: '{}'",
            delimiter
        ))),
    }
}
