/// Location sentinels
pub const LOCATION_MISSING: &str = "-";
pub const NO_LOCATION: &str = "No location";

/// Coordinate sentinel for "unknown"
pub const COORDINATE_MISSING: f64 = 0.0;

/// Coordinate repair heuristic
pub const COORDINATE_MAGNITUDE_THRESHOLD: f64 = 100.0;
pub const MAX_WELL_FORMED_DIGITS: usize = 8;
pub const INTEGER_DEGREE_DIGITS: usize = 2;

/// Gazetteer join precision (decimal digits)
pub const DEFAULT_COORDINATE_PRECISION: u32 = 5;

/// Default column names
pub const DEFAULT_LATITUDE_COLUMN: &str = "latitude";
pub const DEFAULT_LONGITUDE_COLUMN: &str = "longitude";
pub const DEFAULT_LOCATION_COLUMN: &str = "location";
pub const DEFAULT_LOCALITY_COLUMN: &str = "Locality";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Environment prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "ESTATE_CLEANSER";

/// Output formats
pub const FORMAT_CSV: &str = "csv";
pub const FORMAT_PARQUET: &str = "parquet";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
