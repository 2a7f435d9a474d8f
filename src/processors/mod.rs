pub mod attribute_cleaner;
pub mod coordinate_normalizer;
pub mod coordinate_processor;
pub mod imputation_report;
pub mod location_imputer;
pub mod pipeline;

pub use attribute_cleaner::{AttributeCleaner, AttributeCleaningStats};
pub use coordinate_normalizer::{fix_coordinate, parse_coordinate, ParsedCoordinate};
pub use coordinate_processor::{CellOutcome, CoordinateColumn, CoordinateProcessor, RejectedCoordinate};
pub use imputation_report::{CoordinateColumnReport, ImputationReport};
pub use location_imputer::{
    CoordinateResolution, CoordinateResolutionStats, LocationImputer, NameResolution,
    NameResolutionStats,
};
pub use pipeline::{CleansingOutput, CleansingPipeline};
