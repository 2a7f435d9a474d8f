pub mod dataset;
pub mod gazetteer;
pub mod property;

pub use dataset::{ColumnLayout, ColumnRole, PropertyDataset};
pub use gazetteer::{CoordinateKey, Gazetteer, GazetteerEntry, GazetteerStats, LocalityLookup};
pub use property::{
    Attributes, LocatedRecord, Location, NormalizedRecord, PropertyRecord, RawPropertyRecord,
};
