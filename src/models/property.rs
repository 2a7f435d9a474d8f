use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use crate::utils::constants::{COORDINATE_MISSING, LOCATION_MISSING, NO_LOCATION};

/// Business columns that travel through the pipeline untouched by imputation
pub type Attributes = BTreeMap<String, String>;

/// State of a record's location after Stage 1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Named(String),
    /// Not provided and not (yet) recovered; rendered as `-`
    Unresolved,
    /// Neither a name nor coordinates were provided; rendered as `No location`
    NoLocation,
}

impl Location {
    /// Interpret raw location text. Absent, blank and `-` all mean "not provided".
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => Location::Unresolved,
            Some(text) if text.trim().is_empty() || text.trim() == LOCATION_MISSING => {
                Location::Unresolved
            }
            Some(text) if text.trim() == NO_LOCATION => Location::NoLocation,
            Some(name) => Location::Named(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Location::Named(name) => name,
            Location::Unresolved => LOCATION_MISSING,
            Location::NoLocation => NO_LOCATION,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Location::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Location::Named(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Location::Unresolved)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row exactly as read from the dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPropertyRecord {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub location: Option<String>,
    pub attributes: Attributes,
}

impl RawPropertyRecord {
    pub fn new(
        latitude: Option<&str>,
        longitude: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        Self {
            latitude: latitude.map(str::to_string),
            longitude: longitude.map(str::to_string),
            location: location.map(str::to_string),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, column: &str, value: &str) -> Self {
        self.attributes.insert(column.to_string(), value.to_string());
        self
    }
}

/// Row after coordinate normalization, before any gazetteer lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub location: Option<String>,
    pub attributes: Attributes,
}

impl NormalizedRecord {
    pub fn new(latitude: f64, longitude: f64, location: Option<&str>) -> Self {
        Self {
            latitude,
            longitude,
            location: location.map(str::to_string),
            attributes: Attributes::new(),
        }
    }

    pub fn has_unknown_coordinates(&self) -> bool {
        self.latitude == COORDINATE_MISSING && self.longitude == COORDINATE_MISSING
    }
}

/// Row after Stage 1 (coordinates → name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub location: Location,
    pub attributes: Attributes,
}

impl LocatedRecord {
    /// Lift a normalized record using only its own location text, without
    /// consulting the gazetteer and without the `No location` rule.
    pub fn from_own_fields(record: NormalizedRecord) -> Self {
        Self {
            location: Location::from_raw(record.location.as_deref()),
            latitude: record.latitude,
            longitude: record.longitude,
            attributes: record.attributes,
        }
    }
}

/// Fully imputed row, the output of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PropertyRecord {
    #[validate(range(min = 0.0, max = 100.0))]
    pub latitude: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub longitude: f64,

    pub location: Location,

    pub attributes: Attributes,
}

impl PropertyRecord {
    pub fn new(latitude: f64, longitude: f64, location: Location) -> Self {
        Self {
            latitude,
            longitude,
            location,
            attributes: Attributes::new(),
        }
    }

    pub fn is_coordinate_complete(&self) -> bool {
        self.latitude != COORDINATE_MISSING && self.longitude != COORDINATE_MISSING
    }

    pub fn is_location_complete(&self) -> bool {
        self.location.is_named()
    }

    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}
