use serde::{Deserialize, Serialize};

use crate::error::{CleansingError, Result};
use crate::models::property::RawPropertyRecord;

/// What a header of the working dataset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole<'a> {
    Latitude,
    Longitude,
    Location,
    Attribute(&'a str),
}

/// Header order of the working dataset and which headers hold the core fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub headers: Vec<String>,
    pub latitude: String,
    pub longitude: String,
    pub location: String,
}

impl ColumnLayout {
    /// Build a layout, failing if any core column is absent from the headers
    pub fn new(
        headers: Vec<String>,
        latitude: &str,
        longitude: &str,
        location: &str,
    ) -> Result<Self> {
        for required in [latitude, longitude, location] {
            if !headers.iter().any(|h| h == required) {
                return Err(CleansingError::MissingColumn(required.to_string()));
            }
        }

        Ok(Self {
            headers,
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            location: location.to_string(),
        })
    }

    pub fn role<'a>(&self, header: &'a str) -> ColumnRole<'a> {
        if header == self.latitude {
            ColumnRole::Latitude
        } else if header == self.longitude {
            ColumnRole::Longitude
        } else if header == self.location {
            ColumnRole::Location
        } else {
            ColumnRole::Attribute(header)
        }
    }

    /// Headers that are carried as attributes, in file order
    pub fn attribute_headers(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .map(String::as_str)
            .filter(move |h| matches!(self.role(h), ColumnRole::Attribute(_)))
    }
}

/// The working dataset as read from disk
#[derive(Debug, Clone)]
pub struct PropertyDataset {
    pub layout: ColumnLayout,
    pub records: Vec<RawPropertyRecord>,
}

impl PropertyDataset {
    pub fn new(layout: ColumnLayout, records: Vec<RawPropertyRecord>) -> Self {
        Self { layout, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        ["price", "latitude", "longitude", "location", "area"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_layout_roles() {
        let layout = ColumnLayout::new(headers(), "latitude", "longitude", "location").unwrap();

        assert_eq!(layout.role("latitude"), ColumnRole::Latitude);
        assert_eq!(layout.role("location"), ColumnRole::Location);
        assert_eq!(layout.role("price"), ColumnRole::Attribute("price"));

        let attributes: Vec<&str> = layout.attribute_headers().collect();
        assert_eq!(attributes, vec!["price", "area"]);
    }

    #[test]
    fn test_layout_missing_column() {
        let result = ColumnLayout::new(headers(), "lat", "longitude", "location");
        assert!(matches!(result, Err(CleansingError::MissingColumn(c)) if c == "lat"));
    }
}
