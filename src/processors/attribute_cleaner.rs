use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AttributeColumns;
use crate::error::Result;
use crate::models::RawPropertyRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeCleaningStats {
    pub decimals_normalized: usize,
    pub unparseable_decimals: usize,
    pub prices_reconciled: usize,
    pub unreconcilable_prices: usize,
    pub property_types_mapped: usize,
    pub parking_mapped: usize,
    pub bedrooms_extracted: usize,
    pub unparseable_bedrooms: usize,
}

/// Single-column remapping of the business attributes.
///
/// None of these look at other rows or at the coordinate/location fields.
pub struct AttributeCleaner {
    columns: AttributeColumns,
    property_types: Vec<(Regex, &'static str)>,
    parking: Vec<(Regex, &'static str)>,
    first_number: Regex,
}

impl AttributeCleaner {
    pub fn new(columns: AttributeColumns) -> Result<Self> {
        // Passes run in order, each on the value the previous pass left
        let property_types = vec![
            (Regex::new("ll|villa")?, "Villa"),
            (Regex::new("apa|rt|apart")?, "Apartment"),
            (Regex::new("st|stud")?, "Studio Flat"),
        ];
        let parking = vec![
            (Regex::new("y|yes|true|tr")?, "Yes"),
            (Regex::new("n|no|false|f")?, "No"),
        ];

        Ok(Self {
            columns,
            property_types,
            parking,
            first_number: Regex::new(r"\d+")?,
        })
    }

    /// Parse a number written with either decimal separator
    pub fn normalize_decimal(value: &str) -> Option<f64> {
        value
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Price implied by price per square meter and area, to the nearest thousand
    pub fn estimate_price(price_m2: f64, area: f64) -> Option<i64> {
        let estimate = ((price_m2 * area) / 1000.0).round() * 1000.0;
        estimate.is_finite().then_some(estimate as i64)
    }

    pub fn map_property_type(&self, value: &str) -> String {
        Self::apply_passes(&self.property_types, value.to_lowercase())
    }

    pub fn map_parking(&self, value: &str) -> String {
        Self::apply_passes(&self.parking, value.to_lowercase())
    }

    /// Bedroom count from free text: the number before the first comma, or
    /// the first run of digits.
    pub fn extract_bedrooms(&self, value: &str) -> Option<u32> {
        if let Some((head, _)) = value.split_once(',') {
            head.trim().parse::<u32>().ok()
        } else {
            self.first_number
                .find(value)
                .and_then(|m| m.as_str().parse::<u32>().ok())
        }
    }

    fn apply_passes(passes: &[(Regex, &'static str)], mut value: String) -> String {
        for (pattern, replacement) in passes {
            if pattern.is_match(&value) {
                value = (*replacement).to_string();
            }
        }
        value
    }

    /// Run every configured cleaner over the records
    pub fn clean(
        &self,
        mut records: Vec<RawPropertyRecord>,
    ) -> (Vec<RawPropertyRecord>, AttributeCleaningStats) {
        let mut stats = AttributeCleaningStats::default();

        for column in &self.columns.decimal_columns {
            self.clean_decimal_column(&mut records, column, &mut stats);
        }

        if let (Some(price), Some(price_m2), Some(area)) = (
            self.columns.price.as_deref(),
            self.columns.price_m2.as_deref(),
            self.columns.area.as_deref(),
        ) {
            // The estimate inputs are stored back as plain decimals too
            for column in [price_m2, area] {
                if !self.columns.decimal_columns.iter().any(|c| c == column) {
                    self.clean_decimal_column(&mut records, column, &mut stats);
                }
            }
            self.reconcile_prices(&mut records, price, price_m2, area, &mut stats);
        } else {
            debug!("price reconciliation not configured");
        }

        if let Some(column) = self.columns.property_type.as_deref() {
            stats.property_types_mapped =
                self.map_column(&mut records, column, |value| self.map_property_type(value));
        }

        if let Some(column) = self.columns.has_parking.as_deref() {
            stats.parking_mapped =
                self.map_column(&mut records, column, |value| self.map_parking(value));
        }

        if let Some(column) = self.columns.bedrooms.as_deref() {
            self.clean_bedrooms(&mut records, column, &mut stats);
        }

        (records, stats)
    }

    fn clean_decimal_column(
        &self,
        records: &mut [RawPropertyRecord],
        column: &str,
        stats: &mut AttributeCleaningStats,
    ) {
        for (row, record) in records.iter_mut().enumerate() {
            let Some(cell) = record.attributes.get_mut(column) else {
                continue;
            };
            if cell.trim().is_empty() {
                continue;
            }
            match Self::normalize_decimal(cell.as_str()) {
                Some(value) => {
                    *cell = value.to_string();
                    stats.decimals_normalized += 1;
                }
                None => {
                    warn!(column, row, value = %cell, "not a decimal number");
                    stats.unparseable_decimals += 1;
                }
            }
        }
    }

    fn reconcile_prices(
        &self,
        records: &mut [RawPropertyRecord],
        price: &str,
        price_m2: &str,
        area: &str,
        stats: &mut AttributeCleaningStats,
    ) {
        for (row, record) in records.iter_mut().enumerate() {
            let Some(current) = record.attributes.get(price) else {
                continue;
            };
            if current.trim().parse::<f64>().map_or(false, f64::is_finite) {
                continue;
            }

            let estimate = record
                .attributes
                .get(price_m2)
                .and_then(|v| Self::normalize_decimal(v))
                .zip(record.attributes.get(area).and_then(|v| Self::normalize_decimal(v)))
                .and_then(|(per_m2, size)| Self::estimate_price(per_m2, size));

            match estimate {
                Some(estimate) => {
                    record.attributes.insert(price.to_string(), estimate.to_string());
                    stats.prices_reconciled += 1;
                }
                None => {
                    warn!(row, "price is not numeric and cannot be estimated");
                    stats.unreconcilable_prices += 1;
                }
            }
        }
    }

    fn map_column<F>(&self, records: &mut [RawPropertyRecord], column: &str, map: F) -> usize
    where
        F: Fn(&str) -> String,
    {
        let mut mapped = 0;
        for record in records.iter_mut() {
            if let Some(cell) = record.attributes.get_mut(column) {
                if cell.trim().is_empty() {
                    continue;
                }
                *cell = map(cell.as_str());
                mapped += 1;
            }
        }
        mapped
    }

    fn clean_bedrooms(
        &self,
        records: &mut [RawPropertyRecord],
        column: &str,
        stats: &mut AttributeCleaningStats,
    ) {
        for (row, record) in records.iter_mut().enumerate() {
            let Some(cell) = record.attributes.get_mut(column) else {
                continue;
            };
            match self.extract_bedrooms(cell.as_str()) {
                Some(count) => {
                    *cell = count.to_string();
                    stats.bedrooms_extracted += 1;
                }
                None => {
                    warn!(column, row, value = %cell, "no bedroom count found");
                    stats.unparseable_bedrooms += 1;
                }
            }
        }
    }
}
