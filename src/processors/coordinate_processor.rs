use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CleansingError, Result};
use crate::processors::coordinate_normalizer::{fix_coordinate, parse_coordinate, ParsedCoordinate};
use crate::utils::constants::{COORDINATE_MAGNITUDE_THRESHOLD, COORDINATE_MISSING};

/// What happened to a single coordinate cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Clean(f64),
    Repaired { original: f64, repaired: f64 },
    Missing,
    Unparseable(String),
}

impl CellOutcome {
    /// Value stored in the cleaned column; `0.0` for anything unknown
    pub fn value(&self) -> f64 {
        match self {
            CellOutcome::Clean(value) => *value,
            CellOutcome::Repaired { repaired, .. } => *repaired,
            CellOutcome::Missing | CellOutcome::Unparseable(_) => COORDINATE_MISSING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCoordinate {
    pub row: usize,
    pub raw: String,
}

/// A cleaned coordinate column with what it took to clean it
#[derive(Debug, Clone, Default)]
pub struct CoordinateColumn {
    pub values: Vec<f64>,
    pub repaired: usize,
    pub missing: usize,
    pub rejected: Vec<RejectedCoordinate>,
}

impl CoordinateColumn {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct CoordinateProcessor {
    strict: bool,
}

impl CoordinateProcessor {
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// In strict mode an unparseable cell fails the whole column
    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }

    /// Clean one raw cell: strip sign and locale noise, default missing to
    /// the sentinel and repair oversized magnitudes.
    pub fn process_cell(&self, raw: Option<&str>) -> CellOutcome {
        match parse_coordinate(raw) {
            ParsedCoordinate::Missing => CellOutcome::Missing,
            ParsedCoordinate::Unparseable(text) => CellOutcome::Unparseable(text),
            ParsedCoordinate::Value(value) if value > COORDINATE_MAGNITUDE_THRESHOLD => {
                CellOutcome::Repaired {
                    original: value,
                    repaired: fix_coordinate(value),
                }
            }
            ParsedCoordinate::Value(value) => CellOutcome::Clean(value),
        }
    }

    /// Clean a whole column. Row order is preserved.
    pub fn process_column(&self, column: &str, raw: &[Option<&str>]) -> Result<CoordinateColumn> {
        let outcomes: Vec<CellOutcome> = raw.par_iter().map(|cell| self.process_cell(*cell)).collect();

        let mut cleaned = CoordinateColumn {
            values: Vec::with_capacity(outcomes.len()),
            ..CoordinateColumn::default()
        };

        for (row, outcome) in outcomes.into_iter().enumerate() {
            match &outcome {
                CellOutcome::Clean(_) => {}
                CellOutcome::Repaired { original, repaired } => {
                    debug!(column, row, original, repaired, "repaired coordinate magnitude");
                    cleaned.repaired += 1;
                }
                CellOutcome::Missing => cleaned.missing += 1,
                CellOutcome::Unparseable(text) => {
                    if self.strict {
                        return Err(CleansingError::InvalidCoordinate(format!(
                            "column '{}' row {}: '{}'",
                            column, row, text
                        )));
                    }
                    warn!(column, row, value = %text, "unparseable coordinate replaced by sentinel");
                    cleaned.rejected.push(RejectedCoordinate {
                        row,
                        raw: text.clone(),
                    });
                }
            }
            cleaned.values.push(outcome.value());
        }

        Ok(cleaned)
    }
}

impl Default for CoordinateProcessor {
    fn default() -> Self {
        Self::new()
    }
}
