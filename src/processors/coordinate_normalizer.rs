use crate::utils::constants::{INTEGER_DEGREE_DIGITS, MAX_WELL_FORMED_DIGITS};

/// Cell texts that mean "no value" in the source exports
const NULL_TOKENS: [&str; 6] = ["nan", "na", "n/a", "null", "none", "<na>"];

/// Outcome of reading one raw coordinate cell
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCoordinate {
    Value(f64),
    Missing,
    Unparseable(String),
}

impl ParsedCoordinate {
    pub fn is_unparseable(&self) -> bool {
        matches!(self, ParsedCoordinate::Unparseable(_))
    }
}

/// Parse a raw coordinate cell.
///
/// Sign characters are dropped (the dataset stores unsigned magnitudes) and a
/// locale decimal comma becomes a dot. Absent, blank and null-like cells are
/// `Missing`; anything else that is not a finite number is `Unparseable`.
///
/// # Examples
/// ```
/// use estate_cleanser::processors::coordinate_normalizer::{parse_coordinate, ParsedCoordinate};
///
/// assert_eq!(parse_coordinate(Some("-37,98")), ParsedCoordinate::Value(37.98));
/// assert_eq!(parse_coordinate(Some("")), ParsedCoordinate::Missing);
/// ```
pub fn parse_coordinate(raw: Option<&str>) -> ParsedCoordinate {
    let Some(raw) = raw else {
        return ParsedCoordinate::Missing;
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && *c != '+')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || NULL_TOKENS.contains(&cleaned.to_ascii_lowercase().as_str()) {
        return ParsedCoordinate::Missing;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => ParsedCoordinate::Value(value),
        _ => ParsedCoordinate::Unparseable(raw.to_string()),
    }
}

/// Shortest round-trip decimal rendering, with `.0` on integral values and
/// never in exponent form.
pub fn render_decimal(value: f64) -> String {
    let rendered = format!("{}", value);
    if rendered.contains('.') || !value.is_finite() {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

/// Digits of a magnitude with the decimal point removed and leading zeros stripped
pub fn significant_digits(magnitude: f64) -> String {
    render_decimal(magnitude.abs())
        .replace('.', "")
        .trim_start_matches('0')
        .to_string()
}

/// Repair a coordinate whose decimal separator was lost.
///
/// Values rendering to more than eight significant digits get a decimal point
/// placed after their first two digits; everything else is returned as is.
/// The repair works on the magnitude and keeps the sign of the input.
///
/// # Examples
/// ```
/// use estate_cleanser::processors::coordinate_normalizer::fix_coordinate;
///
/// assert_eq!(fix_coordinate(371234567.0), 37.1234567);
/// assert_eq!(fix_coordinate(37.98), 37.98);
/// ```
pub fn fix_coordinate(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let digits = significant_digits(value);
    if digits.len() <= MAX_WELL_FORMED_DIGITS || digits.len() <= INTEGER_DEGREE_DIGITS {
        return value;
    }

    let (degrees, fraction) = digits.split_at(INTEGER_DEGREE_DIGITS);
    match format!("{}.{}", degrees, fraction).parse::<f64>() {
        Ok(repaired) => repaired.copysign(value),
        Err(_) => value,
    }
}
