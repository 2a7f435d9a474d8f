use crate::error::{CleansingError, Result};

/// Largest precision that still fits a scaled coordinate in an `i64`
pub const MAX_PRECISION: u32 = 12;

/// Round a coordinate to `precision` decimal digits (half away from zero)
///
/// # Examples
/// ```
/// use estate_cleanser::utils::round_to_precision;
///
/// assert_eq!(round_to_precision(37.9838096, 5), 37.98381);
/// assert_eq!(round_to_precision(23.7275388, 5), 23.72754);
/// ```
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Integer form of a coordinate rounded to `precision` digits.
///
/// Two coordinates that round to the same value at `precision` produce the
/// same scaled value, which makes them usable as exact hash keys.
pub fn scaled_coordinate(value: f64, precision: u32) -> i64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() as i64
}

/// Check that a precision is usable for scaled keys
pub fn validate_precision(precision: u32) -> Result<u32> {
    if precision > MAX_PRECISION {
        return Err(CleansingError::Config(format!(
            "Coordinate precision must be at most {}, got: {}",
            MAX_PRECISION, precision
        )));
    }
    Ok(precision)
}
