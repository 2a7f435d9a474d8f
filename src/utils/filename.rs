use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Generate default output filename with format: estate-cleaned-{YYMMDD}.{extension}
pub fn generate_default_output_filename(extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "estate-cleaned-{:02}{:02}{:02}.{}",
        year, month, day, extension
    );
    PathBuf::from("output").join(filename)
}

/// Output format implied by a file extension, if it is one we write
pub fn format_from_extension(path: &std::path::Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => Some(super::constants::FORMAT_CSV),
        Some("parquet") | Some("pq") => Some(super::constants::FORMAT_PARQUET),
        _ => None,
    }
}
