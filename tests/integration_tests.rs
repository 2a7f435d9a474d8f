use clap::Parser;
use estate_cleanser::cli::{run, Cli};
use estate_cleanser::config::{CleansingConfig, DatasetSettings};
use estate_cleanser::models::{
    Gazetteer, GazetteerEntry, LocatedRecord, Location, NormalizedRecord,
};
use estate_cleanser::processors::{CleansingPipeline, LocationImputer};
use estate_cleanser::writers::ParquetWriter;
use estate_cleanser::CleansingError;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const GAZETTEER: &str = "\
Locality,latitude,longitude
Athens,37.98,23.73
Piraeus,37.94,23.65
Glyfada,37.86,23.75
";

const LISTINGS: &str = "\
id,price,latitude,longitude,location
1,150000,37.98,23.73,-
2,210000,,,Glyfada
3,90000,,,-
4,130000,\"37,94\",-2365000000,
5,175000,37.98,23.73,Kifisia
6,80000,38.5,22.1,-
";

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

#[tokio::test]
async fn test_pipeline_from_files() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let listings = write_fixture(temp_dir.path(), "listings.csv", LISTINGS);
    let gazetteer = write_fixture(temp_dir.path(), "mapping.csv", GAZETTEER);

    let output = CleansingPipeline::default()
        .run(&listings, &gazetteer, None)
        .await?;

    let rows: Vec<(String, f64, f64, String)> = output
        .records
        .iter()
        .map(|r| {
            (
                r.attribute("id").unwrap_or_default().to_string(),
                r.latitude,
                r.longitude,
                r.location.to_string(),
            )
        })
        .collect();

    assert_eq!(
        rows,
        vec![
            // Name recovered from coordinates
            ("1".to_string(), 37.98, 23.73, "Athens".to_string()),
            // Coordinates recovered from name
            ("2".to_string(), 37.86, 23.75, "Glyfada".to_string()),
            // Nothing to go on
            ("3".to_string(), 0.0, 0.0, "No location".to_string()),
            // Repaired longitude, decimal comma, then resolved
            ("4".to_string(), 37.94, 23.65, "Piraeus".to_string()),
            // A known name is never overwritten
            ("5".to_string(), 37.98, 23.73, "Kifisia".to_string()),
            // Coordinates outside the gazetteer stay unresolved
            ("6".to_string(), 38.5, 22.1, "-".to_string()),
        ]
    );

    // Row count and column order survive the run
    assert_eq!(output.records.len(), 6);
    assert_eq!(
        output.layout.headers,
        vec!["id", "price", "latitude", "longitude", "location"]
    );

    let report = &output.report;
    assert_eq!(report.longitude.repaired, 1);
    assert_eq!(report.names.resolved, 2);
    assert_eq!(report.names.no_location, 1);
    assert_eq!(report.names.unresolved, 1);
    assert_eq!(report.coordinates.unmatched_names, 1);
    assert_eq!(report.final_incomplete_coordinates, 1);
    Ok(())
}

#[test]
fn test_stage_order_matters() {
    // Two rows share a name; the coordinate index finds the second, the name
    // index returns the first.
    let gazetteer = Gazetteer::from_entries(
        vec![
            GazetteerEntry::new("Elliniko", 37.89, 23.74),
            GazetteerEntry::new("Elliniko", 37.88, 0.0),
        ],
        5,
    );
    let imputer = LocationImputer::new(&gazetteer);
    let record = NormalizedRecord::new(37.88, 0.0, Some("-"));

    let located = imputer.resolve_names(vec![record.clone()]);
    let resolved = imputer.resolve_coordinates(located.records);
    let done = &resolved.records[0];
    assert_eq!(done.location, Location::Named("Elliniko".to_string()));
    assert_eq!((done.latitude, done.longitude), (37.88, 23.74));

    // Skipping Stage 1 leaves nothing for Stage 2 to work with
    let skipped = imputer.resolve_coordinates(vec![LocatedRecord::from_own_fields(record)]);
    let done = &skipped.records[0];
    assert_eq!(done.location, Location::Unresolved);
    assert_eq!((done.latitude, done.longitude), (37.88, 0.0));
}

#[tokio::test]
async fn test_row_count_preserved_across_chunks() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let mut listings = String::from("latitude,longitude,location\n");
    for i in 0..2_500 {
        match i % 3 {
            0 => listings.push_str("37.98,23.73,-\n"),
            1 => listings.push_str(",,Piraeus\n"),
            _ => listings.push_str(",,\n"),
        }
    }
    let listings = write_fixture(temp_dir.path(), "listings.csv", &listings);
    let gazetteer = write_fixture(temp_dir.path(), "mapping.csv", GAZETTEER);

    let output = CleansingPipeline::default()
        .with_chunk_size(333)
        .with_max_workers(2)
        .run(&listings, &gazetteer, None)
        .await?;

    assert_eq!(output.records.len(), 2_500);
    assert_eq!(output.report.names.resolved, 834);
    assert_eq!(output.report.names.kept, 833);
    assert_eq!(output.report.names.no_location, 833);
    assert_eq!(output.records[1].location, Location::Named("Piraeus".to_string()));
    assert_eq!(output.records[1].latitude, 37.94);
    Ok(())
}

#[tokio::test]
async fn test_bad_gazetteer_aborts_run() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let listings = write_fixture(temp_dir.path(), "listings.csv", LISTINGS);
    let gazetteer = write_fixture(
        temp_dir.path(),
        "mapping.csv",
        "Locality,latitude,longitude\nAthens,,23.73\n",
    );

    let result = CleansingPipeline::default()
        .run(&listings, &gazetteer, None)
        .await;

    assert!(matches!(result, Err(CleansingError::GazetteerLoad(_))));
    Ok(())
}

#[tokio::test]
async fn test_cli_clean_to_parquet() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let listings = write_fixture(temp_dir.path(), "listings.csv", LISTINGS);
    let gazetteer = write_fixture(temp_dir.path(), "mapping.csv", GAZETTEER);
    let output = temp_dir.path().join("out").join("cleaned.parquet");
    let report = temp_dir.path().join("report.json");

    let cli = Cli::try_parse_from([
        "estate-cleanser",
        "clean",
        "--input",
        arg(&listings),
        "--gazetteer",
        arg(&gazetteer),
        "--output",
        arg(&output),
        "--compression",
        "zstd",
        "--row-group-size",
        "4",
        "--report-json",
        arg(&report),
    ])
    .expect("arguments should parse");
    run(cli).await?;

    let writer = ParquetWriter::new();
    let info = writer.get_file_info(&output)?;
    assert_eq!(info.total_rows, 6);
    assert_eq!(info.row_groups, 2);

    let samples = writer.read_sample_records(&output, &DatasetSettings::default(), 3)?;
    let locations: Vec<&str> = samples.iter().map(|s| s.location.as_str()).collect();
    assert_eq!(locations, vec!["Athens", "Glyfada", "No location"]);

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(report["total_records"], 6);

    let cli = Cli::try_parse_from([
        "estate-cleanser",
        "info",
        "--file",
        arg(&output),
        "--sample",
        "2",
    ])
    .expect("arguments should parse");
    run(cli).await?;
    Ok(())
}

#[tokio::test]
async fn test_cli_clean_to_csv_with_settings_file() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let listings = write_fixture(
        temp_dir.path(),
        "listings.csv",
        "lat;lng;area;type\n37,98;23,73;-;Apartment in center\n;;Piraeus;VILLA\n",
    );
    let gazetteer = write_fixture(temp_dir.path(), "mapping.csv", GAZETTEER);
    let settings = write_fixture(
        temp_dir.path(),
        "settings.toml",
        "[dataset]\nlatitude = \"lat\"\nlongitude = \"lng\"\nlocation = \"area\"\ndelimiter = \";\"\n\n\
         [attributes]\nproperty_type = \"type\"\n",
    );
    let output = temp_dir.path().join("cleaned.csv");

    let cli = Cli::try_parse_from([
        "estate-cleanser",
        "--config",
        arg(&settings),
        "clean",
        "--input",
        arg(&listings),
        "--gazetteer",
        arg(&gazetteer),
        "--output",
        arg(&output),
    ])
    .expect("arguments should parse");
    run(cli).await?;

    assert_eq!(
        fs::read_to_string(&output)?,
        "lat;lng;area;type\n\
         37.98;23.73;Athens;Apartment\n\
         37.94;23.65;Piraeus;Villa\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_cli_validate_only_writes_nothing() -> estate_cleanser::Result<()> {
    let temp_dir = TempDir::new()?;
    let listings = write_fixture(temp_dir.path(), "listings.csv", LISTINGS);
    let gazetteer = write_fixture(temp_dir.path(), "mapping.csv", GAZETTEER);
    let output = temp_dir.path().join("never.csv");

    let cli = Cli::try_parse_from([
        "estate-cleanser",
        "clean",
        "--input",
        arg(&listings),
        "--gazetteer",
        arg(&gazetteer),
        "--output",
        arg(&output),
        "--validate-only",
    ])
    .expect("arguments should parse");
    run(cli).await?;

    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_default_config_is_valid() {
    let config = CleansingConfig::default();
    assert!(config.check().is_ok());
}
