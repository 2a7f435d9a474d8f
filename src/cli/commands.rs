use std::path::PathBuf;
use tracing::info;

use crate::cli::args::{Cli, Commands, OutputFormat};
use crate::config::{delimiter_byte, CleansingConfig};
use crate::error::{CleansingError, Result};
use crate::processors::coordinate_normalizer::render_decimal;
use crate::processors::{CellOutcome, CleansingPipeline, CoordinateProcessor};
use crate::readers::ConcurrentReader;
use crate::utils::filename::{format_from_extension, generate_default_output_filename};
use crate::utils::constants::FORMAT_PARQUET;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = CleansingConfig::load(cli.config.as_deref())?;
    // No spinner when logging to a file
    let quiet = cli.log_file.is_some();

    match cli.command {
        Commands::Clean {
            input,
            gazetteer,
            output,
            format,
            compression,
            row_group_size,
            max_workers,
            chunk_size,
            strict,
            report_json,
            validate_only,
        } => {
            if let Some(max_workers) = max_workers {
                config.processing.max_workers = max_workers;
            }
            if let Some(chunk_size) = chunk_size {
                config.processing.chunk_size = chunk_size;
            }
            if strict {
                config.processing.strict_coordinates = true;
            }
            config.check()?;

            let (output_file, format) = resolve_output(output, format);
            if row_group_size == 0 {
                return Err(CleansingError::Config(
                    "Row group size must be at least 1".to_string(),
                ));
            }
            // Fail on a bad compression name before doing any work
            let parquet_writer = ParquetWriter::new()
                .with_compression(&compression)?
                .with_row_group_size(row_group_size);

            println!("Cleaning listings...");
            println!("Input dataset: {}", input.display());
            println!("Gazetteer: {}", gazetteer.display());
            println!(
                "Workers: {}, Chunk size: {}",
                config.processing.max_workers, config.processing.chunk_size
            );

            let pipeline = CleansingPipeline::new(config);
            let reading = ProgressReporter::new_spinner("Reading dataset and gazetteer...", quiet);
            let inputs = ConcurrentReader::new(
                pipeline.config().dataset.clone(),
                pipeline.config().gazetteer.clone(),
            )
            .read_inputs(&input, &gazetteer)
            .await?;
            reading.finish_with_message(&format!("Read {} records", inputs.dataset.len()));

            // Each record advances the bar once per stage
            let total = 2 * inputs.dataset.len() as u64;
            let progress = ProgressReporter::new(total, "Cleaning dataset...", quiet);
            let cleaned = pipeline.process(inputs.dataset, &inputs.gazetteer, Some(&progress))?;

            println!("\n{}", cleaned.report.generate_summary());

            if let Some(report_path) = report_json {
                cleaned.report.write_json(&report_path)?;
                println!("Report written to {}", report_path.display());
            }

            if validate_only {
                println!("Validation complete - no output file written");
                return Ok(());
            }

            // Create output directory if it doesn't exist
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            println!(
                "Writing {} records to {}...",
                cleaned.records.len(),
                output_file.display()
            );
            match format {
                OutputFormat::Csv => {
                    CsvWriter::new()
                        .with_delimiter(delimiter_byte(&pipeline.config().dataset.delimiter)?)
                        .write_records(&cleaned.layout, &cleaned.records, &output_file)?;
                }
                OutputFormat::Parquet => {
                    parquet_writer.write_records_batched(
                        &cleaned.layout,
                        &cleaned.records,
                        &output_file,
                        pipeline.config().processing.chunk_size,
                    )?;
                    let file_info = parquet_writer.get_file_info(&output_file)?;
                    println!("\n{}", file_info.summary());
                }
            }

            info!(path = %output_file.display(), "output written");
            println!("Processing complete!");
        }

        Commands::FixCoordinate { value } => {
            println!("{}", describe_fix(&value));
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {} records):", sample);
                let records = writer.read_sample_records(&file, &config.dataset, sample)?;
                for (i, record) in records.iter().enumerate() {
                    println!(
                        "{}. {} ({}, {})",
                        i + 1,
                        record.location,
                        render_decimal(record.latitude),
                        render_decimal(record.longitude)
                    );
                }
            }
        }
    }

    Ok(())
}

/// Pick the output path and format: an explicit format wins, then the
/// extension of an explicit path, then CSV.
pub fn resolve_output(
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> (PathBuf, OutputFormat) {
    let format = format.unwrap_or_else(|| {
        match output.as_deref().and_then(format_from_extension) {
            Some(FORMAT_PARQUET) => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    });
    let path = output.unwrap_or_else(|| generate_default_output_filename(format.extension()));
    (path, format)
}

/// Human-readable account of how a single raw value is cleaned
pub fn describe_fix(raw: &str) -> String {
    match CoordinateProcessor::new().process_cell(Some(raw)) {
        CellOutcome::Clean(value) => format!("{} -> {} (unchanged)", raw, render_decimal(value)),
        CellOutcome::Repaired { original, repaired } => format!(
            "{} -> {} (repaired from {})",
            raw,
            render_decimal(repaired),
            render_decimal(original)
        ),
        CellOutcome::Missing => format!("{:?} -> 0.0 (missing)", raw),
        CellOutcome::Unparseable(_) => format!("{:?} -> 0.0 (unparseable)", raw),
    }
}
