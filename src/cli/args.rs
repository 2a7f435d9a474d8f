use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::utils::constants::{DEFAULT_ROW_GROUP_SIZE, FORMAT_CSV, FORMAT_PARQUET};

#[derive(Parser)]
#[command(name = "estate-cleanser")]
#[command(about = "Coordinate repair and location imputation for real-estate listings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (TOML, JSON or YAML)")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => FORMAT_CSV,
            OutputFormat::Parquet => FORMAT_PARQUET,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Repair coordinates and impute locations against a gazetteer
    Clean {
        #[arg(short, long, help = "Listings dataset (delimited text)")]
        input: PathBuf,

        #[arg(short, long, help = "Gazetteer CSV mapping locality names to coordinates")]
        gazetteer: PathBuf,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/estate-cleaned-{YYMMDD}.{csv|parquet}]"
        )]
        output: Option<PathBuf>,

        #[arg(long, value_enum, help = "Output format [default: from extension, else csv]")]
        format: Option<OutputFormat>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_ROW_GROUP_SIZE, help = "Maximum rows per Parquet row group")]
        row_group_size: usize,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long, help = "Fail on unparseable coordinates instead of defaulting them")]
        strict: bool,

        #[arg(long, help = "Write the run report as JSON")]
        report_json: Option<PathBuf>,

        #[arg(long, default_value = "false")]
        validate_only: bool,
    },

    /// Run the coordinate parser and repair on a single raw value
    FixCoordinate {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Display information about a cleaned Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}
