//! Command-line argument definitions for the coordinate normalizer
//!
//! The CLI is a thin harness over the library: `normalize` runs one pair given
//! on the command line, `batch` runs delimited lines from a file or stdin.

use crate::app::models::{CoordinateInput, SourceCrs};
use crate::constants::{DEFAULT_BATCH_DELIMITER, MIN_DOCUMENT_YEAR};
use crate::{Error, Result};
use chrono::Datelike;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the PTEL coordinate normalizer
///
/// Repairs coordinate pairs transcribed in municipal emergency-planning
/// documents and converts them to UTM zone 30N on ETRS89 (EPSG:25830).
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ptel-coords",
    version,
    about = "Normalize messy coordinate pairs to UTM30 / ETRS89 (EPSG:25830)",
    long_about = "Cleans coordinate fields transcribed by hand into municipal emergency plans: \
                  regional decimal and grouping separators, typographic artifacts, DMS and NMEA \
                  notations, swapped or truncated values and legacy datums. Every result carries \
                  an audit trail of corrections, quality flags and a 0-100 confidence score."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Normalize a single coordinate pair
    Normalize(NormalizeArgs),
    /// Normalize delimited coordinate lines from a file or stdin
    Batch(BatchArgs),
}

/// Source reference system hint accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrsHint {
    /// ETRS89 / UTM 30N
    Etrs89,
    /// Longitude / latitude degrees
    Geographic,
    /// ED50 / UTM 30N
    Ed50,
    /// Madrid datum planar values
    Madrid,
    /// Spanish Lambert Conformal Conic grid
    Lambert,
}

impl From<CrsHint> for SourceCrs {
    fn from(hint: CrsHint) -> Self {
        match hint {
            CrsHint::Etrs89 => SourceCrs::Etrs89Utm30,
            CrsHint::Geographic => SourceCrs::Geographic,
            CrsHint::Ed50 => SourceCrs::Ed50Utm30,
            CrsHint::Madrid => SourceCrs::MadridDatum,
            CrsHint::Lambert => SourceCrs::LambertSpain,
        }
    }
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// One JSON document per result
    Json,
}

/// Arguments for the normalize command
#[derive(Debug, Clone, Parser)]
pub struct NormalizeArgs {
    /// Easting (X) field exactly as transcribed
    #[arg(value_name = "X", allow_negative_numbers = true)]
    pub x: Option<String>,

    /// Northing (Y) field exactly as transcribed
    #[arg(value_name = "Y", allow_negative_numbers = true)]
    pub y: Option<String>,

    /// Free text that may hold a full pair (WKT, GeoJSON, NMEA, "X: .. Y: ..")
    #[arg(long = "raw-text", value_name = "TEXT")]
    pub raw_text: Option<String>,

    /// Municipality the coordinate belongs to
    #[arg(short = 'm', long = "municipality", value_name = "NAME")]
    pub municipality: Option<String>,

    /// Province name, used to pick the northing prefix for truncated values
    #[arg(short = 'p', long = "province", value_name = "NAME")]
    pub province: Option<String>,

    /// Year of the source document, used to select the datum
    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<i32>,

    /// Reference system the values are known to be in
    #[arg(long = "crs", value_enum, value_name = "CRS")]
    pub crs: Option<CrsHint>,

    #[command(flatten)]
    pub engine: EngineOptions,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only show warnings and errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Arguments for the batch command
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    /// Input file with one `x;y[;municipality;province;year]` line per coordinate
    ///
    /// Reads stdin when omitted. Blank lines and lines starting with `#` are skipped.
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input_path: Option<PathBuf>,

    /// Write one JSON result per line to this file
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Field delimiter of the input lines
    #[arg(short = 'd', long = "delimiter", default_value_t = DEFAULT_BATCH_DELIMITER)]
    pub delimiter: char,

    /// Output format for the summary and, without --output, the results
    #[arg(short = 'f', long = "format", value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Spread the batch across blocking worker tasks
    #[arg(long = "concurrent")]
    pub concurrent: bool,

    /// Number of workers for --concurrent (defaults to the number of CPUs)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub engine: EngineOptions,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only show warnings and errors, no progress bar
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Engine switches shared by both commands
#[derive(Debug, Clone, Default, clap::Args)]
pub struct EngineOptions {
    /// JSON configuration file (missing keys take their defaults)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Disable the heuristic rescue stage
    #[arg(long = "no-heuristics")]
    pub no_heuristics: bool,

    /// Keep ED50 / Madrid values unshifted
    #[arg(long = "no-datum-shift")]
    pub no_datum_shift: bool,
}

impl EngineOptions {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config_path {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Documents cannot be dated before the earliest survey or in the future
fn validate_year(year: Option<i32>) -> Result<()> {
    let current_year = chrono::Utc::now().year();
    match year {
        Some(year) if !(MIN_DOCUMENT_YEAR..=current_year).contains(&year) => {
            Err(Error::configuration(format!(
                "Document year {} outside {}-{}",
                year, MIN_DOCUMENT_YEAR, current_year
            )))
        }
        _ => Ok(()),
    }
}

fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Commands {
    /// Log level requested by the active subcommand
    pub fn get_log_level(&self) -> &'static str {
        match self {
            Commands::Normalize(args) => args.get_log_level(),
            Commands::Batch(args) => args.get_log_level(),
        }
    }

    pub fn is_quiet(&self) -> bool {
        match self {
            Commands::Normalize(args) => args.quiet,
            Commands::Batch(args) => args.quiet,
        }
    }
}

impl NormalizeArgs {
    /// Validate the normalize arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.x.is_none() && self.y.is_none() && self.raw_text.is_none() {
            return Err(Error::configuration(
                "Nothing to normalize: give X and Y or --raw-text",
            ));
        }
        validate_year(self.year)?;
        self.engine.validate()
    }

    /// Build the library input from the arguments
    pub fn to_input(&self) -> CoordinateInput {
        let mut input = CoordinateInput {
            x: self.x.clone().map(Into::into),
            y: self.y.clone().map(Into::into),
            ..CoordinateInput::default()
        };
        if let Some(text) = &self.raw_text {
            input = input.with_raw_text(text.clone());
        }
        if let Some(municipality) = &self.municipality {
            input = input.with_municipality(municipality.clone());
        }
        if let Some(province) = &self.province {
            input = input.with_province(province.clone());
        }
        if let Some(year) = self.year {
            input = input.with_document_year(year);
        }
        if let Some(crs) = self.crs {
            input = input.with_crs_hint(crs.into());
        }
        input
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }
}

impl BatchArgs {
    /// Validate the batch arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.input_path {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "Input file does not exist: {}",
                    path.display()
                )));
            }
        }

        // The delimiter must not collide with decimal or grouping separators
        if self.delimiter.is_alphanumeric() || matches!(self.delimiter, '.' | ',' | ' ' | '-') {
            return Err(Error::configuration(format!(
                "Delimiter '{}' would split coordinate values",
                self.delimiter
            )));
        }

        if self.workers == Some(0) {
            return Err(Error::configuration("Workers must be greater than 0"));
        }

        self.engine.validate()
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
