//! Command implementations for the coordinate normalizer CLI
//!
//! This module contains the command execution logic, batch input parsing,
//! progress reporting and result printing for the CLI interface.

use crate::app::models::{Confidence, CoordinateInput, NormalizationResult, Severity};
use crate::app::services::normalizer::{BatchStats, CoordinateNormalizer};
use crate::cli::args::{Args, BatchArgs, Commands, EngineOptions, NormalizeArgs, OutputFormat};
use crate::config::NormalizerConfig;
use crate::{Error, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::task;
use tracing::{debug, info};

/// Interval at which the concurrent batch progress counter is polled
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main command runner
///
/// Sets up logging, validates the arguments, then dispatches to the selected
/// subcommand. Returns the statistics of everything that was normalized.
pub async fn run(args: Args) -> Result<BatchStats> {
    let command = args
        .command
        .ok_or_else(|| Error::configuration("No command given"))?;

    setup_logging(&command)?;
    debug!("Command line arguments: {:?}", command);

    match command {
        Commands::Normalize(args) => run_normalize(args).await,
        Commands::Batch(args) => run_batch(args).await,
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(command: &Commands) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = command.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ptel_coords={}", log_level)));

    if command.is_quiet() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Build the engine configuration: file (if any), then CLI switches
pub fn load_configuration(
    engine: &EngineOptions,
    workers: Option<usize>,
) -> Result<NormalizerConfig> {
    let mut config = match &engine.config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            NormalizerConfig::from_file(path)?
        }
        None => NormalizerConfig::default(),
    };

    if engine.no_heuristics {
        config = config.without_heuristics();
    }
    if engine.no_datum_shift {
        config = config.without_datum_shift();
    }
    if let Some(workers) = workers {
        config = config.with_workers(workers);
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

async fn run_normalize(args: NormalizeArgs) -> Result<BatchStats> {
    args.validate()?;
    let config = load_configuration(&args.engine, None)?;
    let normalizer = CoordinateNormalizer::new(config);

    let result = normalizer.normalize(&args.to_input());
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Human => print_result(&result),
    }

    Ok(BatchStats::from_results(std::slice::from_ref(&result)))
}

async fn run_batch(args: BatchArgs) -> Result<BatchStats> {
    let start_time = Instant::now();
    args.validate()?;
    let config = load_configuration(&args.engine, args.workers)?;
    let normalizer = CoordinateNormalizer::new(config);

    let text = read_input(args.input_path.as_deref()).await?;
    let inputs = parse_batch_lines(&text, args.delimiter)?;
    info!("Read {} coordinate lines", inputs.len());

    let progress_bar = if args.show_progress() && !inputs.is_empty() {
        Some(create_progress_bar(inputs.len() as u64, "Normalizing"))
    } else {
        None
    };

    let results = if args.concurrent {
        normalize_concurrent(&normalizer, inputs, progress_bar.clone()).await?
    } else {
        normalize_sequential(&normalizer, inputs, progress_bar.clone()).await?
    };

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Done");
    }

    match &args.output_path {
        Some(path) => write_json_lines(path, &results).await?,
        None if args.format == OutputFormat::Json => {
            for result in &results {
                println!("{}", serde_json::to_string(result)?);
            }
        }
        None => {}
    }

    let stats = BatchStats::from_results(&results);
    match args.format {
        OutputFormat::Json if args.output_path.is_some() => {
            println!("{}", serde_json::to_string_pretty(&stats)?)
        }
        OutputFormat::Json => {}
        OutputFormat::Human => print_batch_summary(&stats, start_time.elapsed()),
    }

    Ok(stats)
}

async fn normalize_sequential(
    normalizer: &CoordinateNormalizer,
    inputs: Vec<CoordinateInput>,
    progress_bar: Option<ProgressBar>,
) -> Result<Vec<NormalizationResult>> {
    let normalizer = normalizer.clone();
    task::spawn_blocking(move || {
        let mut on_progress = |done: usize, _total: usize| {
            if let Some(pb) = &progress_bar {
                pb.set_position(done as u64);
            }
        };
        normalizer.normalize_batch(&inputs, Some(&mut on_progress))
    })
    .await
    .map_err(|e| Error::batch_task(format!("Sequential batch failed: {}", e)))
}

async fn normalize_concurrent(
    normalizer: &CoordinateNormalizer,
    inputs: Vec<CoordinateInput>,
    progress_bar: Option<ProgressBar>,
) -> Result<Vec<NormalizationResult>> {
    let counter = Arc::new(AtomicUsize::new(0));

    let ticker = progress_bar.map(|pb| {
        let counter = Arc::clone(&counter);
        tokio::spawn(async move {
            loop {
                pb.set_position(counter.load(Ordering::Relaxed) as u64);
                tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
            }
        })
    });

    let results = normalizer
        .normalize_batch_concurrent(inputs, Some(Arc::clone(&counter)))
        .await;

    if let Some(handle) = ticker {
        handle.abort();
    }
    results
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e)),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .map_err(|e| Error::io("Failed to read stdin", e))?;
            Ok(text)
        }
    }
}

/// Parse batch lines of the form `x;y[;municipality;province;year]`
///
/// Blank lines and `#` comments are skipped. An empty trailing field is
/// treated as absent.
///
/// # Errors
///
/// Returns [`Error::InputParsing`] for a line with fewer than two fields or an
/// unparseable year.
pub fn parse_batch_lines(text: &str, delimiter: char) -> Result<Vec<CoordinateInput>> {
    let mut inputs = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() < 2 {
            return Err(Error::input_parsing(
                line_number,
                format!("expected at least x{}y", delimiter),
            ));
        }

        let optional = |position: usize| {
            fields
                .get(position)
                .map(|field| field.trim())
                .filter(|field| !field.is_empty())
        };

        let mut input = CoordinateInput::new(fields[0], fields[1]);
        if let Some(municipality) = optional(2) {
            input = input.with_municipality(municipality);
        }
        if let Some(province) = optional(3) {
            input = input.with_province(province);
        }
        if let Some(year) = optional(4) {
            let year = year.parse::<i32>().map_err(|_| {
                Error::input_parsing(line_number, format!("invalid document year '{}'", year))
            })?;
            input = input.with_document_year(year);
        }
        inputs.push(input);
    }

    Ok(inputs)
}

async fn write_json_lines(path: &Path, results: &[NormalizationResult]) -> Result<()> {
    let mut body = String::new();
    for result in results {
        body.push_str(&serde_json::to_string(result)?);
        body.push('\n');
    }
    tokio::fs::write(path, body)
        .await
        .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
    info!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}

/// Create a progress bar with the CLI's standard style
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

fn colored_confidence(confidence: Confidence) -> ColoredString {
    let label = confidence.to_string();
    match confidence {
        Confidence::High => label.bright_green().bold(),
        Confidence::Medium => label.bright_yellow().bold(),
        Confidence::Low => label.yellow(),
        Confidence::Critical => label.bright_red().bold(),
    }
}

fn print_result(result: &NormalizationResult) {
    match result.coordinates() {
        Some((x, y)) => println!(
            "{} X={} Y={}",
            "EPSG:25830".bright_green().bold(),
            format!("{:.3}", x).bright_white().bold(),
            format!("{:.3}", y).bright_white().bold()
        ),
        None => println!("{}", "No coordinates".bright_red().bold()),
    }

    println!(
        "  Score: {} ({}) {}",
        result.score.to_string().bright_white().bold(),
        colored_confidence(result.confidence),
        if result.is_valid {
            "valid".green()
        } else {
            "invalid".red()
        }
    );
    if let Some(format) = result.source_format {
        println!("  Format: {:?}", format);
    }
    if let Some(crs) = result.source_crs {
        println!("  Source CRS: {:?}", crs);
    }
    if let Some(reference) = &result.cadastral_ref {
        println!("  Cadastral reference: {}", reference.bright_cyan());
    }
    if let Some(toponym) = &result.toponym {
        println!("  Place name: {}", toponym.bright_cyan());
    }

    for correction in &result.corrections {
        println!(
            "  {} {:?} [{}] {} '{}' -> '{}'",
            "fix".bright_yellow(),
            correction.correction_type,
            correction.field,
            correction.pattern,
            correction.from,
            correction.to
        );
    }
    for flag in &result.flags {
        let label = match flag.severity {
            Severity::Error => "error".bright_red(),
            Severity::Warning => "warn".yellow(),
            Severity::Info => "info".cyan(),
        };
        println!("  {} {:?}: {}", label, flag.flag_type, flag.message);
    }
}

fn print_batch_summary(stats: &BatchStats, elapsed: Duration) {
    println!("\n{}", "Normalization Summary".bright_green().bold());
    println!(
        "  Coordinates: {} ({} valid, {} invalid, {:.1}% valid)",
        stats.total.to_string().bright_white().bold(),
        stats.valid.to_string().bright_green(),
        stats.invalid.to_string().bright_red(),
        stats.valid_rate()
    );
    println!(
        "  Confidence: {} {} / {} {} / {} {} / {} {}",
        colored_confidence(Confidence::High),
        stats.confidence_count(Confidence::High),
        colored_confidence(Confidence::Medium),
        stats.confidence_count(Confidence::Medium),
        colored_confidence(Confidence::Low),
        stats.confidence_count(Confidence::Low),
        colored_confidence(Confidence::Critical),
        stats.confidence_count(Confidence::Critical)
    );
    println!(
        "  Placeholders: {}  Needs geocoding: {}  Rescued: {}",
        stats.placeholders, stats.needs_geocoding, stats.heuristic_rescues
    );
    println!("  Average score: {:.1}", stats.average_score);

    let mut corrections: Vec<_> = stats
        .by_correction
        .iter()
        .map(|(correction_type, count)| (format!("{:?}", correction_type), *count))
        .collect();
    corrections.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (correction_type, count) in corrections {
        println!("    {}: {}", correction_type, count);
    }

    println!("  Elapsed: {}", HumanDuration(elapsed));
}
