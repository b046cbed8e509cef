use clap::Parser;
use ptel_coords::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(ptel_coords::Error::processing_interrupted(
                    "Normalization interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(_stats) => {
            // Success - results and summary have already been printed
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", anyhow::Error::new(error));
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("PTEL Coordinate Normalizer - UTM30 / ETRS89 (EPSG:25830)");
    println!("=========================================================");
    println!();
    println!("Repair coordinate pairs transcribed in municipal emergency plans and");
    println!("convert them to UTM zone 30N, with an audit trail and confidence score.");
    println!();
    println!("USAGE:");
    println!("    ptel-coords <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    normalize   Normalize a single coordinate pair");
    println!("    batch       Normalize x;y[;municipality;province;year] lines");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Repair a pair with typographic artifacts:");
    println!("    ptel-coords normalize \"504 750´´92\" \"4 077 153´´36\"");
    println!();
    println!("    # A 1990 document in ED50, as JSON:");
    println!("    ptel-coords normalize 504750.5 4077905.5 --year 1990 --format json");
    println!();
    println!("    # Normalize a file concurrently and keep every result:");
    println!("    ptel-coords batch -i coords.txt -o results.jsonl --concurrent");
    println!();
    println!("For detailed help on any command, use:");
    println!("    ptel-coords <COMMAND> --help");
}
