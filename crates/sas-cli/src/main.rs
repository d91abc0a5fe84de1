//! # sasv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Logs go to stderr so stdout carries only command output.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sas_cli::barcode::{run_barcode, BarcodeArgs};
use sas_cli::config::{run_config, ConfigArgs};
use sas_cli::poll::{run_poll, PollArgs};

/// SAS validation harness.
///
/// Decodes ticket barcodes, checks validation configurations, and answers
/// long polls from a file-backed validation engine.
#[derive(Parser, Debug)]
#[command(name = "sasv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode or encode ticket barcodes.
    Barcode(BarcodeArgs),

    /// Check a validation configuration file.
    Config(ConfigArgs),

    /// Dispatch one long poll against a file-backed engine.
    Poll(PollArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let result = match cli.command {
        Commands::Barcode(args) => run_barcode(&args),
        Commands::Config(args) => run_config(&args),
        Commands::Poll(args) => run_poll(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
