//! # strel CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use strel_cli::models::{run_models, ModelsArgs};
use strel_cli::validate::{run_validate, ValidateArgs};

/// Structured-element validation
///
/// Validates JSON and YAML documents against models defined in a
/// declarative definition document.
#[derive(Parser, Debug)]
#[command(name = "strel", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit validator diagnostics (malformed expectations, unsalvageable
    /// fields) as debug log events.
    #[arg(long, global = true)]
    debug: bool,

    /// Log as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate documents against a model.
    Validate(ValidateArgs),

    /// List defined models and check their references.
    Models(ModelsArgs),
}

fn filter(verbose: u8, debug: bool) -> EnvFilter {
    let base = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    if debug && verbose < 2 {
        EnvFilter::new(format!("{base},strel_schema=debug"))
    } else {
        EnvFilter::new(base)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter(cli.verbose, cli.debug))
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "strel starting");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, cli.debug),
        Commands::Models(args) => run_models(&args, cli.debug),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
