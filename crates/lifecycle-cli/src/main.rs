//! # lifecycle CLI entry point
//!
//! Parses command-line arguments, resolves settings and the machine
//! definition, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lifecycle_cli::config::Settings;
use lifecycle_cli::entity::{run_fire, run_new, FireArgs, NewArgs};
use lifecycle_cli::inspect::{run_inspect, InspectArgs};
use lifecycle_cli::query::{run_event_for, run_events, EventForArgs, EventsArgs};
use lifecycle_cli::{OutputFormat, Session};

/// Lifecycle state machine CLI
///
/// Inspects status machines defined in YAML, answers which events are
/// available, and fires events against entities stored as JSON files.
#[derive(Parser, Debug)]
#[command(name = "lifecycle", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Machine definition (YAML). Defaults to the bundled escalation machine.
    #[arg(long, global = true)]
    definition: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print statuses, transition rules, and invariant and hook counts.
    Inspect(InspectArgs),

    /// List events available from a status.
    Events(EventsArgs),

    /// Find the event that moves one status to another.
    EventFor(EventForArgs),

    /// Create an entity at the initial status.
    New(NewArgs),

    /// Fire an event against an entity file.
    Fire(FireArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("lifecycle CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = Settings::resolve(cli.config.as_deref(), cli.definition.as_deref(), cli.format)
        .and_then(|settings| Session::open(&settings))
        .and_then(|session| match &cli.command {
            Commands::Inspect(args) => run_inspect(args, &session),
            Commands::Events(args) => run_events(args, &session),
            Commands::EventFor(args) => run_event_for(args, &session),
            Commands::New(args) => run_new(args, &session),
            Commands::Fire(args) => run_fire(args, &session),
        });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
