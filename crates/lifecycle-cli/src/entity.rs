//! # Entity Subcommands
//!
//! `new` creates an entity at the machine's initial status. `fire` loads an
//! entity from a JSON file, fires one event, and prints or writes back the
//! successor. A rejected transition leaves the file untouched and exits
//! with [`EXIT_REJECTED`].

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use lifecycle_core::Timestamp;
use lifecycle_state::{AttributeMap, Entity, TransitionArgs, TransitionError};

use crate::{to_json, OutputFormat, Session, EXIT_REJECTED};

/// An entity of a definition-driven machine.
pub type DynEntity = Entity<AttributeMap>;

/// Arguments for the `lifecycle new` subcommand.
#[derive(Args, Debug, Default)]
pub struct NewArgs {
    /// Initial fields as a JSON object.
    #[arg(long)]
    pub fields: Option<String>,

    /// Write the entity to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `lifecycle fire` subcommand.
#[derive(Args, Debug)]
pub struct FireArgs {
    /// Entity JSON file.
    #[arg(long)]
    pub entity: PathBuf,

    /// Event to fire.
    #[arg(long)]
    pub event: String,

    /// Timestamp argument passed to hooks (RFC 3339).
    #[arg(long)]
    pub at: Option<String>,

    /// Write the successor back to the entity file.
    #[arg(long)]
    pub write: bool,
}

/// Execute the new subcommand.
pub fn run_new(args: &NewArgs, session: &Session) -> Result<u8> {
    let entity = create_entity(args, session)?;
    match &args.output {
        Some(path) => {
            save_entity(path, &entity)?;
            println!(
                "OK: created {} in status {} at {}",
                entity.id(),
                entity.status().name(),
                path.display()
            );
        }
        None => println!("{}", to_json(&entity)?),
    }
    Ok(0)
}

/// Build a new entity, checking its fields against the initial status.
pub fn create_entity(args: &NewArgs, session: &Session) -> Result<DynEntity> {
    let fields: AttributeMap = match &args.fields {
        Some(json) => serde_json::from_str(json).context("--fields must be a JSON object")?,
        None => AttributeMap::new(),
    };
    let entity = session
        .machine
        .new_entity(fields)
        .context("machine has no initial status")?;
    if let Err(errors) = session.machine.validate(entity.fields(), entity.status()) {
        bail!(
            "fields are not valid for initial status {}: {errors}",
            entity.status().name()
        );
    }
    tracing::debug!(entity = %entity.id(), status = %entity.status(), "created entity");
    Ok(entity)
}

/// Outcome of firing an event from the command line.
#[derive(Debug)]
pub enum FireOutcome {
    /// The transition committed.
    Committed(DynEntity),
    /// The machine refused the event.
    Rejected(TransitionError),
}

/// Execute the fire subcommand.
pub fn run_fire(args: &FireArgs, session: &Session) -> Result<u8> {
    let before = load_entity(&args.entity, session)?;
    match fire_event(args, session, &before)? {
        FireOutcome::Committed(after) => {
            if args.write {
                save_entity(&args.entity, &after)?;
            }
            match session.format {
                OutputFormat::Json => println!("{}", to_json(&after)?),
                OutputFormat::Text => println!(
                    "OK: {} {}: {} -> {}",
                    after.id(),
                    args.event,
                    before.status().name(),
                    after.status().name()
                ),
            }
            Ok(0)
        }
        FireOutcome::Rejected(err) => {
            eprintln!("REJECTED: {err}");
            Ok(EXIT_REJECTED)
        }
    }
}

/// Fire `args.event` on `entity`.
///
/// Only malformed input is an `Err`; a refused transition is an outcome.
pub fn fire_event(args: &FireArgs, session: &Session, entity: &DynEntity) -> Result<FireOutcome> {
    let mut transition_args = TransitionArgs::none();
    if let Some(at) = &args.at {
        let at = Timestamp::parse_lenient(at).with_context(|| format!("invalid --at timestamp `{at}`"))?;
        transition_args = transition_args.with(at);
    }

    Ok(match session.machine.fire(entity, &args.event, &transition_args) {
        Ok(next) => FireOutcome::Committed(next),
        Err(err) => {
            tracing::debug!(entity = %entity.id(), event = %args.event, "transition rejected: {err}");
            FireOutcome::Rejected(err)
        }
    })
}

/// Read an entity file and check it belongs to the session's machine.
pub fn load_entity(path: &Path, session: &Session) -> Result<DynEntity> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read entity file: {}", path.display()))?;
    let entity: DynEntity =
        serde_json::from_str(&content).with_context(|| format!("invalid entity JSON in {}", path.display()))?;
    session
        .machine
        .check_entity(&entity)
        .with_context(|| format!("entity in {} does not match machine `{}`", path.display(), session.machine.name()))?;
    Ok(entity)
}

/// Write an entity as pretty JSON.
pub fn save_entity(path: &Path, entity: &DynEntity) -> Result<()> {
    let json = to_json(entity)?;
    std::fs::write(path, json + "\n").with_context(|| format!("failed to write entity file: {}", path.display()))
}
