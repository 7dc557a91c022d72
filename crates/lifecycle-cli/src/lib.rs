//! # lifecycle-cli: CLI Tool for the Lifecycle Stack
//!
//! Provides the `lifecycle` command-line interface over machines loaded
//! from YAML definitions. Without `--definition` (or a `definition` key in
//! the configuration file) the bundled escalation machine is used.
//!
//! ## Subcommands
//!
//! - `lifecycle inspect` — statuses, rules, invariant and hook counts.
//! - `lifecycle events --status <name>` — events available from a status.
//! - `lifecycle event-for --from <a> --to <b>` — reverse event lookup.
//! - `lifecycle new` — a fresh entity at the initial status.
//! - `lifecycle fire` — fire an event against an entity file.
//!
//! ```bash
//! lifecycle new --output incident.json
//! lifecycle fire --entity incident.json --event resolve --at 2026-07-04T10:00:00Z --write
//! lifecycle --format json events --status resolved
//! ```

pub mod config;
pub mod entity;
pub mod inspect;
pub mod query;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use lifecycle_core::{Clock, SystemClock};
use lifecycle_state::{AttributeMap, MachineDefinition, StateMachine, ESCALATION_DEFINITION};

use crate::config::Settings;

/// Exit code for a transition the machine refused.
pub const EXIT_REJECTED: u8 = 2;

/// Output format for query commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// A loaded machine plus the output format commands render with.
#[derive(Debug)]
pub struct Session {
    pub machine: StateMachine<AttributeMap>,
    pub format: OutputFormat,
}

impl Session {
    /// Load the machine named by `settings`, reading time from the system clock.
    pub fn open(settings: &Settings) -> Result<Self> {
        Self::open_with_clock(settings, Arc::new(SystemClock))
    }

    /// Load the machine named by `settings` with an explicit clock.
    pub fn open_with_clock(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self> {
        let definition = load_definition(settings.definition.as_deref())?;
        let machine = definition
            .build_with_clock(clock)
            .with_context(|| format!("invalid machine definition `{}`", definition.name))?;
        tracing::info!(
            machine = %machine.name(),
            statuses = machine.registry().len(),
            rules = machine.table().len(),
            "loaded machine definition"
        );
        Ok(Self {
            machine,
            format: settings.format,
        })
    }
}

/// Read a definition file, or the bundled escalation definition if `path` is `None`.
pub fn load_definition(path: Option<&Path>) -> Result<MachineDefinition> {
    match path {
        Some(path) => MachineDefinition::from_path(path)
            .with_context(|| format!("failed to load definition {}", path.display())),
        None => {
            tracing::debug!("using bundled escalation definition");
            MachineDefinition::from_yaml(ESCALATION_DEFINITION).context("bundled escalation definition is invalid")
        }
    }
}

/// Serialize `value` as pretty JSON.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize JSON output")
}
