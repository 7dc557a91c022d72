//! # Query Subcommands
//!
//! `events` lists the events an entity in a given status may fire.
//! `event-for` finds the single event that moves one status to another.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::{to_json, OutputFormat, Session};

/// Arguments for the `lifecycle events` subcommand.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Status to query from.
    #[arg(long)]
    pub status: String,
}

/// Arguments for the `lifecycle event-for` subcommand.
#[derive(Args, Debug)]
pub struct EventForArgs {
    /// Current status.
    #[arg(long)]
    pub from: String,

    /// Desired status.
    #[arg(long)]
    pub to: String,
}

/// Execute the events subcommand.
pub fn run_events(args: &EventsArgs, session: &Session) -> Result<u8> {
    println!("{}", render_events(args, session)?);
    Ok(0)
}

/// Render the events available from `args.status`.
pub fn render_events(args: &EventsArgs, session: &Session) -> Result<String> {
    let status = session
        .machine
        .status_by_name(&args.status)
        .with_context(|| format!("cannot list events for `{}`", args.status))?;
    let events = session.machine.events_available_from(status);

    match session.format {
        OutputFormat::Json => to_json(&json!({
            "status": status.name(),
            "events": events,
        })),
        OutputFormat::Text if events.is_empty() => Ok(format!("No events available from {}.", status.name())),
        OutputFormat::Text => Ok(events.iter().map(|e| e.as_str()).collect::<Vec<_>>().join("\n")),
    }
}

/// Execute the event-for subcommand.
///
/// Exits 1 when no single event connects the two statuses.
pub fn run_event_for(args: &EventForArgs, session: &Session) -> Result<u8> {
    let (rendered, found) = render_event_for(args, session)?;
    println!("{rendered}");
    Ok(if found { 0 } else { 1 })
}

/// Render the reverse lookup, and whether an event was found.
pub fn render_event_for(args: &EventForArgs, session: &Session) -> Result<(String, bool)> {
    let machine = &session.machine;
    let from = machine
        .status_by_name(&args.from)
        .with_context(|| format!("unknown source status `{}`", args.from))?;
    let to = machine
        .status_by_name(&args.to)
        .with_context(|| format!("unknown target status `{}`", args.to))?;
    let event = machine.event_for(from, to);

    let rendered = match (session.format, event) {
        (OutputFormat::Json, _) => to_json(&json!({
            "from": from.name(),
            "to": to.name(),
            "event": event,
        }))?,
        (OutputFormat::Text, Some(event)) => event.to_string(),
        (OutputFormat::Text, None) => format!("No event moves {} to {}.", from.name(), to.name()),
    };
    Ok((rendered, event.is_some()))
}
