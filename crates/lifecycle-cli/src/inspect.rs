//! # Inspect Subcommand
//!
//! Prints the loaded machine: its statuses with ordinals, transition rules,
//! and how many invariants and hooks are attached.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::{to_json, OutputFormat, Session};

/// Arguments for the `lifecycle inspect` subcommand.
#[derive(Args, Debug, Default)]
pub struct InspectArgs {
    /// Also list the invariant messages registered per status.
    #[arg(long)]
    pub invariants: bool,
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs, session: &Session) -> Result<u8> {
    println!("{}", render_inspect(args, session)?);
    Ok(0)
}

/// Render the machine summary in the session's format.
pub fn render_inspect(args: &InspectArgs, session: &Session) -> Result<String> {
    let machine = &session.machine;
    let initial = machine.initial_status().map(|s| s.name().as_str());

    match session.format {
        OutputFormat::Json => {
            let statuses: Vec<_> = machine
                .all_statuses()
                .map(|status| {
                    let mut entry = json!({
                        "name": status.name(),
                        "ordinal": status.ordinal(),
                    });
                    if args.invariants {
                        let messages: Vec<&str> =
                            machine.guards().invariants_for(status).map(|i| i.message()).collect();
                        entry["invariants"] = json!(messages);
                    }
                    entry
                })
                .collect();
            let transitions: Vec<_> = machine
                .table()
                .rules()
                .map(|rule| {
                    json!({
                        "event": rule.event,
                        "from": rule.from.to_string(),
                        "to": rule.to.name(),
                    })
                })
                .collect();
            to_json(&json!({
                "name": machine.name(),
                "initial": initial,
                "statuses": statuses,
                "transitions": transitions,
                "invariants": machine.guards().len(),
                "hooks": machine.hooks().len(),
            }))
        }
        OutputFormat::Text => {
            let mut out = Vec::new();
            out.push(format!("Machine: {}", machine.name()));
            out.push(format!("  Initial: {}", initial.unwrap_or("(none)")));
            out.push(format!("  Statuses ({}):", machine.registry().len()));
            for status in machine.all_statuses() {
                out.push(format!("    {:>3}  {}", status.ordinal(), status.name()));
                if args.invariants {
                    for invariant in machine.guards().invariants_for(status) {
                        out.push(format!("           requires: {}", invariant.message()));
                    }
                }
            }
            out.push(format!("  Transitions ({}):", machine.table().len()));
            for rule in machine.table().rules() {
                out.push(format!("    {}: {} -> {}", rule.event, rule.from, rule.to.name()));
            }
            out.push(format!("  Invariants: {}", machine.guards().len()));
            out.push(format!("  Hooks: {}", machine.hooks().len()));
            Ok(out.join("\n"))
        }
    }
}
