// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agenthub events`: follow the daemon's domain event stream.

use anyhow::{Context, Result};
use colored::Colorize;

use agenthub_core::domain::workflow::WorkflowId;

use crate::daemon::client::SseFrame;
use crate::daemon::{connect, Endpoint};

pub async fn handle_command(workflow: Option<String>, endpoint: &Endpoint) -> Result<()> {
    let workflow = workflow
        .map(|raw| {
            WorkflowId::from_string(&raw).with_context(|| format!("Invalid workflow id '{}'", raw))
        })
        .transpose()?;

    let Some(client) = connect(endpoint).await? else {
        return Ok(());
    };

    match workflow {
        Some(id) => println!("{}", format!("Streaming events for workflow {}...", id).dimmed()),
        None => println!("{}", "Streaming events...".dimmed()),
    }

    client.stream_events(workflow, print_frame).await?;

    println!("{}", "Event stream closed".yellow());
    Ok(())
}

fn print_frame(frame: SseFrame) {
    let label = match frame.event.as_deref() {
        Some("deployment") => "deployment".cyan(),
        Some("workflow") => "workflow".magenta(),
        Some(other) => other.normal(),
        None => "event".normal(),
    };
    println!("[{}] {}", label, frame.data);
}
