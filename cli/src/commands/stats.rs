// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use colored::Colorize;

use crate::daemon::{connect, Endpoint};

pub async fn handle_command(endpoint: &Endpoint) -> Result<()> {
    let Some(client) = connect(endpoint).await? else {
        return Ok(());
    };

    let stats = client.stats().await?;

    println!("{}", "AgentHub statistics:".bold());
    println!("  Deployed agents:   {}", stats.total_deployed);
    println!("  Running instances: {}", stats.running_instances);
    println!(
        "  Active workflows:  {} / {}",
        stats.active_workflows, stats.total_workflows
    );
    println!("  Uptime:            {:.1}%", stats.uptime);

    Ok(())
}
