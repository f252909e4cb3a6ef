// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use agenthub_core::domain::agent::Agent;

use crate::daemon::{connect, DaemonClient, Endpoint};

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// List catalog agents
    List {
        /// Only agents of this category ("All" disables the filter)
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive match on name or description
        #[arg(long)]
        search: Option<String>,
    },

    /// Deploy a catalog agent
    Deploy {
        /// Catalog agent ID (e.g. code-reviewer)
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },
}

pub async fn handle_command(command: AgentsCommand, endpoint: &Endpoint) -> Result<()> {
    let Some(client) = connect(endpoint).await? else {
        return Ok(());
    };

    match command {
        AgentsCommand::List { category, search } => {
            list_agents(category.as_deref(), search.as_deref(), client).await
        }
        AgentsCommand::Deploy { agent_id } => deploy_agent(&agent_id, client).await,
    }
}

fn price_label(agent: &Agent) -> String {
    if agent.is_free() {
        "Free".to_string()
    } else {
        format!("${}/mo", agent.price)
    }
}

async fn list_agents(
    category: Option<&str>,
    search: Option<&str>,
    client: DaemonClient,
) -> Result<()> {
    let agents = client.list_agents(category, search).await?;

    if agents.is_empty() {
        println!("{}", "No agents match".yellow());
        return Ok(());
    }

    println!("{} agents found:", agents.len());
    println!(
        "{:<22} {:<4} {:<24} {:<14} {:<8} {}",
        "ID", "", "NAME", "CATEGORY", "PRICE", "RATING"
    );

    for agent in agents {
        println!(
            "{:<22} {:<4} {:<24} {:<14} {:<8} {:.1} ({})",
            agent.id,
            agent.icon,
            agent.name.bold(),
            agent.category,
            price_label(&agent),
            agent.rating,
            agent.reviews
        );
    }

    Ok(())
}

async fn deploy_agent(agent_id: &str, client: DaemonClient) -> Result<()> {
    println!("Deploying agent: {}", agent_id.bold());

    let instance = client.deploy(agent_id).await?;

    println!(
        "{}",
        format!("✓ Agent deployed: {} ({})", instance.id, instance.status).green()
    );

    Ok(())
}
