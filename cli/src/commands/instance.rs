// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployed instance commands
//!
//! Commands: list, start, stop, remove

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use agenthub_core::domain::deployment::{InstanceId, InstanceStatus};

use crate::daemon::{connect, DaemonClient, Endpoint};

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// List deployed instances
    List,

    /// Mark an instance running
    Start {
        #[arg(value_name = "INSTANCE_ID")]
        instance_id: Uuid,
    },

    /// Mark an instance stopped (its workflow nodes stay in place)
    Stop {
        #[arg(value_name = "INSTANCE_ID")]
        instance_id: Uuid,
    },

    /// Remove an instance and detach it from every workflow
    Remove {
        #[arg(value_name = "INSTANCE_ID")]
        instance_id: Uuid,
    },
}

pub async fn handle_command(command: InstanceCommand, endpoint: &Endpoint) -> Result<()> {
    let Some(client) = connect(endpoint).await? else {
        return Ok(());
    };

    match command {
        InstanceCommand::List => list_instances(client).await,
        InstanceCommand::Start { instance_id } => {
            set_status(InstanceId(instance_id), InstanceStatus::Running, client).await
        }
        InstanceCommand::Stop { instance_id } => {
            set_status(InstanceId(instance_id), InstanceStatus::Stopped, client).await
        }
        InstanceCommand::Remove { instance_id } => {
            remove_instance(InstanceId(instance_id), client).await
        }
    }
}

async fn list_instances(client: DaemonClient) -> Result<()> {
    let instances = client.list_deployed().await?;

    if instances.is_empty() {
        println!("{}", "No agents deployed".yellow());
        return Ok(());
    }

    println!(
        "{:<38} {:<24} {:<10} {}",
        "ID", "AGENT", "STATUS", "DEPLOYED"
    );

    for view in instances {
        let agent = match &view.agent {
            Some(agent) => format!("{} {}", agent.icon, agent.name),
            None => view.instance.agent_id.to_string(),
        };
        let status = match view.instance.status {
            InstanceStatus::Running => view.instance.status.to_string().green(),
            InstanceStatus::Stopped => view.instance.status.to_string().red(),
        };
        println!(
            "{:<38} {:<24} {:<10} {}",
            view.instance.id,
            agent,
            status,
            view.instance.deployed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

async fn set_status(id: InstanceId, status: InstanceStatus, client: DaemonClient) -> Result<()> {
    let instance = client.set_instance_status(id, status).await?;
    println!(
        "{}",
        format!("✓ Instance {} is {}", instance.id, instance.status).green()
    );
    Ok(())
}

async fn remove_instance(id: InstanceId, client: DaemonClient) -> Result<()> {
    client.remove_instance(id).await?;
    println!("{}", format!("✓ Instance {} removed", id).green());
    Ok(())
}
