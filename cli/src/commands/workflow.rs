// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow command implementations
//!
//! Workflows are ordered pipelines of deployed instances.
//!
//! # Commands
//!
//! - `agenthub workflow list` - List workflows in creation order
//! - `agenthub workflow show <id>` - Show a workflow and its pipeline
//! - `agenthub workflow create [--name] [--node <INSTANCE_ID>]...` - Create a workflow
//! - `agenthub workflow attach <id> <instance_id>` - Append a node
//! - `agenthub workflow detach <id> <node_id>` - Remove a node
//! - `agenthub workflow rename <id> <name>` - Rename
//! - `agenthub workflow start|stop <id>` - Change status
//! - `agenthub workflow delete <id>` - Delete

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use agenthub_core::domain::deployment::InstanceId;
use agenthub_core::domain::workflow::{NodeId, Workflow, WorkflowId, WorkflowStatus};

use crate::daemon::{connect, DaemonClient, Endpoint};

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// List workflows
    List,

    /// Show workflow details
    Show {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,
    },

    /// Create a workflow, optionally pre-populated with nodes
    Create {
        /// Workflow name (default: "Workflow N")
        #[arg(long)]
        name: Option<String>,

        /// Instance to attach; repeat to build the pipeline in order
        #[arg(long = "node", value_name = "INSTANCE_ID")]
        nodes: Vec<Uuid>,
    },

    /// Append a deployed instance as a node
    Attach {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,

        #[arg(value_name = "INSTANCE_ID")]
        instance_id: Uuid,
    },

    /// Remove a node from a workflow
    Detach {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,

        #[arg(value_name = "NODE_ID")]
        node_id: Uuid,
    },

    /// Rename a workflow
    Rename {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Start a workflow (every node's instance must be running)
    Start {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,
    },

    /// Stop a workflow
    Stop {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,
    },

    /// Delete a workflow
    Delete {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: Uuid,
    },
}

pub async fn handle_command(command: WorkflowCommand, endpoint: &Endpoint) -> Result<()> {
    let Some(client) = connect(endpoint).await? else {
        return Ok(());
    };

    match command {
        WorkflowCommand::List => list_workflows(client).await,
        WorkflowCommand::Show { workflow_id } => {
            let workflow = client.get_workflow(WorkflowId::from_uuid(workflow_id)).await?;
            print_workflow(&workflow);
            Ok(())
        }
        WorkflowCommand::Create { name, nodes } => {
            let nodes = nodes.into_iter().map(InstanceId).collect();
            let workflow = client.create_workflow(name, nodes).await?;
            println!(
                "{}",
                format!("✓ Workflow created: {} ({})", workflow.name, workflow.id).green()
            );
            print_workflow(&workflow);
            Ok(())
        }
        WorkflowCommand::Attach {
            workflow_id,
            instance_id,
        } => {
            let workflow = client
                .attach_node(WorkflowId::from_uuid(workflow_id), InstanceId(instance_id))
                .await?;
            println!("{}", "✓ Node attached".green());
            print_workflow(&workflow);
            Ok(())
        }
        WorkflowCommand::Detach {
            workflow_id,
            node_id,
        } => {
            let workflow = client
                .detach_node(WorkflowId::from_uuid(workflow_id), NodeId(node_id))
                .await?;
            println!("{}", "✓ Node detached".green());
            print_workflow(&workflow);
            Ok(())
        }
        WorkflowCommand::Rename { workflow_id, name } => {
            let workflow = client
                .rename_workflow(WorkflowId::from_uuid(workflow_id), &name)
                .await?;
            println!("{}", format!("✓ Workflow renamed to '{}'", workflow.name).green());
            Ok(())
        }
        WorkflowCommand::Start { workflow_id } => {
            set_status(workflow_id, WorkflowStatus::Running, client).await
        }
        WorkflowCommand::Stop { workflow_id } => {
            set_status(workflow_id, WorkflowStatus::Inactive, client).await
        }
        WorkflowCommand::Delete { workflow_id } => {
            client.delete_workflow(WorkflowId::from_uuid(workflow_id)).await?;
            println!("{}", format!("✓ Workflow {} deleted", workflow_id).green());
            Ok(())
        }
    }
}

async fn list_workflows(client: DaemonClient) -> Result<()> {
    let workflows = client.list_workflows().await?;

    if workflows.is_empty() {
        println!("{}", "No workflows found".yellow());
        return Ok(());
    }

    println!("{:<38} {:<24} {:<10} {}", "ID", "NAME", "STATUS", "NODES");
    for workflow in workflows {
        println!(
            "{:<38} {:<24} {:<10} {}",
            workflow.id,
            workflow.name.bold(),
            status_label(workflow.status),
            workflow.nodes.len()
        );
    }

    Ok(())
}

async fn set_status(workflow_id: Uuid, status: WorkflowStatus, client: DaemonClient) -> Result<()> {
    let workflow = client
        .set_workflow_status(WorkflowId::from_uuid(workflow_id), status)
        .await?;
    println!(
        "{}",
        format!("✓ Workflow '{}' is {}", workflow.name, workflow.status).green()
    );
    Ok(())
}

fn status_label(status: WorkflowStatus) -> colored::ColoredString {
    match status {
        WorkflowStatus::Running => status.as_str().green(),
        WorkflowStatus::Inactive => status.as_str().dimmed(),
    }
}

/// Pipeline rendered as `icon name → icon name`.
fn pipeline(workflow: &Workflow) -> String {
    workflow
        .nodes
        .iter()
        .map(|node| format!("{} {}", node.icon, node.name))
        .collect::<Vec<_>>()
        .join(" → ")
}

fn print_workflow(workflow: &Workflow) {
    println!("{}", workflow.name.bold());
    println!("  ID: {}", workflow.id);
    println!("  Status: {}", status_label(workflow.status));
    println!("  Updated: {}", workflow.updated_at.format("%Y-%m-%d %H:%M:%S"));

    if workflow.nodes.is_empty() {
        println!("  Nodes: {}", "(none)".dimmed());
        return;
    }

    println!("  Pipeline: {}", pipeline(workflow));
    println!("  Nodes:");
    for (position, node) in workflow.nodes.iter().enumerate() {
        println!(
            "    {}. {} {} (node {}, instance {})",
            position + 1,
            node.icon,
            node.name,
            node.id,
            node.agent_instance_id
        );
    }
}
