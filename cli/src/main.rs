// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AgentHub CLI
//!
//! The `agenthub` binary runs the AgentHub daemon and talks to it.
//!
//! ## Commands
//!
//! - `agenthub serve` - Run the HTTP daemon in the foreground
//! - `agenthub agents list|deploy` - Browse the catalog and deploy agents
//! - `agenthub instances list|start|stop|remove` - Manage deployed instances
//! - `agenthub workflow ...` - Compose and run workflows
//! - `agenthub stats` / `agenthub events` - Observe the hub
//! - `agenthub config show|validate|generate` - Configuration management
//!
//! Client commands resolve the daemon address from `--host`/`--port`, falling
//! back to `spec.server` of the discovered configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use agenthub_orchestrator::commands::{
    self, AgentsCommand, ConfigCommand, InstanceCommand, WorkflowCommand,
};
use agenthub_orchestrator::daemon::{self, Endpoint};

/// AgentHub - deploy marketplace agents and compose them into workflows
#[derive(Parser)]
#[command(name = "agenthub")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENTHUB_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Daemon HTTP port (default: spec.server.port)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Daemon HTTP host (default: spec.server.host)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENTHUB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the AgentHub daemon in the foreground
    #[command(name = "serve")]
    Serve,

    /// Browse the catalog and deploy agents
    #[command(name = "agents")]
    Agents {
        #[command(subcommand)]
        command: AgentsCommand,
    },

    /// Manage deployed instances
    #[command(name = "instances")]
    Instances {
        #[command(subcommand)]
        command: InstanceCommand,
    },

    /// Workflow management
    #[command(name = "workflow")]
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },

    /// Show aggregate statistics
    #[command(name = "stats")]
    Stats,

    /// Stream domain events from the daemon
    #[command(name = "events")]
    Events {
        /// Only show events of this workflow
        #[arg(long, value_name = "WORKFLOW_ID")]
        workflow: Option<String>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let Some(command) = cli.command else {
        eprintln!("{}", "No command specified. Use --help for usage.".yellow());
        std::process::exit(1);
    };

    let endpoint = || Endpoint::resolve(cli.config.clone(), cli.host.clone(), cli.port);

    match command {
        Commands::Serve => {
            daemon::server::start_server(cli.config.clone(), cli.host.clone(), cli.port).await
        }
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config.clone()).await
        }
        Commands::Agents { command } => {
            commands::agents::handle_command(command, &endpoint()?).await
        }
        Commands::Instances { command } => {
            commands::instance::handle_command(command, &endpoint()?).await
        }
        Commands::Workflow { command } => {
            commands::workflow::handle_command(command, &endpoint()?).await
        }
        Commands::Stats => commands::stats::handle_command(&endpoint()?).await,
        Commands::Events { workflow } => {
            commands::events::handle_command(workflow, &endpoint()?).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
