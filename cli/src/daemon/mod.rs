// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon mode implementation
//!
//! Handles:
//! - Resolving the daemon address from flags and configuration
//! - HTTP health checks
//! - Foreground HTTP server with graceful shutdown

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use agenthub_core::domain::node_config::HubConfig;

pub mod client;
pub mod server;

pub use client::DaemonClient;
pub use server::start_server;

/// Address of a running daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Explicit flags win; anything missing comes from `spec.server` of the
    /// discovered configuration.
    pub fn resolve(
        config_path: Option<PathBuf>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self> {
        if let (Some(host), Some(port)) = (host.clone(), port) {
            return Ok(Self::new(host, port));
        }

        let config =
            HubConfig::load_or_default(config_path).context("Failed to load configuration")?;
        Ok(Self::new(
            host.unwrap_or(config.spec.server.host),
            port.unwrap_or(config.spec.server.port),
        ))
    }

    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host, self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone)]
pub enum DaemonStatus {
    Running { uptime: Option<u64> },
    Stopped,
    Unhealthy { error: String },
}

/// Check if the daemon answers its health endpoint.
pub async fn check_daemon_running(endpoint: &Endpoint) -> Result<DaemonStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;

    let health_url = format!("{}/health", endpoint.base_url());

    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let uptime = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["uptimeSeconds"].as_u64());
            Ok(DaemonStatus::Running { uptime })
        }
        Ok(resp) => Ok(DaemonStatus::Unhealthy {
            error: format!("HTTP {}", resp.status()),
        }),
        Err(_) => Ok(DaemonStatus::Stopped),
    }
}

/// Health-check the daemon and build a client for it. Prints a hint and
/// returns `None` when the daemon is unreachable.
pub async fn connect(endpoint: &Endpoint) -> Result<Option<DaemonClient>> {
    match check_daemon_running(endpoint).await? {
        DaemonStatus::Running { .. } => Ok(Some(DaemonClient::new(endpoint)?)),
        DaemonStatus::Unhealthy { error } => {
            println!(
                "{}",
                format!("⚠ Daemon at {} is unhealthy: {}", endpoint.base_url(), error).yellow()
            );
            Ok(None)
        }
        DaemonStatus::Stopped => {
            println!(
                "{}",
                format!("No AgentHub daemon reachable at {}.", endpoint.base_url()).red()
            );
            println!("Run 'agenthub serve' to start the daemon.");
            Ok(None)
        }
    }
}
