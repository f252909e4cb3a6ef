// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon HTTP server implementation

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use agenthub_core::application::hub::AgentHub;
use agenthub_core::domain::node_config::{HubConfig, ObservabilityConfig};
use agenthub_core::presentation::api;

pub async fn start_server(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config =
        HubConfig::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.spec.server.host = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        "Configuration loaded: name={}, storage={:?}",
        config.metadata.name, config.spec.storage.backend
    );

    let hub = AgentHub::from_config(&config)
        .await
        .context("Failed to initialize AgentHub")?;

    let app = build_router(hub, &config.spec.observability)?;

    let addr = format!("{}:{}", config.spec.server.host, config.spec.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("AgentHub daemon listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("AgentHub daemon shutting down");

    Ok(())
}

/// API routes plus, when enabled, the Prometheus scrape endpoint.
fn build_router(hub: AgentHub, observability: &ObservabilityConfig) -> Result<Router> {
    let router = api::app(hub);
    if !observability.metrics_enabled {
        return Ok(router);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Metrics exposed at {}", observability.metrics_path);

    Ok(router.route(
        &observability.metrics_path,
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
