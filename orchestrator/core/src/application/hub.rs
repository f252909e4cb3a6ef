// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AgentHub composition root.
//!
//! Wires the catalog, the deployment registry and the workflow orchestrator
//! around one event bus, and binds the orchestrator as the registry's
//! removal cascade.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::deployment_registry::{
    DeploymentRegistry, InstanceDirectory, StandardDeploymentRegistry, WorkflowCascade,
};
use crate::application::repository_factory::{create_deployment_repository, create_workflow_repository};
use crate::application::stats::HubStats;
use crate::application::workflow_orchestrator::{StandardWorkflowOrchestrator, WorkflowOrchestrator};
use crate::domain::agent::{Agent, CatalogFilter};
use crate::domain::error::OrchestrationError;
use crate::domain::node_config::HubConfig;
use crate::domain::repository::{AgentCatalog, DeploymentRepository, StorageBackend, WorkflowRepository};
use crate::infrastructure::catalog_loader::CatalogLoader;
use crate::infrastructure::db::Database;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repositories::{
    InMemoryAgentCatalog, InMemoryDeploymentRepository, InMemoryWorkflowRepository,
};

#[derive(Clone)]
pub struct AgentHub {
    catalog: Arc<dyn AgentCatalog>,
    registry: Arc<StandardDeploymentRegistry>,
    orchestrator: Arc<StandardWorkflowOrchestrator>,
    event_bus: Arc<EventBus>,
    started_at: DateTime<Utc>,
}

impl AgentHub {
    pub fn new(
        catalog: Arc<dyn AgentCatalog>,
        deployments: Arc<dyn DeploymentRepository>,
        workflows: Arc<dyn WorkflowRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let registry = Arc::new(StandardDeploymentRegistry::new(
            catalog.clone(),
            deployments,
            event_bus.clone(),
        ));
        let directory: Arc<dyn InstanceDirectory> = registry.clone();
        let orchestrator = Arc::new(StandardWorkflowOrchestrator::new(
            workflows,
            directory,
            event_bus.clone(),
        ));

        let cascade: Arc<dyn WorkflowCascade> = orchestrator.clone();
        registry.bind_cascade(Arc::downgrade(&cascade));

        Self {
            catalog,
            registry,
            orchestrator,
            event_bus,
            started_at: Utc::now(),
        }
    }

    /// In-memory stores with a default-sized event bus.
    pub fn in_memory(catalog: Arc<dyn AgentCatalog>) -> Self {
        Self::new(
            catalog,
            Arc::new(InMemoryDeploymentRepository::new()),
            Arc::new(InMemoryWorkflowRepository::new()),
            Arc::new(EventBus::with_default_capacity()),
        )
    }

    /// In-memory hub over the built-in catalog.
    pub fn with_builtin_catalog() -> Result<Self> {
        let catalog = CatalogLoader::load(None)?;
        Ok(Self::in_memory(Arc::new(catalog)))
    }

    /// Build the hub described by a validated configuration manifest.
    pub async fn from_config(config: &HubConfig) -> Result<Self> {
        let catalog: InMemoryAgentCatalog = CatalogLoader::load(config.spec.catalog.path.as_deref())?;
        let backend = config.storage_backend()?;

        let pool = match &backend {
            StorageBackend::InMemory => None,
            StorageBackend::PostgreSQL(pg) => {
                let db = Database::new(&pg.connection_string, config.spec.storage.max_connections).await?;
                db.migrate().await?;
                Some(db.get_pool().clone())
            }
        };

        let deployments = create_deployment_repository(&backend, pool.clone())
            .context("Failed to create deployment repository")?;
        let workflows =
            create_workflow_repository(&backend, pool).context("Failed to create workflow repository")?;
        let event_bus = Arc::new(EventBus::new(config.spec.events.capacity));

        let backend_name = match backend {
            StorageBackend::InMemory => "in-memory",
            StorageBackend::PostgreSQL(_) => "postgres",
        };
        tracing::info!(
            backend = backend_name,
            agents = catalog.len(),
            "AgentHub initialized"
        );
        Ok(Self::new(Arc::new(catalog), deployments, workflows, event_bus))
    }

    pub fn registry(&self) -> Arc<dyn DeploymentRegistry> {
        self.registry.clone()
    }

    pub fn orchestrator(&self) -> Arc<dyn WorkflowOrchestrator> {
        self.orchestrator.clone()
    }

    pub fn catalog(&self) -> Arc<dyn AgentCatalog> {
        self.catalog.clone()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub async fn list_agents(&self, filter: &CatalogFilter) -> Result<Vec<Agent>, OrchestrationError> {
        Ok(self.catalog.list(filter).await?)
    }

    pub async fn stats(&self) -> Result<HubStats, OrchestrationError> {
        HubStats::collect(self.registry.as_ref(), self.orchestrator.as_ref()).await
    }
}
