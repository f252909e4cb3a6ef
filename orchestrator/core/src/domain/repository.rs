// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, declared here and implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentCatalog` | `Agent` (read-only) | `InMemoryAgentCatalog` |
//! | `DeploymentRepository` | `DeployedInstance` | `InMemoryDeploymentRepository`, `PostgresDeploymentRepository` |
//! | `WorkflowRepository` | `Workflow` | `InMemoryWorkflowRepository`, `PostgresWorkflowRepository` |
//!
//! Repositories store whole aggregates: a `save` replaces the previous value
//! atomically, so readers never observe a half-applied mutation. Invariants
//! spanning several aggregates are enforced by the application services.

use async_trait::async_trait;

use crate::domain::agent::{Agent, AgentId, CatalogFilter};
use crate::domain::deployment::{DeployedInstance, InstanceId};
use crate::domain::workflow::{Workflow, WorkflowId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub connection_string: String,
}

/// Read-only view of the external agent catalog.
#[async_trait]
pub trait AgentCatalog: Send + Sync {
    /// Agents matching `filter`, in catalog order.
    async fn list(&self, filter: &CatalogFilter) -> Result<Vec<Agent>, RepositoryError>;

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError>;
}

#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    /// Insert or replace an instance.
    async fn save(&self, instance: &DeployedInstance) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: InstanceId) -> Result<Option<DeployedInstance>, RepositoryError>;

    async fn find_by_agent(&self, agent_id: &AgentId) -> Result<Option<DeployedInstance>, RepositoryError>;

    /// All instances in creation order.
    async fn list_all(&self) -> Result<Vec<DeployedInstance>, RepositoryError>;

    async fn delete(&self, id: InstanceId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Insert or replace a workflow together with its nodes, then bump
    /// `workflow.version`. Fails with `Conflict` when the stored version
    /// differs from the one the caller read, so a writer working from a stale
    /// copy cannot overwrite a newer save.
    async fn save(&self, workflow: &mut Workflow) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, RepositoryError>;

    /// Workflows holding a node for `instance_id`, in creation order.
    async fn find_by_instance(&self, instance_id: InstanceId) -> Result<Vec<Workflow>, RepositoryError>;

    /// All workflows in creation order.
    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError>;

    async fn delete(&self, id: WorkflowId) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepositoryError::Conflict(db.message().to_string());
            }
        }
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
