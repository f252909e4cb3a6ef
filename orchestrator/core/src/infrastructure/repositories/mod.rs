// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits declared in
//! `crate::domain::repository`.
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresDeploymentRepository** - Deployed instances, `UNIQUE(agent_id)`
//! - **PostgresWorkflowRepository** - Workflow aggregates stored as JSONB
//!
//! ## In-Memory Repositories
//!
//! Used for development, tests and the default daemon configuration:
//! - **InMemoryAgentCatalog** - Read-only catalog seeded at startup
//! - **InMemoryDeploymentRepository** - Creation-ordered instance store
//! - **InMemoryWorkflowRepository** - Creation-ordered workflow store
//!
//! The in-memory stores keep aggregates in a `Vec` behind a `RwLock` so that
//! `list_all` returns creation order without a secondary index. Every method
//! takes the lock once, so readers always see whole aggregates.

pub mod postgres_deployment;
pub mod postgres_workflow;

pub use postgres_deployment::PostgresDeploymentRepository;
pub use postgres_workflow::PostgresWorkflowRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::domain::agent::{Agent, AgentId, CatalogFilter};
use crate::domain::deployment::{DeployedInstance, InstanceId};
use crate::domain::repository::{
    AgentCatalog, DeploymentRepository, RepositoryError, WorkflowRepository,
};
use crate::domain::workflow::{Workflow, WorkflowId};

#[derive(Clone, Default)]
pub struct InMemoryAgentCatalog {
    agents: Arc<Vec<Agent>>,
}

impl InMemoryAgentCatalog {
    /// Catalog in the given order. Later duplicates of an id are dropped.
    pub fn new(agents: Vec<Agent>) -> Self {
        let mut unique: Vec<Agent> = Vec::with_capacity(agents.len());
        for agent in agents {
            if unique.iter().any(|a| a.id == agent.id) {
                tracing::warn!(agent_id = %agent.id, "Duplicate catalog entry ignored");
                continue;
            }
            unique.push(agent);
        }
        Self {
            agents: Arc::new(unique),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[async_trait]
impl AgentCatalog for InMemoryAgentCatalog {
    async fn list(&self, filter: &CatalogFilter) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self
            .agents
            .iter()
            .filter(|agent| filter.matches(agent))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.iter().find(|a| &a.id == id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeploymentRepository {
    instances: Arc<RwLock<Vec<DeployedInstance>>>,
}

impl InMemoryDeploymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentRepository for InMemoryDeploymentRepository {
    async fn save(&self, instance: &DeployedInstance) -> Result<(), RepositoryError> {
        let mut instances = self.instances.write();
        if instances
            .iter()
            .any(|i| i.agent_id == instance.agent_id && i.id != instance.id)
        {
            return Err(RepositoryError::Conflict(format!(
                "agent {} already has a deployed instance",
                instance.agent_id
            )));
        }
        match instances.iter_mut().find(|i| i.id == instance.id) {
            Some(existing) => *existing = instance.clone(),
            None => instances.push(instance.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: InstanceId) -> Result<Option<DeployedInstance>, RepositoryError> {
        Ok(self.instances.read().iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_agent(&self, agent_id: &AgentId) -> Result<Option<DeployedInstance>, RepositoryError> {
        Ok(self
            .instances
            .read()
            .iter()
            .find(|i| &i.agent_id == agent_id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<DeployedInstance>, RepositoryError> {
        Ok(self.instances.read().clone())
    }

    async fn delete(&self, id: InstanceId) -> Result<(), RepositoryError> {
        self.instances.write().retain(|i| i.id != id);
        Ok(())
    }
}

fn stale_workflow(workflow: &Workflow, stored: u64) -> RepositoryError {
    RepositoryError::Conflict(format!(
        "workflow {} was saved at version {} but the write expected {}",
        workflow.id, stored, workflow.version
    ))
}

#[derive(Clone, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: Arc<RwLock<Vec<Workflow>>>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn save(&self, workflow: &mut Workflow) -> Result<(), RepositoryError> {
        let mut workflows = self.workflows.write();
        let position = workflows.iter().position(|w| w.id == workflow.id);
        let stored = position.map_or(0, |i| workflows[i].version);
        if stored != workflow.version {
            return Err(stale_workflow(workflow, stored));
        }

        workflow.version += 1;
        match position {
            Some(i) => workflows[i] = workflow.clone(),
            None => workflows.push(workflow.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.workflows.read().iter().find(|w| w.id == id).cloned())
    }

    async fn find_by_instance(&self, instance_id: InstanceId) -> Result<Vec<Workflow>, RepositoryError> {
        Ok(self
            .workflows
            .read()
            .iter()
            .filter(|w| w.contains_instance(instance_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        Ok(self.workflows.read().clone())
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), RepositoryError> {
        self.workflows.write().retain(|w| w.id != id);
        Ok(())
    }
}
