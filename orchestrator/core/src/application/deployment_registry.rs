// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Registry - Application Layer
//!
//! Tracks which catalog agents are deployed and whether each instance is
//! running. At most one instance exists per agent.
//!
//! # Locking
//!
//! - `deploy` serializes per `AgentId`, so concurrent deploys of one agent
//!   yield exactly one instance and `AlreadyDeployed` for the rest.
//! - `set_status`, `remove` and [`InstanceDirectory::lease`] serialize per
//!   `InstanceId`. A lease held by an attach therefore either completes before
//!   a removal starts its cascade, or observes the instance as gone.
//!
//! # Cascade
//!
//! Removing an instance detaches it from every workflow through the
//! [`WorkflowCascade`] bound with [`StandardDeploymentRegistry::bind_cascade`].
//! The registry keeps only a `Weak` handle: the orchestrator already holds the
//! registry through [`InstanceDirectory`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::{info, warn};

use crate::application::locks::{KeyGuard, KeyedLocks};
use crate::domain::agent::{Agent, AgentId};
use crate::domain::deployment::{DeployedAgentView, DeployedInstance, InstanceId, InstanceStatus};
use crate::domain::error::{EntityKind, OrchestrationError};
use crate::domain::events::DeploymentEvent;
use crate::domain::repository::{AgentCatalog, DeploymentRepository, RepositoryError};
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait DeploymentRegistry: Send + Sync {
    /// Create a running instance of a catalog agent.
    async fn deploy(&self, agent_id: &AgentId) -> Result<DeployedInstance, OrchestrationError>;

    /// Idempotent when `status` equals the current status.
    async fn set_status(&self, id: InstanceId, status: InstanceStatus) -> Result<DeployedInstance, OrchestrationError>;

    /// Delete the instance and detach it from every workflow.
    async fn remove(&self, id: InstanceId) -> Result<(), OrchestrationError>;

    async fn get(&self, id: InstanceId) -> Result<DeployedInstance, OrchestrationError>;

    /// All instances in creation order.
    async fn list(&self) -> Result<Vec<DeployedInstance>, OrchestrationError>;

    async fn get_with_agent(&self, id: InstanceId) -> Result<DeployedAgentView, OrchestrationError>;

    /// `list` joined with the catalog for display.
    async fn list_with_agents(&self) -> Result<Vec<DeployedAgentView>, OrchestrationError>;
}

/// Node cleanup the registry triggers on removal.
#[async_trait]
pub trait WorkflowCascade: Send + Sync {
    /// Remove the node for `instance_id` from every workflow holding one.
    /// Returns the number of nodes removed.
    async fn detach_by_instance(&self, instance_id: InstanceId) -> Result<usize, OrchestrationError>;
}

/// Instance lookups the orchestrator needs.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    /// Exclusive hold on an existing instance. Removal and status changes of
    /// that instance wait until the lease is dropped.
    async fn lease(&self, id: InstanceId) -> Result<InstanceLease, OrchestrationError>;

    /// Snapshot read; `None` when the instance does not exist.
    async fn current_status(&self, id: InstanceId) -> Result<Option<InstanceStatus>, OrchestrationError>;
}

pub struct InstanceLease {
    pub instance: DeployedInstance,
    /// Catalog entry, `None` if the agent has since left the catalog.
    pub agent: Option<Agent>,
    _guard: KeyGuard<InstanceId>,
}

pub struct StandardDeploymentRegistry {
    catalog: Arc<dyn AgentCatalog>,
    repository: Arc<dyn DeploymentRepository>,
    event_bus: Arc<EventBus>,
    agent_locks: KeyedLocks<AgentId>,
    instance_locks: KeyedLocks<InstanceId>,
    cascade: RwLock<Option<Weak<dyn WorkflowCascade>>>,
}

impl StandardDeploymentRegistry {
    pub fn new(
        catalog: Arc<dyn AgentCatalog>,
        repository: Arc<dyn DeploymentRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            catalog,
            repository,
            event_bus,
            agent_locks: KeyedLocks::new(),
            instance_locks: KeyedLocks::new(),
            cascade: RwLock::new(None),
        }
    }

    pub fn bind_cascade(&self, cascade: Weak<dyn WorkflowCascade>) {
        *self.cascade.write() = Some(cascade);
    }

    fn cascade(&self) -> Option<Arc<dyn WorkflowCascade>> {
        self.cascade.read().as_ref().and_then(Weak::upgrade)
    }

    async fn find(&self, id: InstanceId) -> Result<DeployedInstance, OrchestrationError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found(EntityKind::Instance, id))
    }

    async fn join(&self, instance: DeployedInstance) -> Result<DeployedAgentView, OrchestrationError> {
        let agent = self.catalog.find_by_id(&instance.agent_id).await?;
        Ok(DeployedAgentView { instance, agent })
    }
}

#[async_trait]
impl DeploymentRegistry for StandardDeploymentRegistry {
    async fn deploy(&self, agent_id: &AgentId) -> Result<DeployedInstance, OrchestrationError> {
        let _guard = self.agent_locks.acquire(agent_id).await;

        if self.catalog.find_by_id(agent_id).await?.is_none() {
            return Err(OrchestrationError::not_found(EntityKind::Agent, agent_id));
        }
        if self.repository.find_by_agent(agent_id).await?.is_some() {
            return Err(OrchestrationError::AlreadyDeployed(agent_id.clone()));
        }

        let instance = DeployedInstance::new(agent_id.clone());
        self.repository.save(&instance).await.map_err(|e| match e {
            // Another process sharing the database won the race.
            RepositoryError::Conflict(_) => OrchestrationError::AlreadyDeployed(agent_id.clone()),
            other => other.into(),
        })?;

        info!(instance_id = %instance.id, agent_id = %agent_id, "Agent deployed");
        metrics::counter!("agenthub.instances.deployed").increment(1);
        self.event_bus.publish_deployment_event(DeploymentEvent::InstanceDeployed {
            instance_id: instance.id,
            agent_id: agent_id.clone(),
            deployed_at: instance.deployed_at,
        });

        Ok(instance)
    }

    async fn set_status(&self, id: InstanceId, status: InstanceStatus) -> Result<DeployedInstance, OrchestrationError> {
        let _guard = self.instance_locks.acquire(&id).await;

        let mut instance = self.find(id).await?;
        let from = instance.status;
        if !instance.transition_to(status) {
            return Ok(instance);
        }
        self.repository.save(&instance).await?;

        info!(instance_id = %id, from = %from, to = %status, "Instance status changed");
        self.event_bus.publish_deployment_event(DeploymentEvent::InstanceStatusChanged {
            instance_id: id,
            from,
            to: status,
            changed_at: Utc::now(),
        });

        Ok(instance)
    }

    async fn remove(&self, id: InstanceId) -> Result<(), OrchestrationError> {
        let _guard = self.instance_locks.acquire(&id).await;

        let instance = self.find(id).await?;

        // Cascade before delete: a failed cascade leaves the instance in place.
        let detached_nodes = match self.cascade() {
            Some(cascade) => cascade.detach_by_instance(id).await?,
            None => {
                warn!(instance_id = %id, "No workflow cascade bound; removing instance without detaching nodes");
                0
            }
        };

        self.repository.delete(id).await?;

        info!(instance_id = %id, agent_id = %instance.agent_id, detached_nodes, "Instance removed");
        metrics::counter!("agenthub.instances.removed").increment(1);
        self.event_bus.publish_deployment_event(DeploymentEvent::InstanceRemoved {
            instance_id: id,
            agent_id: instance.agent_id,
            detached_nodes,
            removed_at: Utc::now(),
        });

        Ok(())
    }

    async fn get(&self, id: InstanceId) -> Result<DeployedInstance, OrchestrationError> {
        self.find(id).await
    }

    async fn list(&self) -> Result<Vec<DeployedInstance>, OrchestrationError> {
        Ok(self.repository.list_all().await?)
    }

    async fn get_with_agent(&self, id: InstanceId) -> Result<DeployedAgentView, OrchestrationError> {
        let instance = self.find(id).await?;
        self.join(instance).await
    }

    async fn list_with_agents(&self) -> Result<Vec<DeployedAgentView>, OrchestrationError> {
        let instances = self.repository.list_all().await?;
        let mut views = Vec::with_capacity(instances.len());
        for instance in instances {
            views.push(self.join(instance).await?);
        }
        Ok(views)
    }
}

#[async_trait]
impl InstanceDirectory for StandardDeploymentRegistry {
    async fn lease(&self, id: InstanceId) -> Result<InstanceLease, OrchestrationError> {
        let guard = self.instance_locks.acquire(&id).await;
        let instance = self.find(id).await?;
        let agent = self.catalog.find_by_id(&instance.agent_id).await?;
        Ok(InstanceLease {
            instance,
            agent,
            _guard: guard,
        })
    }

    async fn current_status(&self, id: InstanceId) -> Result<Option<InstanceStatus>, OrchestrationError> {
        Ok(self.repository.find_by_id(id).await?.map(|i| i.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::{InMemoryAgentCatalog, InMemoryDeploymentRepository};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn agent(id: &str) -> Agent {
        Agent {
            id: AgentId::from(id),
            name: format!("{} agent", id),
            icon: "🤖".to_string(),
            category: "Development".to_string(),
            price: 0,
            vendor: "Acme".to_string(),
            description: String::new(),
            rating: 4.0,
            reviews: 0,
        }
    }

    fn registry() -> StandardDeploymentRegistry {
        StandardDeploymentRegistry::new(
            Arc::new(InMemoryAgentCatalog::new(vec![agent("a1"), agent("a2")])),
            Arc::new(InMemoryDeploymentRepository::new()),
            Arc::new(EventBus::new(16)),
        )
    }

    #[derive(Default)]
    struct CountingCascade {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WorkflowCascade for CountingCascade {
        async fn detach_by_instance(&self, _instance_id: InstanceId) -> Result<usize, OrchestrationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        }
    }

    #[tokio::test]
    async fn deploy_creates_running_instance() {
        let registry = registry();
        let instance = registry.deploy(&AgentId::from("a1")).await.unwrap();
        assert!(instance.is_running());
        assert_eq!(registry.get(instance.id).await.unwrap(), instance);
    }

    #[tokio::test]
    async fn second_deploy_is_rejected() {
        let registry = registry();
        registry.deploy(&AgentId::from("a1")).await.unwrap();
        let err = registry.deploy(&AgentId::from("a1")).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::AlreadyDeployed(_)));
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deploying_unknown_agent_is_not_found() {
        let registry = registry();
        let err = registry.deploy(&AgentId::from("ghost")).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound { kind: EntityKind::Agent, .. }));
    }

    #[tokio::test]
    async fn set_status_is_idempotent() {
        let registry = registry();
        let instance = registry.deploy(&AgentId::from("a1")).await.unwrap();
        let mut events = registry.event_bus.subscribe();

        let once = registry.set_status(instance.id, InstanceStatus::Running).await.unwrap();
        assert_eq!(once, instance);
        assert!(events.try_recv().is_err());

        let stopped = registry.set_status(instance.id, InstanceStatus::Stopped).await.unwrap();
        let again = registry.set_status(instance.id, InstanceStatus::Stopped).await.unwrap();
        assert_eq!(stopped, again);
    }

    #[tokio::test]
    async fn set_status_on_missing_instance_is_not_found() {
        let registry = registry();
        let err = registry
            .set_status(InstanceId::new(), InstanceStatus::Stopped)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::NotFound { kind: EntityKind::Instance, .. }));
    }

    #[tokio::test]
    async fn remove_runs_cascade_then_deletes() {
        let registry = registry();
        let cascade = Arc::new(CountingCascade::default());
        let as_cascade: Arc<dyn WorkflowCascade> = cascade.clone();
        registry.bind_cascade(Arc::downgrade(&as_cascade));

        let instance = registry.deploy(&AgentId::from("a1")).await.unwrap();
        let mut events = registry.event_bus.subscribe();
        registry.remove(instance.id).await.unwrap();

        assert_eq!(cascade.calls.load(Ordering::SeqCst), 1);
        assert!(registry.list().await.unwrap().is_empty());
        match events.try_recv().unwrap() {
            crate::infrastructure::event_bus::DomainEvent::Deployment(DeploymentEvent::InstanceRemoved {
                detached_nodes,
                ..
            }) => assert_eq!(detached_nodes, 2),
            other => panic!("unexpected event {:?}", other),
        }

        // The agent can be deployed again once its instance is gone.
        registry.deploy(&AgentId::from("a1")).await.unwrap();
    }

    #[tokio::test]
    async fn remove_missing_instance_is_not_found() {
        let registry = registry();
        assert!(registry.remove(InstanceId::new()).await.is_err());
    }

    #[tokio::test]
    async fn lookups_of_unknown_ids_leave_no_lock_entries() {
        let registry = registry();
        for _ in 0..1000 {
            assert!(registry.deploy(&AgentId::from("ghost")).await.is_err());
            assert!(registry
                .set_status(InstanceId::new(), InstanceStatus::Stopped)
                .await
                .is_err());
            assert!(registry.lease(InstanceId::new()).await.is_err());
        }
        assert!(registry.agent_locks.is_empty());
        assert!(registry.instance_locks.is_empty());

        let instance = registry.deploy(&AgentId::from("a1")).await.unwrap();
        registry.remove(instance.id).await.unwrap();
        assert!(registry.agent_locks.is_empty());
        assert!(registry.instance_locks.is_empty());
    }

    #[tokio::test]
    async fn list_with_agents_keeps_creation_order() {
        let registry = registry();
        let second = registry.deploy(&AgentId::from("a2")).await.unwrap();
        let first = registry.deploy(&AgentId::from("a1")).await.unwrap();

        let views = registry.list_with_agents().await.unwrap();
        assert_eq!(views[0].instance.id, second.id);
        assert_eq!(views[1].instance.id, first.id);
        assert_eq!(views[0].agent.as_ref().map(|a| a.id.as_str()), Some("a2"));
    }
}
