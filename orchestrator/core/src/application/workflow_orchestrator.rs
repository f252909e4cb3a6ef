// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workflow Orchestrator - Application Layer
//!
//! Owns workflow aggregates: creation, append-only node attachment, detach,
//! rename, start/stop and deletion, plus the cascade invoked when a deployed
//! instance is removed.
//!
//! Every mutation of a workflow runs under that workflow's lock. Operations
//! that also touch an instance take the instance lease first, then the
//! workflow lock; the registry's removal path takes them in the same order.
//!
//! Starting a workflow requires every referenced instance to be running.
//! Stopping is never blocked, and stopping an instance leaves its nodes in
//! place.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::deployment_registry::{InstanceDirectory, InstanceLease, WorkflowCascade};
use crate::application::locks::KeyedLocks;
use crate::domain::deployment::{InstanceId, InstanceStatus};
use crate::domain::error::{EntityKind, OrchestrationError};
use crate::domain::events::WorkflowEvent;
use crate::domain::repository::WorkflowRepository;
use crate::domain::workflow::{NodeId, Workflow, WorkflowId, WorkflowNode, WorkflowStatus};
use crate::infrastructure::event_bus::EventBus;

const FALLBACK_NODE_ICON: &str = "🤖";

#[async_trait]
pub trait WorkflowOrchestrator: Send + Sync {
    /// Create an inactive workflow. A missing or blank `name` becomes
    /// `Workflow N`. Initial instances are validated like `attach_node`; on
    /// any failure nothing is created.
    async fn create(&self, name: Option<String>, instance_ids: Vec<InstanceId>) -> Result<Workflow, OrchestrationError>;

    /// Append a node for a running instance.
    async fn attach_node(&self, workflow_id: WorkflowId, instance_id: InstanceId) -> Result<Workflow, OrchestrationError>;

    async fn detach_node(&self, workflow_id: WorkflowId, node_id: NodeId) -> Result<Workflow, OrchestrationError>;

    async fn rename(&self, workflow_id: WorkflowId, name: String) -> Result<Workflow, OrchestrationError>;

    async fn set_status(&self, workflow_id: WorkflowId, status: WorkflowStatus) -> Result<Workflow, OrchestrationError>;

    /// Rename and/or change status as one mutation. Every check runs before
    /// anything is saved, so a refused start leaves the name untouched.
    async fn update(
        &self,
        workflow_id: WorkflowId,
        name: Option<String>,
        status: Option<WorkflowStatus>,
    ) -> Result<Workflow, OrchestrationError>;

    async fn delete(&self, workflow_id: WorkflowId) -> Result<(), OrchestrationError>;

    async fn get(&self, workflow_id: WorkflowId) -> Result<Workflow, OrchestrationError>;

    /// All workflows in creation order.
    async fn list(&self) -> Result<Vec<Workflow>, OrchestrationError>;
}

pub struct StandardWorkflowOrchestrator {
    repository: Arc<dyn WorkflowRepository>,
    instances: Arc<dyn InstanceDirectory>,
    event_bus: Arc<EventBus>,
    workflow_locks: KeyedLocks<WorkflowId>,
}

impl StandardWorkflowOrchestrator {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        instances: Arc<dyn InstanceDirectory>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            repository,
            instances,
            event_bus,
            workflow_locks: KeyedLocks::new(),
        }
    }

    async fn find(&self, id: WorkflowId) -> Result<Workflow, OrchestrationError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found(EntityKind::Workflow, id))
    }

    fn node_for(lease: &InstanceLease) -> WorkflowNode {
        match &lease.agent {
            Some(agent) => WorkflowNode::for_agent(lease.instance.id, agent),
            None => WorkflowNode::new(
                lease.instance.id,
                lease.instance.agent_id.as_str(),
                FALLBACK_NODE_ICON,
            ),
        }
    }

    fn ensure_running(lease: &InstanceLease) -> Result<(), OrchestrationError> {
        if lease.instance.is_running() {
            Ok(())
        } else {
            Err(OrchestrationError::InstanceNotRunning(lease.instance.id))
        }
    }

    async fn default_name(&self) -> Result<String, OrchestrationError> {
        let count = self.repository.list_all().await?.len();
        Ok(format!("Workflow {}", count + 1))
    }

    fn publish_attached(&self, workflow: &Workflow, node: &WorkflowNode, position: usize) {
        info!(workflow_id = %workflow.id, node_id = %node.id, instance_id = %node.agent_instance_id, position, "Node attached");
        metrics::counter!("agenthub.workflow.nodes.attached").increment(1);
        self.event_bus.publish_workflow_event(WorkflowEvent::NodeAttached {
            workflow_id: workflow.id,
            node_id: node.id,
            instance_id: node.agent_instance_id,
            position,
            attached_at: Utc::now(),
        });
    }
}

#[async_trait]
impl WorkflowOrchestrator for StandardWorkflowOrchestrator {
    async fn create(&self, name: Option<String>, instance_ids: Vec<InstanceId>) -> Result<Workflow, OrchestrationError> {
        let mut sorted: BTreeSet<InstanceId> = BTreeSet::new();
        for id in &instance_ids {
            if !sorted.insert(*id) {
                return Err(OrchestrationError::Validation(format!(
                    "instance {} is listed more than once",
                    id
                )));
            }
        }

        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => self.default_name().await?,
        };
        let mut workflow = Workflow::new(name)?;

        // Leases are taken in id order so concurrent creates cannot deadlock.
        let mut leases: BTreeMap<InstanceId, InstanceLease> = BTreeMap::new();
        for id in sorted {
            let lease = self.instances.lease(id).await?;
            Self::ensure_running(&lease)?;
            leases.insert(id, lease);
        }
        for id in &instance_ids {
            if let Some(lease) = leases.get(id) {
                workflow.attach(Self::node_for(lease))?;
            }
        }

        self.repository.save(&mut workflow).await?;
        drop(leases);

        info!(workflow_id = %workflow.id, name = %workflow.name, nodes = workflow.nodes.len(), "Workflow created");
        self.event_bus.publish_workflow_event(WorkflowEvent::WorkflowCreated {
            workflow_id: workflow.id,
            name: workflow.name.clone(),
            created_at: workflow.created_at,
        });
        for (position, node) in workflow.nodes.iter().enumerate() {
            self.publish_attached(&workflow, node, position);
        }

        Ok(workflow)
    }

    async fn attach_node(&self, workflow_id: WorkflowId, instance_id: InstanceId) -> Result<Workflow, OrchestrationError> {
        let lease = self.instances.lease(instance_id).await?;
        let _guard = self.workflow_locks.acquire(&workflow_id).await;

        let mut workflow = self.find(workflow_id).await?;
        Self::ensure_running(&lease)?;
        let node = workflow.attach(Self::node_for(&lease))?.clone();
        self.repository.save(&mut workflow).await?;

        self.publish_attached(&workflow, &node, workflow.nodes.len() - 1);
        Ok(workflow)
    }

    async fn detach_node(&self, workflow_id: WorkflowId, node_id: NodeId) -> Result<Workflow, OrchestrationError> {
        let _guard = self.workflow_locks.acquire(&workflow_id).await;

        let mut workflow = self.find(workflow_id).await?;
        let node = workflow.detach(node_id)?;
        self.repository.save(&mut workflow).await?;

        info!(workflow_id = %workflow_id, node_id = %node_id, "Node detached");
        metrics::counter!("agenthub.workflow.nodes.detached").increment(1);
        self.event_bus.publish_workflow_event(WorkflowEvent::NodeDetached {
            workflow_id,
            node_id,
            instance_id: node.agent_instance_id,
            cascaded: false,
            detached_at: Utc::now(),
        });

        Ok(workflow)
    }

    async fn rename(&self, workflow_id: WorkflowId, name: String) -> Result<Workflow, OrchestrationError> {
        self.update(workflow_id, Some(name), None).await
    }

    async fn set_status(&self, workflow_id: WorkflowId, status: WorkflowStatus) -> Result<Workflow, OrchestrationError> {
        self.update(workflow_id, None, Some(status)).await
    }

    async fn update(
        &self,
        workflow_id: WorkflowId,
        name: Option<String>,
        status: Option<WorkflowStatus>,
    ) -> Result<Workflow, OrchestrationError> {
        let _guard = self.workflow_locks.acquire(&workflow_id).await;

        let mut workflow = self.find(workflow_id).await?;
        let from = workflow.status;
        let renamed = match name {
            Some(name) => {
                workflow.rename(name)?;
                true
            }
            None => false,
        };
        let target = status.filter(|s| *s != from);

        if target == Some(WorkflowStatus::Running) {
            for instance_id in workflow.instance_ids() {
                match self.instances.current_status(instance_id).await? {
                    Some(InstanceStatus::Running) => {}
                    _ => return Err(OrchestrationError::InstanceNotRunning(instance_id)),
                }
            }
        }

        if !renamed && target.is_none() {
            return Ok(workflow);
        }
        if let Some(to) = target {
            workflow.transition_to(to);
        }
        self.repository.save(&mut workflow).await?;

        if renamed {
            info!(workflow_id = %workflow_id, name = %workflow.name, "Workflow renamed");
            self.event_bus.publish_workflow_event(WorkflowEvent::WorkflowRenamed {
                workflow_id,
                name: workflow.name.clone(),
                renamed_at: workflow.updated_at,
            });
        }
        if let Some(to) = target {
            info!(workflow_id = %workflow_id, from = %from, to = %to, "Workflow status changed");
            self.event_bus.publish_workflow_event(WorkflowEvent::WorkflowStatusChanged {
                workflow_id,
                from,
                to,
                changed_at: workflow.updated_at,
            });
        }

        Ok(workflow)
    }

    async fn delete(&self, workflow_id: WorkflowId) -> Result<(), OrchestrationError> {
        let _guard = self.workflow_locks.acquire(&workflow_id).await;

        let workflow = self.find(workflow_id).await?;
        self.repository.delete(workflow_id).await?;

        info!(workflow_id = %workflow_id, nodes = workflow.nodes.len(), "Workflow deleted");
        self.event_bus.publish_workflow_event(WorkflowEvent::WorkflowDeleted {
            workflow_id,
            deleted_at: Utc::now(),
        });

        Ok(())
    }

    async fn get(&self, workflow_id: WorkflowId) -> Result<Workflow, OrchestrationError> {
        self.find(workflow_id).await
    }

    async fn list(&self) -> Result<Vec<Workflow>, OrchestrationError> {
        Ok(self.repository.list_all().await?)
    }
}

#[async_trait]
impl WorkflowCascade for StandardWorkflowOrchestrator {
    async fn detach_by_instance(&self, instance_id: InstanceId) -> Result<usize, OrchestrationError> {
        let candidates = self.repository.find_by_instance(instance_id).await?;
        let mut detached = 0;

        for candidate in candidates {
            let _guard = self.workflow_locks.acquire(&candidate.id).await;

            // Re-read under the lock; the workflow may have changed or been deleted.
            let Some(mut workflow) = self.repository.find_by_id(candidate.id).await? else {
                continue;
            };
            let Some(node) = workflow.detach_instance(instance_id) else {
                continue;
            };
            self.repository.save(&mut workflow).await?;
            detached += 1;

            debug!(workflow_id = %workflow.id, node_id = %node.id, instance_id = %instance_id, "Node detached by cascade");
            self.event_bus.publish_workflow_event(WorkflowEvent::NodeDetached {
                workflow_id: workflow.id,
                node_id: node.id,
                instance_id,
                cascaded: true,
                detached_at: Utc::now(),
            });
        }

        if detached > 0 {
            info!(instance_id = %instance_id, detached, "Instance detached from workflows");
            metrics::counter!("agenthub.workflow.cascade.detached").increment(detached as u64);
        }
        Ok(detached)
    }
}
