// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentId;
use crate::domain::deployment::{InstanceId, InstanceStatus};
use crate::domain::workflow::{NodeId, WorkflowId, WorkflowStatus};

/// Deployment registry events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeploymentEvent {
    InstanceDeployed {
        instance_id: InstanceId,
        agent_id: AgentId,
        deployed_at: DateTime<Utc>,
    },
    InstanceStatusChanged {
        instance_id: InstanceId,
        from: InstanceStatus,
        to: InstanceStatus,
        changed_at: DateTime<Utc>,
    },
    InstanceRemoved {
        instance_id: InstanceId,
        agent_id: AgentId,
        /// Number of workflow nodes removed by the cascade.
        detached_nodes: usize,
        removed_at: DateTime<Utc>,
    },
}

/// Workflow orchestrator events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowCreated {
        workflow_id: WorkflowId,
        name: String,
        created_at: DateTime<Utc>,
    },
    NodeAttached {
        workflow_id: WorkflowId,
        node_id: NodeId,
        instance_id: InstanceId,
        position: usize,
        attached_at: DateTime<Utc>,
    },
    NodeDetached {
        workflow_id: WorkflowId,
        node_id: NodeId,
        instance_id: InstanceId,
        /// `true` when removed by an instance removal rather than a direct request.
        cascaded: bool,
        detached_at: DateTime<Utc>,
    },
    WorkflowRenamed {
        workflow_id: WorkflowId,
        name: String,
        renamed_at: DateTime<Utc>,
    },
    WorkflowStatusChanged {
        workflow_id: WorkflowId,
        from: WorkflowStatus,
        to: WorkflowStatus,
        changed_at: DateTime<Utc>,
    },
    WorkflowDeleted {
        workflow_id: WorkflowId,
        deleted_at: DateTime<Utc>,
    },
}
