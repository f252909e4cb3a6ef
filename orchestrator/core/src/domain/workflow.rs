// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workflow Domain Model
//!
//! A workflow is a named, ordered pipeline of deployed instances. Nodes form a
//! linear chain: position in `nodes` is execution order, left to right.
//!
//! # Architectural Context
//!
//! - **Aggregate Root:** [`Workflow`]
//! - **Entities:** [`WorkflowNode`] (owned exclusively by its workflow)
//!
//! # Invariants
//!
//! - A given `agent_instance_id` appears at most once in `nodes`.
//! - Nodes are only appended; removal keeps the relative order of the rest.
//! - Status is a direct toggle between `Inactive` and `Running`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::agent::Agent;
use crate::domain::deployment::InstanceId;
use crate::domain::error::{EntityKind, OrchestrationError};

// ============================================================================
// Value Objects: Identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a node, unique within its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Inactive,
    Running,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Inactive => "inactive",
            WorkflowStatus::Running => "running",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inactive" => Ok(WorkflowStatus::Inactive),
            "running" => Ok(WorkflowStatus::Running),
            other => Err(format!("unknown workflow status '{}' (expected inactive|running)", other)),
        }
    }
}

// ============================================================================
// Entity: WorkflowNode
// ============================================================================

/// One pipeline position. `name` and `icon` are copied from the agent when the
/// node is attached and are not refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: NodeId,
    pub agent_instance_id: InstanceId,
    pub name: String,
    pub icon: String,
}

impl WorkflowNode {
    pub fn new(agent_instance_id: InstanceId, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            agent_instance_id,
            name: name.into(),
            icon: icon.into(),
        }
    }

    pub fn for_agent(agent_instance_id: InstanceId, agent: &Agent) -> Self {
        Self::new(agent_instance_id, agent.name.clone(), agent.icon.clone())
    }
}

// ============================================================================
// Aggregate Root: Workflow
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub status: WorkflowStatus,
    pub nodes: Vec<WorkflowNode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of saves applied. A save carrying a stale version is rejected.
    #[serde(default)]
    pub version: u64,
}

impl Workflow {
    /// New workflows are `Inactive` with no nodes.
    pub fn new(name: impl Into<String>) -> Result<Self, OrchestrationError> {
        let name = Self::validate_name(name.into())?;
        let now = Utc::now();
        Ok(Self {
            id: WorkflowId::new(),
            name,
            status: WorkflowStatus::Inactive,
            nodes: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    fn validate_name(name: String) -> Result<String, OrchestrationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(OrchestrationError::Validation(
                "Workflow name cannot be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    pub fn is_running(&self) -> bool {
        self.status == WorkflowStatus::Running
    }

    pub fn contains_instance(&self, instance_id: InstanceId) -> bool {
        self.nodes.iter().any(|n| n.agent_instance_id == instance_id)
    }

    /// Instance ids in pipeline order.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.nodes.iter().map(|n| n.agent_instance_id).collect()
    }

    /// Append `node` to the end of the pipeline.
    pub fn attach(&mut self, node: WorkflowNode) -> Result<&WorkflowNode, OrchestrationError> {
        if self.contains_instance(node.agent_instance_id) {
            return Err(OrchestrationError::DuplicateNode {
                workflow_id: self.id,
                instance_id: node.agent_instance_id,
            });
        }
        self.nodes.push(node);
        self.touch();
        Ok(&self.nodes[self.nodes.len() - 1])
    }

    /// Remove a node by id, keeping the order of the remaining nodes.
    pub fn detach(&mut self, node_id: NodeId) -> Result<WorkflowNode, OrchestrationError> {
        let position = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| OrchestrationError::not_found(EntityKind::Node, node_id))?;
        let removed = self.nodes.remove(position);
        self.touch();
        Ok(removed)
    }

    /// Remove the node referencing `instance_id`, if any.
    pub fn detach_instance(&mut self, instance_id: InstanceId) -> Option<WorkflowNode> {
        let position = self
            .nodes
            .iter()
            .position(|n| n.agent_instance_id == instance_id)?;
        let removed = self.nodes.remove(position);
        self.touch();
        Some(removed)
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), OrchestrationError> {
        self.name = Self::validate_name(name.into())?;
        self.touch();
        Ok(())
    }

    /// Returns `true` when the status actually changed.
    pub fn transition_to(&mut self, status: WorkflowStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(instance: InstanceId) -> WorkflowNode {
        WorkflowNode::new(instance, "Agent", "🤖")
    }

    #[test]
    fn new_workflow_is_inactive_and_empty() {
        let workflow = Workflow::new("Workflow 1").unwrap();
        assert_eq!(workflow.status, WorkflowStatus::Inactive);
        assert!(workflow.nodes.is_empty());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            Workflow::new("   "),
            Err(OrchestrationError::Validation(_))
        ));
        let mut workflow = Workflow::new("ok").unwrap();
        assert!(workflow.rename("").is_err());
        assert_eq!(workflow.name, "ok");
    }

    #[test]
    fn attach_appends_in_order() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        let (a, b, c) = (InstanceId::new(), InstanceId::new(), InstanceId::new());
        workflow.attach(node(a)).unwrap();
        workflow.attach(node(b)).unwrap();
        workflow.attach(node(c)).unwrap();
        assert_eq!(workflow.instance_ids(), vec![a, b, c]);
    }

    #[test]
    fn attaching_same_instance_twice_is_rejected() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        let a = InstanceId::new();
        workflow.attach(node(a)).unwrap();
        let err = workflow.attach(node(a)).unwrap_err();
        assert!(matches!(err, OrchestrationError::DuplicateNode { .. }));
        assert_eq!(workflow.nodes.len(), 1);
    }

    #[test]
    fn detach_preserves_relative_order() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        let ids: Vec<InstanceId> = (0..4).map(|_| InstanceId::new()).collect();
        for id in &ids {
            workflow.attach(node(*id)).unwrap();
        }
        let second = workflow.nodes[1].id;
        workflow.detach(second).unwrap();
        assert_eq!(workflow.instance_ids(), vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn detach_unknown_node_is_not_found() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        let err = workflow.detach(NodeId::new()).unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::NotFound { kind: EntityKind::Node, .. }
        ));
    }

    #[test]
    fn detach_instance_is_silent_when_absent() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        assert!(workflow.detach_instance(InstanceId::new()).is_none());
    }

    #[test]
    fn attach_then_detach_restores_nodes() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        workflow.attach(node(InstanceId::new())).unwrap();
        let before = workflow.nodes.clone();

        let node_id = workflow.attach(node(InstanceId::new())).unwrap().id;
        workflow.detach(node_id).unwrap();
        assert_eq!(workflow.nodes, before);
    }

    #[test]
    fn status_toggle_is_direct() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        assert!(workflow.transition_to(WorkflowStatus::Running));
        assert!(workflow.is_running());
        assert!(!workflow.transition_to(WorkflowStatus::Running));
        assert!(workflow.transition_to(WorkflowStatus::Inactive));
    }

    #[test]
    fn nodes_serialize_camel_case() {
        let mut workflow = Workflow::new("pipeline").unwrap();
        let a = InstanceId::new();
        workflow.attach(node(a)).unwrap();
        let json = serde_json::to_value(&workflow).unwrap();
        assert_eq!(json["status"], "inactive");
        assert_eq!(json["nodes"][0]["agentInstanceId"], serde_json::json!(a));
    }
}
