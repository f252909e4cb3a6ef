// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Caller-visible orchestration errors.
//!
//! Every variant except [`OrchestrationError::Repository`] is a rejection of
//! the request itself: the caller must change the request before retrying.
//! A failed operation never leaves a partial mutation behind.

use crate::domain::agent::AgentId;
use crate::domain::deployment::InstanceId;
use crate::domain::repository::RepositoryError;
use crate::domain::workflow::WorkflowId;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Instance,
    Workflow,
    Node,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Agent => "Agent",
            EntityKind::Instance => "Deployed instance",
            EntityKind::Workflow => "Workflow",
            EntityKind::Node => "Workflow node",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Agent {0} is already deployed")]
    AlreadyDeployed(AgentId),

    #[error("Deployed instance {0} is not running")]
    InstanceNotRunning(InstanceId),

    #[error("Deployed instance {instance_id} is already part of workflow {workflow_id}")]
    DuplicateNode {
        workflow_id: WorkflowId,
        instance_id: InstanceId,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl OrchestrationError {
    pub fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        OrchestrationError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable snake_case tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationError::NotFound { .. } => "not_found",
            OrchestrationError::AlreadyDeployed(_) => "already_deployed",
            OrchestrationError::InstanceNotRunning(_) => "instance_not_running",
            OrchestrationError::DuplicateNode { .. } => "duplicate_node",
            OrchestrationError::Validation(_) => "validation",
            OrchestrationError::Repository(_) => "repository",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = OrchestrationError::not_found(EntityKind::Workflow, "wf-1");
        assert_eq!(err.to_string(), "Workflow not found: wf-1");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn repository_errors_convert() {
        let err: OrchestrationError = RepositoryError::Database("boom".into()).into();
        assert_eq!(err.kind(), "repository");
    }
}
