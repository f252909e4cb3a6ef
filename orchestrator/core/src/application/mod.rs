// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod locks;
pub mod deployment_registry;
pub mod workflow_orchestrator;
pub mod stats;
pub mod repository_factory;
pub mod hub;

// Re-export services for convenience
pub use deployment_registry::{DeploymentRegistry, StandardDeploymentRegistry, InstanceDirectory, InstanceLease, WorkflowCascade};
pub use workflow_orchestrator::{WorkflowOrchestrator, StandardWorkflowOrchestrator};
pub use stats::HubStats;
pub use hub::AgentHub;
