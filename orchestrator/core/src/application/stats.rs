// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Read-only aggregate statistics over the registry and the orchestrator.
//! Nothing here is persisted; every call recomputes from current state.

use serde::{Deserialize, Serialize};

use crate::application::deployment_registry::DeploymentRegistry;
use crate::application::workflow_orchestrator::WorkflowOrchestrator;
use crate::domain::deployment::DeployedInstance;
use crate::domain::error::OrchestrationError;
use crate::domain::workflow::Workflow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub total_deployed: usize,
    pub running_instances: usize,
    /// Workflows whose status is `running`.
    pub active_workflows: usize,
    pub total_workflows: usize,
    /// Percentage of deployed instances that are running, one decimal.
    /// 100.0 when nothing is deployed.
    pub uptime: f64,
}

impl HubStats {
    pub fn compute(instances: &[DeployedInstance], workflows: &[Workflow]) -> Self {
        let total_deployed = instances.len();
        let running_instances = instances.iter().filter(|i| i.is_running()).count();
        let uptime = if total_deployed == 0 {
            100.0
        } else {
            let pct = running_instances as f64 * 100.0 / total_deployed as f64;
            (pct * 10.0).round() / 10.0
        };

        Self {
            total_deployed,
            running_instances,
            active_workflows: workflows.iter().filter(|w| w.is_running()).count(),
            total_workflows: workflows.len(),
            uptime,
        }
    }

    pub async fn collect(
        registry: &dyn DeploymentRegistry,
        orchestrator: &dyn WorkflowOrchestrator,
    ) -> Result<Self, OrchestrationError> {
        let instances = registry.list().await?;
        let workflows = orchestrator.list().await?;
        Ok(Self::compute(&instances, &workflows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentId;
    use crate::domain::deployment::InstanceStatus;
    use crate::domain::workflow::WorkflowStatus;

    #[test]
    fn empty_hub_reports_full_uptime() {
        let stats = HubStats::compute(&[], &[]);
        assert_eq!(stats.total_deployed, 0);
        assert_eq!(stats.uptime, 100.0);
    }

    #[test]
    fn uptime_is_rounded_to_one_decimal() {
        let mut stopped = DeployedInstance::new(AgentId::from("b"));
        stopped.transition_to(InstanceStatus::Stopped);
        let instances = vec![
            DeployedInstance::new(AgentId::from("a")),
            stopped,
            DeployedInstance::new(AgentId::from("c")),
        ];
        let mut running = Workflow::new("w1").unwrap();
        running.transition_to(WorkflowStatus::Running);
        let idle = Workflow::new("w2").unwrap();

        let stats = HubStats::compute(&instances, &[running, idle]);
        assert_eq!(stats.running_instances, 2);
        assert_eq!(stats.uptime, 66.7);
        assert_eq!(stats.active_workflows, 1);
        assert_eq!(stats.total_workflows, 2);
    }
}
