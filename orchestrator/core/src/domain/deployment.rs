// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployed Instance Domain Model
//!
//! A [`DeployedInstance`] is one activation of a catalog agent. At most one
//! instance exists per [`AgentId`] at any time; that invariant is enforced by
//! the deployment registry, not by this value type.
//!
//! # Lifecycle
//!
//! ```text
//! deploy ──► Running ◄──► Stopped ──► removed
//!               └──────────────────────► removed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentId};

/// Unique identifier generated at deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Running,
    Stopped,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(InstanceStatus::Running),
            "stopped" => Ok(InstanceStatus::Stopped),
            other => Err(format!("unknown instance status '{}' (expected running|stopped)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedInstance {
    pub id: InstanceId,
    pub agent_id: AgentId,
    pub status: InstanceStatus,
    pub deployed_at: DateTime<Utc>,
}

impl DeployedInstance {
    /// Fresh deployment; instances start `Running` so they can be attached immediately.
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            id: InstanceId::new(),
            agent_id,
            status: InstanceStatus::Running,
            deployed_at: Utc::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == InstanceStatus::Running
    }

    /// Returns `true` when the status actually changed.
    pub fn transition_to(&mut self, status: InstanceStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}

/// Instance joined with its catalog entry for display. `agent` is `None`
/// when the catalog no longer lists the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedAgentView {
    #[serde(flatten)]
    pub instance: DeployedInstance,
    pub agent: Option<Agent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_instance_is_running() {
        let instance = DeployedInstance::new(AgentId::from("writer"));
        assert!(instance.is_running());
        assert_eq!(instance.agent_id.as_str(), "writer");
    }

    #[test]
    fn transition_reports_change_only_once() {
        let mut instance = DeployedInstance::new(AgentId::from("writer"));
        assert!(!instance.transition_to(InstanceStatus::Running));
        assert!(instance.transition_to(InstanceStatus::Stopped));
        assert!(!instance.transition_to(InstanceStatus::Stopped));
        assert_eq!(instance.status, InstanceStatus::Stopped);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Running".parse::<InstanceStatus>(), Ok(InstanceStatus::Running));
        assert_eq!(" stopped ".parse::<InstanceStatus>(), Ok(InstanceStatus::Stopped));
        assert!("paused".parse::<InstanceStatus>().is_err());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let instance = DeployedInstance::new(AgentId::from("writer"));
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["agentId"], "writer");
        assert_eq!(json["status"], "running");
        assert!(json.get("deployedAt").is_some());
    }

    #[test]
    fn view_flattens_instance_fields() {
        let instance = DeployedInstance::new(AgentId::from("writer"));
        let view = DeployedAgentView { instance: instance.clone(), agent: None };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], serde_json::json!(instance.id));
        assert!(json["agent"].is_null());
    }
}
