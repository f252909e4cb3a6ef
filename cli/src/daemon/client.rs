// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with daemon API

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use agenthub_core::application::stats::HubStats;
use agenthub_core::domain::agent::Agent;
use agenthub_core::domain::deployment::{DeployedAgentView, DeployedInstance, InstanceId, InstanceStatus};
use agenthub_core::domain::workflow::{NodeId, Workflow, WorkflowId, WorkflowStatus};

use super::Endpoint;

#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

/// Error body returned by the daemon.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: String,
}

/// One decoded Server-Sent-Events frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl DaemonClient {
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        Self::with_base_url(endpoint.base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        // No global timeout: the event stream is long-lived.
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-success response into an error carrying the daemon's message.
    async fn ensure_success(response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => anyhow::bail!("Failed to {}: {} ({})", action, body.error, body.kind),
            Err(_) => anyhow::bail!("Failed to {}: HTTP {} {}", action, status, text),
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
        let response = Self::ensure_success(response, action).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response to {}", action))
    }

    // ------------------------------------------------------------------
    // Catalog and deployments
    // ------------------------------------------------------------------

    pub async fn list_agents(
        &self,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<Agent>> {
        let mut query = Vec::new();
        if let Some(category) = category {
            query.push(("category", category));
        }
        if let Some(search) = search {
            query.push(("search", search));
        }

        let response = self
            .client
            .get(self.url("/api/agents"))
            .query(&query)
            .send()
            .await
            .context("Failed to list agents")?;
        Self::parse(response, "list agents").await
    }

    pub async fn deploy(&self, agent_id: &str) -> Result<DeployedInstance> {
        let response = self
            .client
            .post(self.url("/api/deploy"))
            .json(&json!({ "agentId": agent_id }))
            .send()
            .await
            .context("Failed to deploy agent")?;
        Self::parse(response, "deploy agent").await
    }

    pub async fn list_deployed(&self) -> Result<Vec<DeployedAgentView>> {
        let response = self
            .client
            .get(self.url("/api/deployed"))
            .send()
            .await
            .context("Failed to list instances")?;
        Self::parse(response, "list instances").await
    }

    pub async fn set_instance_status(
        &self,
        id: InstanceId,
        status: InstanceStatus,
    ) -> Result<DeployedInstance> {
        let response = self
            .client
            .patch(self.url(&format!("/api/deployed/{}", id)))
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await
            .context("Failed to update instance")?;
        Self::parse(response, "update instance").await
    }

    pub async fn remove_instance(&self, id: InstanceId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/deployed/{}", id)))
            .send()
            .await
            .context("Failed to remove instance")?;
        Self::ensure_success(response, "remove instance").await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Workflows
    // ------------------------------------------------------------------

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let response = self
            .client
            .get(self.url("/api/workflows"))
            .send()
            .await
            .context("Failed to list workflows")?;
        Self::parse(response, "list workflows").await
    }

    pub async fn get_workflow(&self, id: WorkflowId) -> Result<Workflow> {
        let response = self
            .client
            .get(self.url(&format!("/api/workflows/{}", id)))
            .send()
            .await
            .context("Failed to get workflow")?;
        Self::parse(response, "get workflow").await
    }

    pub async fn create_workflow(
        &self,
        name: Option<String>,
        nodes: Vec<InstanceId>,
    ) -> Result<Workflow> {
        let response = self
            .client
            .post(self.url("/api/workflows"))
            .json(&json!({ "name": name, "nodes": nodes }))
            .send()
            .await
            .context("Failed to create workflow")?;
        Self::parse(response, "create workflow").await
    }

    pub async fn attach_node(&self, id: WorkflowId, instance: InstanceId) -> Result<Workflow> {
        let response = self
            .client
            .post(self.url(&format!("/api/workflows/{}/nodes", id)))
            .json(&json!({ "agentInstanceId": instance }))
            .send()
            .await
            .context("Failed to attach node")?;
        Self::parse(response, "attach node").await
    }

    pub async fn detach_node(&self, id: WorkflowId, node: NodeId) -> Result<Workflow> {
        let response = self
            .client
            .delete(self.url(&format!("/api/workflows/{}/nodes/{}", id, node)))
            .send()
            .await
            .context("Failed to detach node")?;
        Self::parse(response, "detach node").await
    }

    pub async fn rename_workflow(&self, id: WorkflowId, name: &str) -> Result<Workflow> {
        self.patch_workflow(id, json!({ "name": name }), "rename workflow")
            .await
    }

    pub async fn set_workflow_status(
        &self,
        id: WorkflowId,
        status: WorkflowStatus,
    ) -> Result<Workflow> {
        self.patch_workflow(id, json!({ "status": status.as_str() }), "update workflow status")
            .await
    }

    async fn patch_workflow(
        &self,
        id: WorkflowId,
        body: serde_json::Value,
        action: &str,
    ) -> Result<Workflow> {
        let response = self
            .client
            .patch(self.url(&format!("/api/workflows/{}", id)))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;
        Self::parse(response, action).await
    }

    pub async fn delete_workflow(&self, id: WorkflowId) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/workflows/{}", id)))
            .send()
            .await
            .context("Failed to delete workflow")?;
        Self::ensure_success(response, "delete workflow").await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats and events
    // ------------------------------------------------------------------

    pub async fn stats(&self) -> Result<HubStats> {
        let response = self
            .client
            .get(self.url("/api/stats"))
            .send()
            .await
            .context("Failed to get stats")?;
        Self::parse(response, "get stats").await
    }

    /// Follow `/api/events` until the daemon closes the stream.
    pub async fn stream_events(
        &self,
        workflow: Option<WorkflowId>,
        mut on_frame: impl FnMut(SseFrame),
    ) -> Result<()> {
        let mut request = self.client.get(self.url("/api/events"));
        if let Some(workflow) = workflow {
            request = request.query(&[("workflowId", workflow.to_string())]);
        }

        let response = request.send().await.context("Failed to open event stream")?;
        let response = Self::ensure_success(response, "open event stream").await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Event stream interrupted")?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            for frame in drain_frames(&mut buffer) {
                on_frame(frame);
            }
        }

        Ok(())
    }
}

/// Removes every complete frame from `buffer`, leaving any partial tail.
/// Comment-only frames (keep-alives) are dropped.
pub fn drain_frames(buffer: &mut String) -> Vec<SseFrame> {
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }

    let mut frames = Vec::new();
    while let Some(end) = buffer.find("\n\n") {
        let raw: String = buffer.drain(..end + 2).collect();

        let mut event = None;
        let mut data = Vec::new();
        for line in raw.lines() {
            if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }

        if !data.is_empty() {
            frames.push(SseFrame {
                event,
                data: data.join("\n"),
            });
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_drain_frames_keeps_partial_tail() {
        let mut buffer = String::from(
            ": keep-alive\n\nevent: workflow\ndata: {\"a\":1}\n\nevent: deploy",
        );
        let frames = drain_frames(&mut buffer);
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("workflow".to_string()),
                data: "{\"a\":1}".to_string(),
            }]
        );
        assert_eq!(buffer, "event: deploy");

        buffer.push_str("ment\ndata: x\r\n\r\n");
        let frames = drain_frames(&mut buffer);
        assert_eq!(frames[0].event.as_deref(), Some("deployment"));
        assert_eq!(frames[0].data, "x");
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_list_agents_sends_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/agents")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("category".into(), "Data".into()),
                Matcher::UrlEncoded("search".into(), "etl".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":"etl-pipeline","name":"ETL Pipeline","icon":"🔄","category":"Data","price":0}]"#,
            )
            .create_async()
            .await;

        let client = DaemonClient::with_base_url(server.url()).unwrap();
        let agents = client.list_agents(Some("Data"), Some("etl")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id.as_str(), "etl-pipeline");
        assert!(agents[0].is_free());
    }

    #[tokio::test]
    async fn test_error_body_becomes_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/api/deploy")
            .match_body(Matcher::Json(json!({ "agentId": "code-reviewer" })))
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Agent code-reviewer is already deployed","kind":"already_deployed"}"#)
            .create_async()
            .await;

        let client = DaemonClient::with_base_url(server.url()).unwrap();
        let err = client.deploy("code-reviewer").await.unwrap_err().to_string();
        assert!(err.contains("already deployed"), "{}", err);
        assert!(err.contains("already_deployed"), "{}", err);
    }

    #[tokio::test]
    async fn test_set_workflow_status_patches_status() {
        let mut server = mockito::Server::new_async().await;
        let id = WorkflowId::new();
        let body = json!({
            "id": id,
            "name": "Pipeline",
            "status": "running",
            "nodes": [],
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:01Z",
        });
        let mock = server
            .mock("PATCH", format!("/api/workflows/{}", id).as_str())
            .match_body(Matcher::Json(json!({ "status": "running" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = DaemonClient::with_base_url(server.url()).unwrap();
        let workflow = client
            .set_workflow_status(id, WorkflowStatus::Running)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(workflow.id, id);
        assert_eq!(workflow.status, WorkflowStatus::Running);
    }

    #[tokio::test]
    async fn test_remove_instance_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let id = InstanceId::new();
        let mock = server
            .mock("DELETE", format!("/api/deployed/{}", id).as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = DaemonClient::with_base_url(server.url()).unwrap();
        client.remove_instance(id).await.unwrap();
        mock.assert_async().await;
    }
}
