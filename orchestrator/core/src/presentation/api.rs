// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::hub::AgentHub;
use crate::domain::agent::{AgentId, CatalogFilter};
use crate::domain::deployment::{InstanceId, InstanceStatus};
use crate::domain::error::OrchestrationError;
use crate::domain::workflow::{NodeId, WorkflowId, WorkflowStatus};
use crate::infrastructure::event_bus::{DomainEvent, EventBusError};

pub struct AppState {
    pub hub: AgentHub,
}

pub fn app(hub: AgentHub) -> Router {
    let state = Arc::new(AppState { hub });

    Router::new()
        .route("/health", get(health))
        .route("/api/agents", get(list_agents))
        .route("/api/deploy", post(deploy_agent))
        .route("/api/deployed", get(list_deployed))
        .route(
            "/api/deployed/{id}",
            get(get_deployed).patch(update_deployed).delete(remove_deployed),
        )
        .route("/api/workflows", get(list_workflows).post(create_workflow))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).patch(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/nodes", post(attach_node))
        .route("/api/workflows/{id}/nodes/{node_id}", delete(detach_node))
        .route("/api/stats", get(stats))
        .route("/api/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Orchestration error rendered as `{"error", "kind"}` with a matching status.
pub struct ApiError(OrchestrationError);

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OrchestrationError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrchestrationError::AlreadyDeployed(_)
            | OrchestrationError::DuplicateNode { .. }
            | OrchestrationError::InstanceNotRunning(_) => StatusCode::CONFLICT,
            OrchestrationError::Validation(_) => StatusCode::BAD_REQUEST,
            OrchestrationError::Repository(e) => {
                tracing::error!("Repository failure while serving request: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({ "error": self.0.to_string(), "kind": self.0.kind() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn invalid(what: &str, raw: &str) -> ApiError {
    ApiError(OrchestrationError::Validation(format!("invalid {} '{}'", what, raw)))
}

fn parse_instance_id(raw: &str) -> ApiResult<InstanceId> {
    InstanceId::from_string(raw).map_err(|_| invalid("instance id", raw))
}

fn parse_workflow_id(raw: &str) -> ApiResult<WorkflowId> {
    WorkflowId::from_string(raw).map_err(|_| invalid("workflow id", raw))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let started_at = state.hub.started_at();
    Json(json!({
        "status": "healthy",
        "startedAt": started_at,
        "uptimeSeconds": (Utc::now() - started_at).num_seconds(),
    }))
}

// ---------------------------------------------------------------------------
// Catalog and deployments
// ---------------------------------------------------------------------------

async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CatalogFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.hub.list_agents(&filter).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub agent_id: String,
}

async fn deploy_agent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeployRequest>,
) -> ApiResult<impl IntoResponse> {
    let instance = state.hub.registry().deploy(&AgentId::new(payload.agent_id)).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

async fn list_deployed(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.hub.registry().list_with_agents().await?))
}

async fn get_deployed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_instance_id(&id)?;
    Ok(Json(state.hub.registry().get_with_agent(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

async fn update_deployed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_instance_id(&id)?;
    let status: InstanceStatus = payload
        .status
        .parse()
        .map_err(|e: String| ApiError(OrchestrationError::Validation(e)))?;
    Ok(Json(state.hub.registry().set_status(id, status).await?))
}

async fn remove_deployed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_instance_id(&id)?;
    state.hub.registry().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

async fn list_workflows(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.hub.orchestrator().list().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Instance ids to attach, in pipeline order.
    #[serde(default)]
    pub nodes: Vec<InstanceId>,
}

async fn create_workflow(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> ApiResult<impl IntoResponse> {
    let workflow = state
        .hub
        .orchestrator()
        .create(payload.name, payload.nodes)
        .await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_workflow_id(&id)?;
    Ok(Json(state.hub.orchestrator().get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkflowRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Applies the rename first, then the status change.
async fn update_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateWorkflowRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_workflow_id(&id)?;
    let status = payload
        .status
        .as_deref()
        .map(str::parse::<WorkflowStatus>)
        .transpose()
        .map_err(|e| ApiError(OrchestrationError::Validation(e)))?;

    let workflow = state
        .hub
        .orchestrator()
        .update(id, payload.name, status)
        .await?;
    Ok(Json(workflow))
}

async fn delete_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_workflow_id(&id)?;
    state.hub.orchestrator().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachNodeRequest {
    pub agent_instance_id: String,
}

async fn attach_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AttachNodeRequest>,
) -> ApiResult<impl IntoResponse> {
    let workflow_id = parse_workflow_id(&id)?;
    let instance_id = parse_instance_id(&payload.agent_instance_id)?;
    Ok(Json(
        state
            .hub
            .orchestrator()
            .attach_node(workflow_id, instance_id)
            .await?,
    ))
}

async fn detach_node(
    State(state): State<Arc<AppState>>,
    Path((id, node_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let workflow_id = parse_workflow_id(&id)?;
    let node_id = NodeId::from_string(&node_id).map_err(|_| invalid("node id", &node_id))?;
    Ok(Json(
        state.hub.orchestrator().detach_node(workflow_id, node_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// Stats and events
// ---------------------------------------------------------------------------

async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.hub.stats().await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    /// Only stream events of this workflow.
    #[serde(default)]
    pub workflow_id: Option<WorkflowId>,
}

fn event_name(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::Deployment(_) => "deployment",
        DomainEvent::Workflow(_) => "workflow",
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let event_bus = state.hub.event_bus();
    let receiver = match query.workflow_id {
        Some(workflow_id) => event_bus.subscribe_workflow(workflow_id),
        None => event_bus.subscribe(),
    };

    let events = stream::unfold(receiver, |mut receiver| async move {
        match receiver.recv().await {
            Ok(event) => {
                let sse = Event::default()
                    .event(event_name(&event))
                    .json_data(&event)
                    .unwrap_or_else(|_| Event::default().comment("unserializable event"));
                Some((Ok(sse), receiver))
            }
            Err(EventBusError::Lagged(n)) => {
                let notice = Event::default().comment(format!("lagged by {} events", n));
                Some((Ok(notice), receiver))
            }
            Err(_) => None,
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
