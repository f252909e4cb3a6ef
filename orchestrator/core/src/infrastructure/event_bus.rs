// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// In-memory event streaming over a tokio broadcast channel. Feeds the SSE
// endpoint and any in-process observers. Events are not persisted.

use crate::domain::events::{DeploymentEvent, WorkflowEvent};
use crate::domain::workflow::WorkflowId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Deployment(DeploymentEvent),
    Workflow(WorkflowEvent),
}

impl DomainEvent {
    /// Workflow the event belongs to, if it is a workflow event.
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        match self {
            DomainEvent::Deployment(_) => None,
            DomainEvent::Workflow(event) => Some(match event {
                WorkflowEvent::WorkflowCreated { workflow_id, .. }
                | WorkflowEvent::NodeAttached { workflow_id, .. }
                | WorkflowEvent::NodeDetached { workflow_id, .. }
                | WorkflowEvent::WorkflowRenamed { workflow_id, .. }
                | WorkflowEvent::WorkflowStatusChanged { workflow_id, .. }
                | WorkflowEvent::WorkflowDeleted { workflow_id, .. } => *workflow_id,
            }),
        }
    }
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity is the number of buffered events before slow receivers lag.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_deployment_event(&self, event: DeploymentEvent) {
        self.publish(DomainEvent::Deployment(event));
    }

    pub fn publish_workflow_event(&self, event: WorkflowEvent) {
        self.publish(DomainEvent::Workflow(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            workflow_id: None,
        }
    }

    /// Subscribe to the events of a single workflow. Deployment events and
    /// events of other workflows are skipped.
    pub fn subscribe_workflow(&self, workflow_id: WorkflowId) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            workflow_id: Some(workflow_id),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for domain events, optionally narrowed to one workflow
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    workflow_id: Option<WorkflowId>,
}

impl EventReceiver {
    fn accepts(&self, event: &DomainEvent) -> bool {
        self.workflow_id.is_none() || event.workflow_id() == self.workflow_id
    }

    /// Receive the next matching event (waits until one is available)
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Try to receive a matching event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(|e| match e {
                broadcast::error::TryRecvError::Empty => EventBusError::Empty,
                broadcast::error::TryRecvError::Closed => EventBusError::Closed,
                broadcast::error::TryRecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
