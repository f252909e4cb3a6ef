// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the deployment registry and workflow orchestrator
//! wired together through `AgentHub`:
//! 1. Deploy / duplicate deploy
//! 2. Workflow creation, attach, detach
//! 3. Cascade on instance removal
//! 4. Start policy for workflows referencing stopped instances

use agenthub_core::application::hub::AgentHub;
use agenthub_core::domain::agent::{Agent, AgentId};
use agenthub_core::domain::deployment::{InstanceId, InstanceStatus};
use agenthub_core::domain::error::{EntityKind, OrchestrationError};
use agenthub_core::domain::events::WorkflowEvent;
use agenthub_core::domain::workflow::{NodeId, WorkflowId, WorkflowStatus};
use agenthub_core::infrastructure::event_bus::DomainEvent;
use agenthub_core::infrastructure::repositories::InMemoryAgentCatalog;
use std::sync::Arc;

fn agent(id: &str, icon: &str) -> Agent {
    Agent {
        id: AgentId::from(id),
        name: format!("{} Agent", id.to_uppercase()),
        icon: icon.to_string(),
        category: "Development".to_string(),
        price: 0,
        vendor: "Acme AI".to_string(),
        description: format!("Agent {}", id),
        rating: 4.5,
        reviews: 10,
    }
}

fn hub() -> AgentHub {
    let catalog = InMemoryAgentCatalog::new(vec![
        agent("a1", "🧑‍💻"),
        agent("a2", "📊"),
        agent("a3", "🛡️"),
    ]);
    AgentHub::in_memory(Arc::new(catalog))
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let hub = hub();
    let registry = hub.registry();
    let orchestrator = hub.orchestrator();

    let a1 = registry.deploy(&AgentId::from("a1")).await.unwrap();
    assert_eq!(a1.status, InstanceStatus::Running);

    let again = registry.deploy(&AgentId::from("a1")).await.unwrap_err();
    assert!(matches!(again, OrchestrationError::AlreadyDeployed(_)));

    let w1 = orchestrator.create(Some("W1".to_string()), vec![]).await.unwrap();
    assert!(w1.nodes.is_empty());
    assert_eq!(w1.status, WorkflowStatus::Inactive);

    let w1 = orchestrator.attach_node(w1.id, a1.id).await.unwrap();
    assert_eq!(w1.instance_ids(), vec![a1.id]);

    let dup = orchestrator.attach_node(w1.id, a1.id).await.unwrap_err();
    assert!(matches!(dup, OrchestrationError::DuplicateNode { .. }));
    assert_eq!(orchestrator.get(w1.id).await.unwrap().nodes.len(), 1);

    registry.remove(a1.id).await.unwrap();
    assert!(orchestrator.get(w1.id).await.unwrap().nodes.is_empty());

    let started = orchestrator.set_status(w1.id, WorkflowStatus::Running).await.unwrap();
    assert!(started.is_running());
}

#[tokio::test]
async fn test_node_copies_agent_display_fields() {
    let hub = hub();
    let instance = hub.registry().deploy(&AgentId::from("a2")).await.unwrap();
    let workflow = hub.orchestrator().create(None, vec![]).await.unwrap();

    let workflow = hub.orchestrator().attach_node(workflow.id, instance.id).await.unwrap();
    assert_eq!(workflow.nodes[0].name, "A2 Agent");
    assert_eq!(workflow.nodes[0].icon, "📊");
    assert_eq!(workflow.nodes[0].agent_instance_id, instance.id);
}

#[tokio::test]
async fn test_default_names_are_sequential() {
    let hub = hub();
    let orchestrator = hub.orchestrator();
    let first = orchestrator.create(None, vec![]).await.unwrap();
    let second = orchestrator.create(Some("   ".to_string()), vec![]).await.unwrap();
    assert_eq!(first.name, "Workflow 1");
    assert_eq!(second.name, "Workflow 2");

    let listed: Vec<WorkflowId> = orchestrator.list().await.unwrap().iter().map(|w| w.id).collect();
    assert_eq!(listed, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_attach_requires_running_instance() {
    let hub = hub();
    let instance = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    hub.registry().set_status(instance.id, InstanceStatus::Stopped).await.unwrap();
    let workflow = hub.orchestrator().create(None, vec![]).await.unwrap();

    let err = hub.orchestrator().attach_node(workflow.id, instance.id).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::InstanceNotRunning(id) if id == instance.id));
}

#[tokio::test]
async fn test_attach_unknown_entities_is_not_found() {
    let hub = hub();
    let instance = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let workflow = hub.orchestrator().create(None, vec![]).await.unwrap();

    let missing_instance = hub
        .orchestrator()
        .attach_node(workflow.id, InstanceId::new())
        .await
        .unwrap_err();
    assert!(matches!(
        missing_instance,
        OrchestrationError::NotFound { kind: EntityKind::Instance, .. }
    ));

    let missing_workflow = hub
        .orchestrator()
        .attach_node(WorkflowId::new(), instance.id)
        .await
        .unwrap_err();
    assert!(matches!(
        missing_workflow,
        OrchestrationError::NotFound { kind: EntityKind::Workflow, .. }
    ));
}

#[tokio::test]
async fn test_attach_then_detach_restores_nodes() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let a2 = hub.registry().deploy(&AgentId::from("a2")).await.unwrap();
    let workflow = hub.orchestrator().create(None, vec![a1.id]).await.unwrap();
    let before = workflow.nodes.clone();

    let attached = hub.orchestrator().attach_node(workflow.id, a2.id).await.unwrap();
    let node_id = attached.nodes[1].id;
    let detached = hub.orchestrator().detach_node(workflow.id, node_id).await.unwrap();
    assert_eq!(detached.nodes, before);

    let err = hub.orchestrator().detach_node(workflow.id, NodeId::new()).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::NotFound { kind: EntityKind::Node, .. }));
}

#[tokio::test]
async fn test_remove_cascades_to_every_referencing_workflow() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let a2 = hub.registry().deploy(&AgentId::from("a2")).await.unwrap();
    let orchestrator = hub.orchestrator();

    let both = orchestrator.create(None, vec![a1.id, a2.id]).await.unwrap();
    let only_a1 = orchestrator.create(None, vec![a1.id]).await.unwrap();
    let only_a2 = orchestrator.create(None, vec![a2.id]).await.unwrap();

    let mut events = hub.event_bus().subscribe();
    hub.registry().remove(a1.id).await.unwrap();

    assert_eq!(orchestrator.get(both.id).await.unwrap().instance_ids(), vec![a2.id]);
    assert!(orchestrator.get(only_a1.id).await.unwrap().nodes.is_empty());
    assert_eq!(orchestrator.get(only_a2.id).await.unwrap(), only_a2);

    let mut cascaded = 0;
    while let Ok(event) = events.try_recv() {
        if let DomainEvent::Workflow(WorkflowEvent::NodeDetached { cascaded: true, instance_id, .. }) = event {
            assert_eq!(instance_id, a1.id);
            cascaded += 1;
        }
    }
    assert_eq!(cascaded, 2);
}

#[tokio::test]
async fn test_stopped_instance_keeps_node_but_blocks_start() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let workflow = hub.orchestrator().create(None, vec![a1.id]).await.unwrap();

    hub.registry().set_status(a1.id, InstanceStatus::Stopped).await.unwrap();
    assert_eq!(hub.orchestrator().get(workflow.id).await.unwrap().nodes.len(), 1);

    let err = hub
        .orchestrator()
        .set_status(workflow.id, WorkflowStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::InstanceNotRunning(_)));

    hub.registry().set_status(a1.id, InstanceStatus::Running).await.unwrap();
    let running = hub.orchestrator().set_status(workflow.id, WorkflowStatus::Running).await.unwrap();
    assert!(running.is_running());

    // Stopping the instance later never blocks stopping the workflow.
    hub.registry().set_status(a1.id, InstanceStatus::Stopped).await.unwrap();
    let stopped = hub.orchestrator().set_status(workflow.id, WorkflowStatus::Inactive).await.unwrap();
    assert_eq!(stopped.status, WorkflowStatus::Inactive);
}

#[tokio::test]
async fn test_create_with_initial_nodes_is_all_or_nothing() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let a2 = hub.registry().deploy(&AgentId::from("a2")).await.unwrap();
    hub.registry().set_status(a2.id, InstanceStatus::Stopped).await.unwrap();

    let stopped = hub.orchestrator().create(None, vec![a1.id, a2.id]).await.unwrap_err();
    assert!(matches!(stopped, OrchestrationError::InstanceNotRunning(_)));

    let duplicate = hub.orchestrator().create(None, vec![a1.id, a1.id]).await.unwrap_err();
    match duplicate {
        OrchestrationError::Validation(message) => assert!(message.contains(&a1.id.to_string())),
        other => panic!("expected a validation error, got {:?}", other),
    }

    let missing = hub.orchestrator().create(None, vec![InstanceId::new()]).await.unwrap_err();
    assert!(matches!(missing, OrchestrationError::NotFound { .. }));

    assert!(hub.orchestrator().list().await.unwrap().is_empty());

    hub.registry().set_status(a2.id, InstanceStatus::Running).await.unwrap();
    let created = hub.orchestrator().create(None, vec![a2.id, a1.id]).await.unwrap();
    assert_eq!(created.instance_ids(), vec![a2.id, a1.id]);
}

#[tokio::test]
async fn test_rename_and_delete() {
    let hub = hub();
    let orchestrator = hub.orchestrator();
    let workflow = orchestrator.create(Some("draft".to_string()), vec![]).await.unwrap();

    let renamed = orchestrator.rename(workflow.id, "Release pipeline".to_string()).await.unwrap();
    assert_eq!(renamed.name, "Release pipeline");

    let blank = orchestrator.rename(workflow.id, " ".to_string()).await.unwrap_err();
    assert!(matches!(blank, OrchestrationError::Validation(_)));

    orchestrator.delete(workflow.id).await.unwrap();
    assert!(matches!(
        orchestrator.get(workflow.id).await.unwrap_err(),
        OrchestrationError::NotFound { kind: EntityKind::Workflow, .. }
    ));
    assert!(orchestrator.delete(workflow.id).await.is_err());
    assert!(orchestrator
        .rename(workflow.id, "again".to_string())
        .await
        .is_err());
}

#[tokio::test]
async fn test_stats_projection() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let a2 = hub.registry().deploy(&AgentId::from("a2")).await.unwrap();
    hub.registry().set_status(a2.id, InstanceStatus::Stopped).await.unwrap();

    let workflow = hub.orchestrator().create(None, vec![a1.id]).await.unwrap();
    hub.orchestrator().set_status(workflow.id, WorkflowStatus::Running).await.unwrap();
    hub.orchestrator().create(None, vec![]).await.unwrap();

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.total_deployed, 2);
    assert_eq!(stats.running_instances, 1);
    assert_eq!(stats.active_workflows, 1);
    assert_eq!(stats.total_workflows, 2);
    assert_eq!(stats.uptime, 50.0);
}

#[tokio::test]
async fn test_update_applies_name_and_status_together_or_not_at_all() {
    let hub = hub();
    let a1 = hub.registry().deploy(&AgentId::from("a1")).await.unwrap();
    let orchestrator = hub.orchestrator();
    let workflow = orchestrator.create(Some("Audit".to_string()), vec![a1.id]).await.unwrap();

    hub.registry().set_status(a1.id, InstanceStatus::Stopped).await.unwrap();
    let mut events = hub.event_bus().subscribe();
    let refused = orchestrator
        .update(workflow.id, Some("Renamed".to_string()), Some(WorkflowStatus::Running))
        .await
        .unwrap_err();
    assert!(matches!(refused, OrchestrationError::InstanceNotRunning(id) if id == a1.id));
    assert_eq!(orchestrator.get(workflow.id).await.unwrap(), workflow);
    assert!(events.try_recv().is_err());

    hub.registry().set_status(a1.id, InstanceStatus::Running).await.unwrap();
    let mut events = hub.event_bus().subscribe();
    let updated = orchestrator
        .update(workflow.id, Some("Renamed".to_string()), Some(WorkflowStatus::Running))
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert!(updated.is_running());

    let mut renamed = 0;
    let mut started = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            DomainEvent::Workflow(WorkflowEvent::WorkflowRenamed { .. }) => renamed += 1,
            DomainEvent::Workflow(WorkflowEvent::WorkflowStatusChanged { to, .. }) => {
                assert_eq!(to, WorkflowStatus::Running);
                started += 1;
            }
            _ => {}
        }
    }
    assert_eq!((renamed, started), (1, 1));
}
