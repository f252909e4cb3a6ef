// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Property tests for node ordering: any sequence of attaches and detaches
//! leaves the remaining nodes in attach order, without duplicates.

use agenthub_core::domain::deployment::InstanceId;
use agenthub_core::domain::workflow::{Workflow, WorkflowNode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// Attach the instance with this index from the pool.
    Attach(usize),
    /// Detach the node at this position (modulo the current length).
    DetachAt(usize),
    /// Detach whatever node references this pool instance.
    DetachInstance(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..8usize).prop_map(Op::Attach),
        (0..8usize).prop_map(Op::DetachAt),
        (0..8usize).prop_map(Op::DetachInstance),
    ]
}

proptest! {
    #[test]
    fn remaining_nodes_follow_attach_order(ops in prop::collection::vec(op(), 0..64)) {
        let pool: Vec<InstanceId> = (0..8).map(|_| InstanceId::new()).collect();
        let mut workflow = Workflow::new("prop").unwrap();
        // Model: instance ids in the order they should appear.
        let mut model: Vec<InstanceId> = Vec::new();

        for op in ops {
            match op {
                Op::Attach(i) => {
                    let id = pool[i];
                    let result = workflow.attach(WorkflowNode::new(id, "n", "🤖")).map(|_| ());
                    if model.contains(&id) {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        model.push(id);
                    }
                }
                Op::DetachAt(pos) => {
                    if !model.is_empty() {
                        let pos = pos % model.len();
                        let node_id = workflow.nodes[pos].id;
                        let removed = workflow.detach(node_id).unwrap();
                        prop_assert_eq!(removed.agent_instance_id, model.remove(pos));
                    }
                }
                Op::DetachInstance(i) => {
                    let id = pool[i];
                    let removed = workflow.detach_instance(id);
                    match model.iter().position(|m| *m == id) {
                        Some(pos) => {
                            model.remove(pos);
                            prop_assert!(removed.is_some());
                        }
                        None => prop_assert!(removed.is_none()),
                    }
                }
            }
            prop_assert_eq!(workflow.instance_ids(), model.clone());
        }
    }
}
