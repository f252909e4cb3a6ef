// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: catalog agents, deployed instances, workflows and the
//! contracts the application layer persists them through.

pub mod agent;
pub mod deployment;
pub mod workflow;
pub mod error;
pub mod events;
pub mod repository;
pub mod node_config;
