// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agents;
pub mod config;
pub mod events;
pub mod instance;
pub mod stats;
pub mod workflow;

pub use agents::AgentsCommand;
pub use config::ConfigCommand;
pub use instance::InstanceCommand;
pub use workflow::WorkflowCommand;
