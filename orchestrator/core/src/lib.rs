// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `agenthub-core`: Deployment Registry & Workflow Orchestration
//!
//! Owns the stateful heart of AgentHub: which catalog agents are deployed,
//! whether each deployed instance is running, and how deployed instances are
//! composed into ordered workflows that start and stop as a unit.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | Aggregates, invariants, errors, events, repository traits |
//! | [`application`] | Application | Registry and orchestrator services, stats, wiring |
//! | [`infrastructure`] | Infrastructure | In-memory / PostgreSQL stores, catalog loader, event bus |
//! | [`presentation`] | Presentation | HTTP binding (axum) |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
