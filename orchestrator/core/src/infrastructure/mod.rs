// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod event_bus;
pub mod catalog_loader;

pub use catalog_loader::CatalogLoader;
pub use event_bus::{DomainEvent, EventBus, EventBusError};
