// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations for the configured storage
//! backend, keeping the domain layer free of infrastructure types.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repository::{
    DeploymentRepository, RepositoryError, StorageBackend, WorkflowRepository,
};
use crate::infrastructure::repositories::{
    InMemoryDeploymentRepository, InMemoryWorkflowRepository, PostgresDeploymentRepository,
    PostgresWorkflowRepository,
};

fn require_pool(pool: Option<PgPool>) -> Result<PgPool, RepositoryError> {
    pool.ok_or_else(|| {
        RepositoryError::Database("PostgreSQL backend selected but no connection pool was provided".to_string())
    })
}

/// Creates a DeploymentRepository implementation based on the configured backend
pub fn create_deployment_repository(
    backend: &StorageBackend,
    pool: Option<PgPool>,
) -> Result<Arc<dyn DeploymentRepository>, RepositoryError> {
    Ok(match backend {
        StorageBackend::InMemory => Arc::new(InMemoryDeploymentRepository::new()),
        StorageBackend::PostgreSQL(_) => Arc::new(PostgresDeploymentRepository::new(require_pool(pool)?)),
    })
}

/// Creates a WorkflowRepository implementation based on the configured backend
pub fn create_workflow_repository(
    backend: &StorageBackend,
    pool: Option<PgPool>,
) -> Result<Arc<dyn WorkflowRepository>, RepositoryError> {
    Ok(match backend {
        StorageBackend::InMemory => Arc::new(InMemoryWorkflowRepository::new()),
        StorageBackend::PostgreSQL(_) => Arc::new(PostgresWorkflowRepository::new(require_pool(pool)?)),
    })
}
