// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::deployment::{DeployedInstance, InstanceId, InstanceStatus};
use crate::domain::repository::{DeploymentRepository, RepositoryError};

pub struct PostgresDeploymentRepository {
    pool: PgPool,
}

impl PostgresDeploymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Result<DeployedInstance, RepositoryError> {
        let id: Uuid = row.try_get("id")?;
        let agent_id: String = row.try_get("agent_id")?;
        let status: String = row.try_get("status")?;
        let deployed_at: DateTime<Utc> = row.try_get("deployed_at")?;

        Ok(DeployedInstance {
            id: InstanceId(id),
            agent_id: AgentId(agent_id),
            status: status
                .parse::<InstanceStatus>()
                .map_err(RepositoryError::Serialization)?,
            deployed_at,
        })
    }
}

#[async_trait]
impl DeploymentRepository for PostgresDeploymentRepository {
    async fn save(&self, instance: &DeployedInstance) -> Result<(), RepositoryError> {
        // A second row for the same agent_id violates UNIQUE and maps to Conflict.
        sqlx::query(
            r#"
            INSERT INTO deployed_instances (id, agent_id, status, deployed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status
            "#,
        )
        .bind(instance.id.0)
        .bind(instance.agent_id.as_str())
        .bind(instance.status.as_str())
        .bind(instance.deployed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: InstanceId) -> Result<Option<DeployedInstance>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, agent_id, status, deployed_at
            FROM deployed_instances
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn find_by_agent(&self, agent_id: &AgentId) -> Result<Option<DeployedInstance>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, agent_id, status, deployed_at
            FROM deployed_instances
            WHERE agent_id = $1
            "#,
        )
        .bind(agent_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<DeployedInstance>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, agent_id, status, deployed_at
            FROM deployed_instances
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn delete(&self, id: InstanceId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM deployed_instances WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete instance: {}", e)))?;

        Ok(())
    }
}
