// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::deployment::InstanceId;
use crate::domain::repository::{RepositoryError, WorkflowRepository};
use crate::domain::workflow::{Workflow, WorkflowId};

/// Workflows are stored whole in `domain_json`; `name` and `status` are
/// duplicated into columns for ad-hoc queries only. The `version` column
/// guards saves, so two daemons sharing a database cannot silently overwrite
/// each other's workflow changes.
pub struct PostgresWorkflowRepository {
    pool: PgPool,
}

impl PostgresWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Result<Workflow, RepositoryError> {
        let domain_json: serde_json::Value = row.try_get("domain_json")?;
        Ok(serde_json::from_value(domain_json)?)
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn save(&self, workflow: &mut Workflow) -> Result<(), RepositoryError> {
        let expected = workflow.version;
        let mut next = workflow.clone();
        next.version = expected + 1;
        let domain_json = serde_json::to_value(&next)?;

        // Version 0 means the workflow has never been stored.
        let outcome = if expected == 0 {
            sqlx::query(
                r#"
                INSERT INTO workflows (id, name, status, domain_json, created_at, updated_at, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(next.id.0)
            .bind(&next.name)
            .bind(next.status.as_str())
            .bind(&domain_json)
            .bind(next.created_at)
            .bind(next.updated_at)
            .bind(next.version as i64)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE workflows SET
                    name = $2,
                    status = $3,
                    domain_json = $4,
                    updated_at = $5,
                    version = $6
                WHERE id = $1 AND version = $7
                "#,
            )
            .bind(next.id.0)
            .bind(&next.name)
            .bind(next.status.as_str())
            .bind(&domain_json)
            .bind(next.updated_at)
            .bind(next.version as i64)
            .bind(expected as i64)
            .execute(&self.pool)
            .await
        };
        let result = outcome
            .map_err(|e| RepositoryError::Database(format!("Failed to save workflow: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "workflow {} changed since version {} was read",
                workflow.id, expected
            )));
        }

        workflow.version = next.version;
        Ok(())
    }

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        let row = sqlx::query("SELECT domain_json FROM workflows WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn find_by_instance(&self, instance_id: InstanceId) -> Result<Vec<Workflow>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT domain_json
            FROM workflows
            WHERE domain_json -> 'nodes' @> jsonb_build_array(jsonb_build_object('agentInstanceId', $1::text))
            ORDER BY seq ASC
            "#,
        )
        .bind(instance_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let rows = sqlx::query("SELECT domain_json FROM workflows ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn delete(&self, id: WorkflowId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete workflow: {}", e)))?;

        Ok(())
    }
}
