//! PostgreSQL implementation of ExecutionRepository.

use async_trait::async_trait;
use hookrun_core::execution::{Execution, ExecutionLog, ExecutionStatus};
use hookrun_core::ids::{ExecutionId, LogId, TriggerId};
use hookrun_core::ports::ExecutionRepository;
use hookrun_core::{Error, Result};
use sqlx::{PgPool, Row};

/// PostgreSQL implementation of ExecutionRepository.
#[derive(Clone)]
pub struct PgExecutionRepository {
    pool: PgPool,
}

impl PgExecutionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_execution(r: &sqlx::postgres::PgRow) -> Result<Execution> {
        let status: String = r.get("status");

        Ok(Execution {
            id: ExecutionId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            trigger_id: TriggerId::from_uuid(r.get::<uuid::Uuid, _>("trigger_id")),
            status: status.parse()?,
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        })
    }
}

#[async_trait]
impl ExecutionRepository for PgExecutionRepository {
    async fn create(&self, execution: &Execution) -> Result<()> {
        sqlx::query(
            "INSERT INTO executions (id, trigger_id, status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(execution.id.as_uuid())
        .bind(execution.trigger_id.as_uuid())
        .bind(execution.status.as_str())
        .bind(execution.created_at)
        .bind(execution.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>> {
        let row = sqlx::query(
            "SELECT id, trigger_id, status, created_at, updated_at FROM executions WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        row.as_ref().map(Self::row_to_execution).transpose()
    }

    async fn list_by_trigger(
        &self,
        trigger_id: TriggerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Execution>> {
        let rows = sqlx::query(
            "SELECT id, trigger_id, status, created_at, updated_at FROM executions WHERE trigger_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(trigger_id.as_uuid())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.iter().map(Self::row_to_execution).collect()
    }

    async fn update_status(
        &self,
        id: ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<bool> {
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                execution_id: id.to_string(),
                from,
                to,
            });
        }

        let result = sqlx::query(
            "UPDATE executions SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_queued(&self, limit: u32) -> Result<Vec<Execution>> {
        let rows = sqlx::query(
            "SELECT id, trigger_id, status, created_at, updated_at FROM executions WHERE status = 'Queued' ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.iter().map(Self::row_to_execution).collect()
    }

    async fn append_log(&self, log: &ExecutionLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO execution_logs (id, execution_id, sequence, log, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(log.id.as_uuid())
        .bind(log.execution_id.as_uuid())
        .bind(log.sequence as i64)
        .bind(&log.log)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn logs(&self, execution_id: ExecutionId) -> Result<Vec<ExecutionLog>> {
        let rows = sqlx::query(
            "SELECT id, execution_id, sequence, log, created_at FROM execution_logs WHERE execution_id = $1 ORDER BY sequence ASC",
        )
        .bind(execution_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|r| ExecutionLog {
                id: LogId::from_uuid(r.get::<uuid::Uuid, _>("id")),
                execution_id: ExecutionId::from_uuid(r.get::<uuid::Uuid, _>("execution_id")),
                sequence: r.get::<i64, _>("sequence") as u64,
                log: r.get("log"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
