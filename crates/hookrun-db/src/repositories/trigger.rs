//! PostgreSQL implementation of TriggerRepository.

use async_trait::async_trait;
use hookrun_core::ids::TriggerId;
use hookrun_core::ports::TriggerRepository;
use hookrun_core::trigger::Trigger;
use hookrun_core::{Error, Result};
use sqlx::{PgPool, Row};

const TRIGGER_COLUMNS: &str =
    "id, hash, action_to_run, link_repository, is_private, repository_token, has_envs, created_at";

/// PostgreSQL implementation of TriggerRepository.
#[derive(Clone)]
pub struct PgTriggerRepository {
    pool: PgPool,
}

impl PgTriggerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_trigger(r: &sqlx::postgres::PgRow) -> Trigger {
        Trigger {
            id: TriggerId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            hash: r.get("hash"),
            action_to_run: r.get("action_to_run"),
            link_repository: r.get("link_repository"),
            is_private: r.get("is_private"),
            repository_token: r.get("repository_token"),
            has_envs: r.get("has_envs"),
            created_at: r.get("created_at"),
        }
    }
}

#[async_trait]
impl TriggerRepository for PgTriggerRepository {
    async fn create(&self, trigger: &Trigger) -> Result<()> {
        sqlx::query(
            "INSERT INTO triggers (id, hash, action_to_run, link_repository, is_private, repository_token, has_envs, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(trigger.id.as_uuid())
        .bind(&trigger.hash)
        .bind(&trigger.action_to_run)
        .bind(&trigger.link_repository)
        .bind(trigger.is_private)
        .bind(&trigger.repository_token)
        .bind(trigger.has_envs)
        .bind(trigger.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                Error::Validation("trigger hash already exists".to_string())
            }
            _ => Error::Database(e.to_string()),
        })?;

        Ok(())
    }

    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM triggers WHERE id = $1",
            TRIGGER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_trigger))
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Option<Trigger>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM triggers WHERE hash = $1",
            TRIGGER_COLUMNS
        ))
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.as_ref().map(Self::row_to_trigger))
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Trigger>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM triggers ORDER BY created_at ASC LIMIT $1 OFFSET $2",
            TRIGGER_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_trigger).collect())
    }
}
