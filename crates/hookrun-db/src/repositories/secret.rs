//! Secret store backed by the `trigger_secrets` table.
//!
//! Rows are keyed by a digest of the secret key and hold sealed values, so
//! neither trigger hashes nor plaintext secrets reach the database.

use async_trait::async_trait;
use hookrun_core::ports::SecretStore;
use hookrun_core::{Error, Result};
use hookrun_secrets::SecretCipher;
use hookrun_secrets::cipher::key_digest;
use sqlx::{PgPool, Row};
use tracing::debug;

pub struct PgSecretStore {
    pool: PgPool,
    cipher: SecretCipher,
}

impl PgSecretStore {
    pub fn new(pool: PgPool, cipher: SecretCipher) -> Self {
        Self { pool, cipher }
    }
}

#[async_trait]
impl SecretStore for PgSecretStore {
    async fn add(&self, key: &str, value: &str) -> Result<()> {
        let sealed = self.cipher.seal(value)?;

        let row = sqlx::query(
            r#"INSERT INTO trigger_secrets (key_digest, sealed) VALUES ($1, $2)
               ON CONFLICT (key_digest) DO UPDATE
               SET sealed = EXCLUDED.sealed, version = trigger_secrets.version + 1, updated_at = NOW()
               RETURNING version"#,
        )
        .bind(key_digest(key))
        .bind(&sealed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        debug!(version = row.get::<i32, _>("version"), "Secret stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String> {
        let row = sqlx::query("SELECT sealed FROM trigger_secrets WHERE key_digest = $1")
            .bind(key_digest(key))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::SecretUnavailable(e.to_string()))?;

        let sealed: String = row
            .ok_or_else(|| Error::SecretUnavailable("no secret for trigger".to_string()))?
            .get("sealed");

        self.cipher.open(&sealed)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
