//! Test context providing access to container-backed services.

use crate::containers::{NatsContainer, PostgresContainer};
use hookrun_db::Database;
use hookrun_nats::{NatsConfig, NatsQueue};

/// PostgreSQL and NATS running side by side, for runs through the
/// production store and queue.
///
/// Drop this to stop all containers.
pub struct TestContext {
    pub postgres: PostgresContainer,
    pub nats: NatsContainer,
    pub db: Database,
    pub queue: NatsQueue,
}

impl TestContext {
    /// Start both containers; the queue is connected with `config`.
    pub async fn new(config: NatsConfig) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let (postgres, nats) = tokio::try_join!(PostgresContainer::start(), NatsContainer::start())?;
        let (db, queue) = tokio::try_join!(postgres.database(), nats.queue(config))?;

        Ok(Self {
            postgres,
            nats,
            db,
            queue,
        })
    }

    /// Create context with only PostgreSQL.
    pub async fn postgres_only() -> anyhow::Result<PostgresOnlyContext> {
        crate::init_test_logging();

        let postgres = PostgresContainer::start().await?;
        let db = postgres.database().await?;

        Ok(PostgresOnlyContext { postgres, db })
    }

    /// Create context with only NATS, connected with `config`.
    pub async fn nats_only(config: NatsConfig) -> anyhow::Result<NatsOnlyContext> {
        crate::init_test_logging();

        let nats = NatsContainer::start().await?;
        let queue = nats.queue(config).await?;

        Ok(NatsOnlyContext { nats, queue })
    }
}

/// Context with only PostgreSQL.
pub struct PostgresOnlyContext {
    pub postgres: PostgresContainer,
    pub db: Database,
}

/// Context with only NATS.
pub struct NatsOnlyContext {
    pub nats: NatsContainer,
    pub queue: NatsQueue,
}
