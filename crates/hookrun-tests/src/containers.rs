//! Disposable PostgreSQL and NATS servers for the `integration` tests.

use hookrun_db::Database;
use hookrun_nats::{NatsConfig, NatsQueue};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::{nats::Nats, postgres::Postgres};

const DB_NAME: &str = "hookrun";
const DB_USER: &str = "hookrun";
const DB_PASSWORD: &str = "hookrun-test";

/// PostgreSQL with an empty `hookrun` database owned by the `hookrun` role.
pub struct PostgresContainer {
    _container: ContainerAsync<Postgres>,
    url: String,
}

impl PostgresContainer {
    pub async fn start() -> anyhow::Result<Self> {
        let container = Postgres::default()
            .with_db_name(DB_NAME)
            .with_user(DB_USER)
            .with_password(DB_PASSWORD)
            .with_tag("16-alpine")
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            DB_USER, DB_PASSWORD, host, port, DB_NAME
        );

        Ok(Self {
            _container: container,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A pool on the container with the hookrun schema applied.
    pub async fn database(&self) -> anyhow::Result<Database> {
        let db = Database::connect(&self.url, 5).await?;
        db.migrate().await?;
        Ok(db)
    }
}

/// A JetStream-enabled NATS server.
pub struct NatsContainer {
    _container: ContainerAsync<Nats>,
    url: String,
}

impl NatsContainer {
    pub async fn start() -> anyhow::Result<Self> {
        let container = Nats::default()
            .with_tag("2.10-alpine")
            .with_cmd(["-js"])
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(4222).await?;

        Ok(Self {
            _container: container,
            url: format!("nats://{}:{}", host, port),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A dispatch queue built from `config`, pointed at this server.
    pub async fn queue(&self, config: NatsConfig) -> anyhow::Result<NatsQueue> {
        let config = config.with_urls(vec![self.url.clone()]);
        Ok(NatsQueue::connect_with_config(config).await?)
    }
}
