//! Builds the adapters selected by the configuration.

use crate::config::{AppConfig, BrokerKind, SecretBackend};
use anyhow::{Context, bail};
use hookrun_api::HealthProbe;
use hookrun_core::ports::{ExecutionRepository, MessageBroker, SecretStore, TriggerRepository};
use hookrun_db::{Database, InMemoryStore, PgExecutionRepository, PgSecretStore, PgTriggerRepository};
use hookrun_nats::{MemoryQueue, NatsQueue};
use hookrun_secrets::{FileSecretStore, NativeSecretStore, SecretCipher};
use std::sync::Arc;
use tracing::{info, warn};

/// Every adapter the server and worker are wired from.
pub struct Components {
    pub triggers: Arc<dyn TriggerRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub secrets: Arc<dyn SecretStore>,
    pub broker: Arc<dyn MessageBroker>,
    pub broker_health: HealthProbe,
    nats: Option<Arc<NatsQueue>>,
}

impl Components {
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let database = match &config.database.url {
            Some(url) => {
                let database = Database::connect(url, config.database.max_connections)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                if config.database.run_migrations {
                    database.migrate().await?;
                }
                Some(database)
            }
            None => {
                warn!("No database configured, triggers and executions are kept in memory");
                None
            }
        };

        let (triggers, executions): (Arc<dyn TriggerRepository>, Arc<dyn ExecutionRepository>) =
            match &database {
                Some(db) => {
                    let triggers: Arc<dyn TriggerRepository> =
                        Arc::new(PgTriggerRepository::new(db.pool().clone()));
                    let executions: Arc<dyn ExecutionRepository> =
                        Arc::new(PgExecutionRepository::new(db.pool().clone()));
                    (triggers, executions)
                }
                None => {
                    let store = Arc::new(InMemoryStore::new());
                    let triggers: Arc<dyn TriggerRepository> = store.clone();
                    let executions: Arc<dyn ExecutionRepository> = store;
                    (triggers, executions)
                }
            };

        let secrets = build_secret_store(config, database.as_ref()).await?;

        let nats = match config.broker.kind {
            BrokerKind::Nats => Some(Arc::new(
                NatsQueue::connect_with_config(config.broker.nats_config())
                    .await
                    .context("failed to connect to NATS")?,
            )),
            BrokerKind::Memory => None,
        };

        let (broker, broker_health): (Arc<dyn MessageBroker>, HealthProbe) = match &nats {
            Some(queue) => {
                let probe = queue.clone();
                let health: HealthProbe = Arc::new(move || probe.health_check());
                let broker: Arc<dyn MessageBroker> = queue.clone();
                (broker, health)
            }
            None => {
                let queue = Arc::new(MemoryQueue::new(config.broker.max_deliver));
                let probe = queue.clone();
                let health: HealthProbe = Arc::new(move || probe.health_check());
                let broker: Arc<dyn MessageBroker> = queue;
                (broker, health)
            }
        };

        info!(
            store = if database.is_some() { "postgres" } else { "memory" },
            secrets = secrets.name(),
            broker = ?config.broker.kind,
            "Components initialized"
        );

        Ok(Self {
            triggers,
            executions,
            secrets,
            broker,
            broker_health,
            nats,
        })
    }

    /// Drain the broker connection.
    pub async fn close(&self) {
        if let Some(nats) = &self.nats {
            if let Err(e) = nats.shutdown().await {
                warn!(error = %e, "Failed to drain NATS connection");
            }
        }
    }
}

async fn build_secret_store(
    config: &AppConfig,
    database: Option<&Database>,
) -> anyhow::Result<Arc<dyn SecretStore>> {
    let master_key = config
        .secrets
        .master_key
        .as_deref()
        .filter(|k| !k.is_empty());

    let cipher = || -> anyhow::Result<SecretCipher> {
        match master_key {
            Some(key) => Ok(SecretCipher::from_master_key(key)),
            None => bail!("secrets.master_key is required for the {:?} backend", config.secrets.backend),
        }
    };

    let store: Arc<dyn SecretStore> = match config.secrets.backend {
        SecretBackend::Memory => {
            let key = match master_key {
                Some(key) => key.to_string(),
                None => {
                    warn!("No secrets.master_key set, using a key that only lives as long as this process");
                    uuid::Uuid::new_v4().to_string()
                }
            };
            Arc::new(NativeSecretStore::from_master_key(&key))
        }
        SecretBackend::File => Arc::new(
            FileSecretStore::open(config.secrets.dir.clone(), cipher()?)
                .await
                .context("failed to open secret directory")?,
        ),
        SecretBackend::Postgres => {
            let Some(db) = database else {
                bail!("the postgres secret backend requires database.url");
            };
            Arc::new(PgSecretStore::new(db.pool().clone(), cipher()?))
        }
    };

    Ok(store)
}
