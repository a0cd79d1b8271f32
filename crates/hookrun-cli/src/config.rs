//! Application configuration.
//!
//! Layered from built-in defaults, an optional config file and `HOOKRUN__*`
//! environment variables, with `__` separating sections from keys
//! (`HOOKRUN__DATABASE__URL`, `HOOKRUN__WORKER__EXECUTION_TIMEOUT_SECS`).

use anyhow::Context;
use hookrun_nats::NatsConfig;
use hookrun_trace::TracingConfig;
use hookrun_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "HOOKRUN";
const DEFAULT_CONFIG_FILE: &str = "hookrun";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub broker: BrokerConfig,
    pub api: ApiConfig,
    pub worker: WorkerConfig,
    pub secrets: SecretsConfig,
    pub tracing: TracingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Without one, state lives in memory.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Apply migrations when the server starts.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    Nats,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub kind: BrokerKind,
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub durable: String,
    /// Delivery attempts for a message whose handling keeps failing.
    pub max_deliver: i64,
    /// Redelivery deadline; a running execution keeps extending it.
    pub ack_wait_secs: u64,
    pub dlq: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        let nats = NatsConfig::default();
        Self {
            kind: BrokerKind::Nats,
            url: "nats://localhost:4222".to_string(),
            stream: nats.stream_name,
            subject: nats.subject,
            durable: nats.durable_name,
            max_deliver: nats.max_deliver,
            ack_wait_secs: nats.ack_wait.as_secs(),
            dlq: nats.enable_dlq,
        }
    }
}

impl BrokerConfig {
    pub fn nats_config(&self) -> NatsConfig {
        NatsConfig::new(&self.url)
            .with_stream_name(&self.stream)
            .with_subject(&self.subject)
            .with_durable_name(&self.durable)
            .with_max_deliver(self.max_deliver)
            .with_ack_wait(Duration::from_secs(self.ack_wait_secs))
            .with_dlq(self.dlq)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
    /// Key expected in `x-api-key`. Admin routes are closed without one.
    pub api_key: Option<String>,
    /// Base of the webhook URLs handed out at registration.
    pub public_base_url: String,
    /// How often executions left `Queued` are republished. `0` only sweeps
    /// once at startup.
    pub redispatch_interval_secs: u64,
    pub redispatch_batch: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            api_key: None,
            public_base_url: "http://localhost:3000".to_string(),
            redispatch_interval_secs: 0,
            redispatch_batch: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub backend: SecretBackend,
    /// Encryption key material shared by every process using the store.
    pub master_key: Option<String>,
    /// Directory of the file backend.
    pub dir: PathBuf,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretBackend::Postgres,
            master_key: None,
            dir: PathBuf::from("/var/lib/hookrun/secrets"),
        }
    }
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; otherwise
    /// `hookrun.{toml,yaml,json}` in the working directory is used if
    /// present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&AppConfig::default())
            .context("failed to serialize default configuration")?;

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }
}
