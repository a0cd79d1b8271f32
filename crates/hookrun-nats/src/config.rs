//! Configuration for the NATS dispatch queue.

use std::time::Duration;

const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the NATS dispatch queue.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs (comma-separated for cluster).
    pub urls: Vec<String>,
    /// Work-queue stream holding dispatch messages.
    pub stream_name: String,
    /// Subject dispatch messages are published on.
    pub subject: String,
    /// Durable pull consumer shared by all workers.
    pub durable_name: String,
    /// Connection timeout.
    pub connection_timeout: Duration,
    /// Request timeout for JetStream operations.
    pub request_timeout: Duration,
    /// How long a delivered message may go without an ack or a progress
    /// heartbeat before redelivery.
    pub ack_wait: Duration,
    /// Maximum delivery attempts for retryable failures.
    pub max_deliver: i64,
    /// Enable dead letter queue.
    pub enable_dlq: bool,
    /// Dead letter queue stream name.
    pub dlq_stream_name: String,
    /// Message retention period.
    pub max_age: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: vec!["nats://localhost:4222".to_string()],
            stream_name: "HOOKRUN_EXECUTIONS".to_string(),
            subject: "hookrun.executions.dispatch".to_string(),
            durable_name: "hookrun-worker".to_string(),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            ack_wait: Duration::from_secs(60),
            max_deliver: 5,
            enable_dlq: true,
            dlq_stream_name: "HOOKRUN_DLQ".to_string(),
            max_age: Duration::from_secs(86400 * 7), // 7 days
        }
    }
}

impl NatsConfig {
    /// Create a new config with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    /// Set multiple server URLs for cluster support.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set the stream name.
    pub fn with_stream_name(mut self, name: impl Into<String>) -> Self {
        self.stream_name = name.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_durable_name(mut self, name: impl Into<String>) -> Self {
        self.durable_name = name.into();
        self
    }

    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// Enable or disable dead letter queue.
    pub fn with_dlq(mut self, enable: bool) -> Self {
        self.enable_dlq = enable;
        self
    }

    /// Set max delivery attempts.
    pub fn with_max_deliver(mut self, max: i64) -> Self {
        self.max_deliver = max;
        self
    }

    /// How often a message still being handled is marked in progress.
    pub fn progress_interval(&self) -> Duration {
        (self.ack_wait / 2).max(MIN_PROGRESS_INTERVAL)
    }

    /// Subject a dead-lettered message is republished on.
    pub fn dlq_subject(&self) -> String {
        format!("dlq.{}", self.subject)
    }
}
