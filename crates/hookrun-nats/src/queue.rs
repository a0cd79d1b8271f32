//! JetStream work queue for dispatch messages.
//!
//! One durable pull consumer is shared by every worker. `max_ack_pending` is
//! pinned to 1 so executions are processed strictly one at a time in
//! publish order.

use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, pull::Config as ConsumerConfig},
    stream::Config as StreamConfig,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use futures::StreamExt;
use hookrun_core::message::DispatchMessage;
use hookrun_core::ports::{MessageBroker, MessageHandler};
use hookrun_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::NatsConfig;
use crate::delivery::Disposition;
use crate::health::HealthCheck;
use crate::metrics::{BrokerMetrics, LatencyTimer};

/// NATS-backed dispatch queue using JetStream for durability.
#[derive(Clone)]
pub struct NatsQueue {
    client: async_nats::Client,
    jetstream: jetstream::Context,
    config: NatsConfig,
    metrics: Arc<BrokerMetrics>,
}

impl NatsQueue {
    /// Connect with custom configuration and make sure the streams exist.
    pub async fn connect_with_config(config: NatsConfig) -> Result<Self> {
        let urls = config.urls.join(",");
        info!("Connecting to NATS at {}", urls);

        let metrics = BrokerMetrics::new();

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(config.connection_timeout)
            .request_timeout(Some(config.request_timeout))
            .retry_on_initial_connect()
            .connect(&urls)
            .await
            .map_err(|e| Error::Broker(format!("Failed to connect to NATS: {}", e)))?;

        metrics.set_connected(true);

        let jetstream = jetstream::new(client.clone());

        let stream_config = StreamConfig {
            name: config.stream_name.clone(),
            subjects: vec![config.subject.clone()],
            retention: jetstream::stream::RetentionPolicy::WorkQueue,
            max_age: config.max_age,
            storage: jetstream::stream::StorageType::File,
            ..Default::default()
        };

        jetstream
            .get_or_create_stream(stream_config)
            .await
            .map_err(|e| Error::Broker(format!("Failed to create stream: {}", e)))?;

        if config.enable_dlq {
            let dlq_config = StreamConfig {
                name: config.dlq_stream_name.clone(),
                subjects: vec![config.dlq_subject()],
                retention: jetstream::stream::RetentionPolicy::Limits,
                max_age: Duration::from_secs(86400 * 30),
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            };

            jetstream
                .get_or_create_stream(dlq_config)
                .await
                .map_err(|e| Error::Broker(format!("Failed to create DLQ stream: {}", e)))?;

            info!("Dead letter queue stream initialized");
        }

        info!(stream = %config.stream_name, "Connected to NATS and initialized JetStream");

        Ok(Self {
            client,
            jetstream,
            config,
            metrics,
        })
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(NatsConfig::new(url)).await
    }

    pub fn config(&self) -> &NatsConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<BrokerMetrics> {
        &self.metrics
    }

    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    pub fn health_check(&self) -> HealthCheck {
        HealthCheck::from_metrics("nats", &self.metrics, self.is_connected())
    }

    /// Graceful shutdown - drain the connection.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Draining NATS connection");

        if let Err(e) = self.client.drain().await {
            error!("Error draining NATS connection: {}", e);
        }

        self.metrics.set_connected(false);
        Ok(())
    }

    /// Get stream info.
    pub async fn stream_info(&self) -> Result<StreamInfo> {
        let mut stream = self
            .jetstream
            .get_stream(&self.config.stream_name)
            .await
            .map_err(|e| Error::Broker(format!("Failed to get stream: {}", e)))?;

        let info = stream
            .info()
            .await
            .map_err(|e| Error::Broker(format!("Failed to get stream info: {}", e)))?;

        Ok(StreamInfo {
            name: info.config.name.clone(),
            messages: info.state.messages,
            bytes: info.state.bytes,
            first_seq: info.state.first_sequence,
            last_seq: info.state.last_sequence,
            consumer_count: info.state.consumer_count,
        })
    }

    /// Copy a message to the dead letter queue.
    async fn send_to_dlq(&self, payload: &[u8], reason: &str) -> Result<()> {
        if !self.config.enable_dlq {
            return Ok(());
        }

        let dlq_payload = serde_json::json!({
            "original_subject": self.config.subject,
            "payload": STANDARD.encode(payload),
            "reason": reason,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let payload_bytes = serde_json::to_vec(&dlq_payload)?;

        self.jetstream
            .publish(self.config.dlq_subject(), payload_bytes.into())
            .await
            .map_err(|e| Error::Broker(format!("Failed to publish to DLQ: {}", e)))?
            .await
            .map_err(|e| Error::Broker(format!("Failed to confirm DLQ publish: {}", e)))?;

        self.metrics.record_dlq();
        warn!("Message sent to DLQ: {}", reason);

        Ok(())
    }

    /// Run the handler, resetting the ack deadline every
    /// [`NatsConfig::progress_interval`] until it finishes.
    async fn handle_with_progress(
        &self,
        handler: &dyn MessageHandler,
        msg: &jetstream::Message,
    ) -> Result<()> {
        let mut handled = handler.handle(&msg.payload);
        let mut heartbeat = tokio::time::interval(self.config.progress_interval());
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                outcome = &mut handled => return outcome,
                _ = heartbeat.tick() => {
                    if let Err(e) = msg.ack_with(AckKind::Progress).await {
                        warn!(error = %e, "Failed to extend ack deadline");
                    } else {
                        self.metrics.record_progress();
                    }
                }
            }
        }
    }

    async fn deliver(&self, handler: &dyn MessageHandler, msg: jetstream::Message) {
        self.metrics.record_receive();

        let attempt = msg.info().map(|info| info.delivered).unwrap_or(1);
        let timer = LatencyTimer::start();
        let outcome = self.handle_with_progress(handler, &msg).await;
        let disposition =
            Disposition::of(&outcome).with_attempt(attempt, self.config.max_deliver);

        debug!(attempt, elapsed_ms = timer.elapsed_ms(), ?disposition, "Message handled");

        let acked = match disposition {
            Disposition::Ack => {
                self.metrics.record_ack();
                msg.ack().await
            }
            Disposition::Retry => {
                self.metrics.record_retry();
                if let Err(e) = &outcome {
                    warn!(attempt, error = %e, "Handler failed, message will be redelivered");
                }
                msg.ack_with(AckKind::Nak(None)).await
            }
            Disposition::Reject => {
                self.metrics.record_reject();
                let reason = outcome
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                warn!(attempt, reason = %reason, "Message rejected");
                if let Err(e) = self.send_to_dlq(&msg.payload, &reason).await {
                    error!(error = %e, "Failed to dead-letter message");
                }
                msg.ack_with(AckKind::Term).await
            }
        };

        if let Err(e) = acked {
            error!(error = %e, "Failed to acknowledge message");
        }
    }
}

/// Information about a JetStream stream.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub name: String,
    pub messages: u64,
    pub bytes: u64,
    pub first_seq: u64,
    pub last_seq: u64,
    pub consumer_count: usize,
}

#[async_trait]
impl MessageBroker for NatsQueue {
    async fn publish(&self, message: &DispatchMessage) -> Result<()> {
        let payload = message.to_bytes()?;
        let payload_len = payload.len() as u64;
        debug!(execution_id = %message.id, "Publishing dispatch message");

        let published = match self
            .jetstream
            .publish(self.config.subject.clone(), payload.into())
            .await
        {
            Ok(ack_future) => ack_future
                .await
                .map(|_| ())
                .map_err(|e| Error::Broker(format!("Failed to confirm publish: {}", e))),
            Err(e) => Err(Error::Broker(format!(
                "Failed to publish to {}: {}",
                self.config.subject, e
            ))),
        };

        match &published {
            Ok(()) => self.metrics.record_publish(payload_len),
            Err(_) => self.metrics.record_publish_failure(),
        }
        published
    }

    async fn consume(
        &self,
        handler: Arc<dyn MessageHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let consumer = self
            .jetstream
            .create_consumer_on_stream(
                ConsumerConfig {
                    durable_name: Some(self.config.durable_name.clone()),
                    filter_subject: self.config.subject.clone(),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: self.config.ack_wait,
                    max_deliver: self.config.max_deliver,
                    max_ack_pending: 1,
                    ..Default::default()
                },
                &self.config.stream_name,
            )
            .await
            .map_err(|e| Error::Broker(format!("Failed to create consumer: {}", e)))?;

        let mut messages = consumer
            .messages()
            .await
            .map_err(|e| Error::Broker(format!("Failed to get messages: {}", e)))?;

        info!(consumer = %self.config.durable_name, "Consuming dispatch messages");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = messages.next() => next,
            };

            match next {
                Some(Ok(msg)) => self.deliver(handler.as_ref(), msg).await,
                Some(Err(e)) => warn!(error = %e, "Message stream error"),
                None => {
                    return Err(Error::Broker("Message stream closed".to_string()));
                }
            }
        }

        info!("Dispatch consumer stopped");
        Ok(())
    }
}
