//! In-process dispatch queue.
//!
//! Same delivery contract as [`crate::NatsQueue`]: one message at a time,
//! retries go to the back of the queue until `max_deliver` is reached, and
//! rejected payloads are kept as dead letters. Nothing survives a restart.

use crate::delivery::Disposition;
use crate::health::HealthCheck;
use crate::metrics::BrokerMetrics;
use async_trait::async_trait;
use hookrun_core::message::DispatchMessage;
use hookrun_core::ports::{MessageBroker, MessageHandler};
use hookrun_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

/// Deliveries of one message within a single [`MemoryQueue::run_until_idle`].
pub const IDLE_DELIVERY_LIMIT: u32 = 100;

struct Envelope {
    payload: Vec<u8>,
    attempt: i64,
    /// Deliveries since the message was last parked by `run_until_idle`.
    passes: u32,
}

pub struct MemoryQueue {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    dead_letters: Mutex<Vec<Vec<u8>>>,
    metrics: Arc<BrokerMetrics>,
    max_deliver: i64,
}

impl MemoryQueue {
    pub fn new(max_deliver: i64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let metrics = BrokerMetrics::new();
        metrics.set_connected(true);

        Self {
            sender,
            receiver: Mutex::new(receiver),
            dead_letters: Mutex::new(Vec::new()),
            metrics,
            max_deliver,
        }
    }

    pub fn metrics(&self) -> &Arc<BrokerMetrics> {
        &self.metrics
    }

    pub fn health_check(&self) -> HealthCheck {
        HealthCheck::from_metrics("memory", &self.metrics, true)
    }

    /// Enqueue raw bytes, bypassing serialization.
    pub fn publish_raw(&self, payload: Vec<u8>) -> Result<()> {
        let len = payload.len() as u64;
        self.sender
            .send(Envelope {
                payload,
                attempt: 0,
                passes: 0,
            })
            .map_err(|_| {
                self.metrics.record_publish_failure();
                Error::Broker("memory queue is closed".to_string())
            })?;
        self.metrics.record_publish(len);
        Ok(())
    }

    /// Payloads that were rejected without redelivery.
    pub async fn dead_letters(&self) -> Vec<Vec<u8>> {
        self.dead_letters.lock().await.clone()
    }

    /// Deliver every queued message, including redeliveries, then return.
    ///
    /// A message is delivered at most [`IDLE_DELIVERY_LIMIT`] times per call.
    /// One still being retried after that is left on the queue for the next
    /// call, so an unbounded `max_deliver` (zero or negative) cannot keep this
    /// from returning.
    pub async fn run_until_idle(&self, handler: &dyn MessageHandler) -> usize {
        let mut receiver = self.receiver.lock().await;
        let mut delivered = 0;
        let mut parked = Vec::new();
        while let Ok(envelope) = receiver.try_recv() {
            if envelope.passes >= IDLE_DELIVERY_LIMIT {
                parked.push(envelope);
                continue;
            }
            self.deliver(handler, envelope).await;
            delivered += 1;
        }

        for mut envelope in parked {
            warn!(
                attempt = envelope.attempt,
                "Message still failing after {} deliveries, leaving it queued", IDLE_DELIVERY_LIMIT
            );
            envelope.passes = 0;
            if self.sender.send(envelope).is_err() {
                warn!("Memory queue closed, dropping redelivery");
            }
        }
        delivered
    }

    async fn deliver(&self, handler: &dyn MessageHandler, mut envelope: Envelope) {
        self.metrics.record_receive();
        envelope.attempt += 1;
        envelope.passes += 1;

        let outcome = handler.handle(&envelope.payload).await;
        let disposition =
            Disposition::of(&outcome).with_attempt(envelope.attempt, self.max_deliver);
        debug!(attempt = envelope.attempt, ?disposition, "Message handled");

        match disposition {
            Disposition::Ack => self.metrics.record_ack(),
            Disposition::Retry => {
                self.metrics.record_retry();
                if let Err(e) = &outcome {
                    warn!(attempt = envelope.attempt, error = %e, "Handler failed, message will be redelivered");
                }
                if self.sender.send(envelope).is_err() {
                    warn!("Memory queue closed, dropping redelivery");
                }
            }
            Disposition::Reject => {
                self.metrics.record_reject();
                if let Err(e) = &outcome {
                    warn!(attempt = envelope.attempt, reason = %e, "Message rejected");
                }
                self.metrics.record_dlq();
                self.dead_letters.lock().await.push(envelope.payload);
            }
        }
    }
}

#[async_trait]
impl MessageBroker for MemoryQueue {
    async fn publish(&self, message: &DispatchMessage) -> Result<()> {
        self.publish_raw(message.to_bytes()?)
    }

    async fn consume(
        &self,
        handler: Arc<dyn MessageHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut receiver = self.receiver.lock().await;
        info!("Consuming dispatch messages from memory queue");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = receiver.recv() => next,
            };

            match next {
                Some(envelope) => self.deliver(handler.as_ref(), envelope).await,
                None => break,
            }
        }

        info!("Memory queue consumer stopped");
        Ok(())
    }
}
