//! Counters for dispatch queue observability.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by every queue adapter.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    /// Total messages published.
    pub messages_published: AtomicU64,
    /// Total publish failures.
    pub publish_failures: AtomicU64,
    /// Total messages delivered to the handler.
    pub messages_received: AtomicU64,
    /// Messages acknowledged after processing.
    pub messages_acked: AtomicU64,
    /// Messages handed back for redelivery.
    pub messages_retried: AtomicU64,
    /// Messages dropped without redelivery.
    pub messages_rejected: AtomicU64,
    /// Messages copied to the dead letter queue.
    pub messages_dlq: AtomicU64,
    /// Progress heartbeats sent for messages still being handled.
    pub progress_acks: AtomicU64,
    /// Current connection state (0 = disconnected, 1 = connected).
    pub connected: AtomicU64,
    /// Total bytes published.
    pub bytes_published: AtomicU64,
}

impl BrokerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_publish(&self, bytes: u64) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receive(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ack(&self) {
        self.messages_acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.messages_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reject(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dlq(&self) {
        self.messages_dlq.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_progress(&self) {
        self.progress_acks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_acked: self.messages_acked.load(Ordering::Relaxed),
            messages_retried: self.messages_retried.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
            messages_dlq: self.messages_dlq.load(Ordering::Relaxed),
            progress_acks: self.progress_acks.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed) == 1,
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_published: u64,
    pub publish_failures: u64,
    pub messages_received: u64,
    pub messages_acked: u64,
    pub messages_retried: u64,
    pub messages_rejected: u64,
    pub messages_dlq: u64,
    pub progress_acks: u64,
    pub connected: bool,
    pub bytes_published: u64,
}

/// Timer for measuring handler latency.
pub struct LatencyTimer {
    start: Instant,
}

impl LatencyTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
