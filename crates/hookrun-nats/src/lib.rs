//! Dispatch queue adapters for hookrun.
//!
//! [`NatsQueue`] is the durable JetStream work queue used in production.
//! [`MemoryQueue`] is an in-process queue with the same delivery semantics.

pub mod config;
pub mod delivery;
pub mod health;
pub mod memory;
pub mod metrics;
mod queue;

pub use config::NatsConfig;
pub use delivery::Disposition;
pub use health::{HealthCheck, HealthStatus};
pub use memory::MemoryQueue;
pub use metrics::{BrokerMetrics, MetricsSnapshot};
pub use queue::{NatsQueue, StreamInfo};
