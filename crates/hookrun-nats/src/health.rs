//! Health check for the dispatch queue.

use crate::metrics::BrokerMetrics;
use serde_json::json;
use std::sync::Arc;

/// Health status of the queue connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Degraded but functional.
    Degraded { reason: String },
    Unhealthy { reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Check if the service is operational (healthy or degraded).
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded { .. } => "degraded",
            HealthStatus::Unhealthy { .. } => "unhealthy",
        }
    }
}

/// Health check result with details.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub backend: &'static str,
    pub status: HealthStatus,
    pub connected: bool,
    pub messages_published: u64,
    pub publish_failures: u64,
    pub messages_rejected: u64,
}

impl HealthCheck {
    pub fn from_metrics(backend: &'static str, metrics: &Arc<BrokerMetrics>, connected: bool) -> Self {
        let snapshot = metrics.snapshot();

        let status = if connected {
            if snapshot.publish_failures > 0 {
                HealthStatus::Degraded {
                    reason: format!("{} publish failures recorded", snapshot.publish_failures),
                }
            } else {
                HealthStatus::Healthy
            }
        } else {
            HealthStatus::Unhealthy {
                reason: format!("Not connected to {}", backend),
            }
        };

        Self {
            backend,
            status,
            connected,
            messages_published: snapshot.messages_published,
            publish_failures: snapshot.publish_failures,
            messages_rejected: snapshot.messages_rejected,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let reason = match &self.status {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded { reason } | HealthStatus::Unhealthy { reason } => {
                Some(reason.clone())
            }
        };

        json!({
            "backend": self.backend,
            "status": self.status.as_str(),
            "reason": reason,
            "connected": self.connected,
            "messagesPublished": self.messages_published,
            "publishFailures": self.publish_failures,
            "messagesRejected": self.messages_rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_from_metrics() {
        let metrics = BrokerMetrics::new();
        let health = HealthCheck::from_metrics("nats", &metrics, true);
        assert!(health.status.is_healthy());

        metrics.record_publish_failure();
        let health = HealthCheck::from_metrics("nats", &metrics, true);
        assert!(!health.status.is_healthy());
        assert!(health.status.is_operational());
        assert_eq!(health.to_json()["status"], "degraded");

        let health = HealthCheck::from_metrics("nats", &metrics, false);
        assert!(!health.status.is_operational());
    }
}
