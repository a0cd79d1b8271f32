//! Application state shared across handlers.

use hookrun_nats::HealthCheck;
use hookrun_scheduler::{Coordinator, TriggerService};
use std::sync::Arc;

/// Reports the broker's current health.
pub type HealthProbe = Arc<dyn Fn() -> HealthCheck + Send + Sync>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub triggers: Arc<TriggerService>,
    pub coordinator: Arc<Coordinator>,
    /// Key required in `x-api-key` for the admin routes. Without one, the
    /// admin routes refuse every request.
    pub api_key: Option<String>,
    pub broker_health: Option<HealthProbe>,
}

impl AppState {
    pub fn new(
        triggers: Arc<TriggerService>,
        coordinator: Arc<Coordinator>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            triggers,
            coordinator,
            api_key: api_key.filter(|k| !k.is_empty()),
            broker_health: None,
        }
    }

    pub fn with_broker_health(mut self, probe: HealthProbe) -> Self {
        self.broker_health = Some(probe);
        self
    }
}
