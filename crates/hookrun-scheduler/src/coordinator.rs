//! Turns a webhook hit into a queued execution and a dispatch message.

use hookrun_core::execution::Execution;
use hookrun_core::message::DispatchMessage;
use hookrun_core::ports::{ExecutionRepository, MessageBroker, TriggerRepository};
use hookrun_core::trigger::redact;
use hookrun_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct Coordinator {
    triggers: Arc<dyn TriggerRepository>,
    executions: Arc<dyn ExecutionRepository>,
    broker: Arc<dyn MessageBroker>,
}

impl Coordinator {
    pub fn new(
        triggers: Arc<dyn TriggerRepository>,
        executions: Arc<dyn ExecutionRepository>,
        broker: Arc<dyn MessageBroker>,
    ) -> Self {
        Self {
            triggers,
            executions,
            broker,
        }
    }

    /// Create a queued execution for the trigger identified by `hash` and
    /// enqueue it.
    ///
    /// The execution is persisted before anything is published. A publish
    /// failure is logged and does not fail the call; the execution stays
    /// `Queued` until [`Coordinator::redispatch_queued`] picks it up.
    pub async fn execute(&self, hash: &str) -> Result<Execution> {
        let trigger = self
            .triggers
            .get_by_hash(hash)
            .await?
            .ok_or(Error::TriggerNotFound)?;

        let execution = Execution::queued(trigger.id);
        self.executions.create(&execution).await?;

        info!(
            execution_id = %execution.id,
            trigger_id = %trigger.id,
            "Execution queued"
        );

        let message = DispatchMessage::new(&execution, &trigger);
        if let Err(e) = self.broker.publish(&message).await {
            error!(
                execution_id = %execution.id,
                hash = %redact(hash),
                error = %e,
                "Failed to publish dispatch message, execution left queued"
            );
        }

        Ok(execution)
    }

    /// Republish every execution that has been `Queued` for longer than
    /// `older_than`. Returns the number of messages published.
    pub async fn redispatch_queued(&self, limit: u32, older_than: Duration) -> Result<usize> {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(older_than).unwrap_or(chrono::Duration::zero());
        let queued = self.executions.get_queued(limit).await?;
        let mut published = 0;

        for execution in queued.iter().filter(|e| e.created_at <= cutoff) {
            let Some(trigger) = self.triggers.get(execution.trigger_id).await? else {
                warn!(
                    execution_id = %execution.id,
                    trigger_id = %execution.trigger_id,
                    "Queued execution references a missing trigger"
                );
                continue;
            };

            self.broker
                .publish(&DispatchMessage::new(execution, &trigger))
                .await?;
            published += 1;
            debug!(execution_id = %execution.id, "Execution redispatched");
        }

        if published > 0 {
            info!(count = published, "Redispatched queued executions");
        }
        Ok(published)
    }

    /// Run [`Coordinator::redispatch_queued`] every `interval` until shutdown.
    pub async fn run_reconciliation(
        self: Arc<Self>,
        interval: Duration,
        limit: u32,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.redispatch_queued(limit, interval).await {
                        warn!(error = %e, "Reconciliation sweep failed");
                    }
                }
            }
        }

        debug!("Reconciliation loop stopped");
    }
}
