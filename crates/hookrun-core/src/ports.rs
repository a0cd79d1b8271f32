//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the execution pipeline and its
//! adapters: storage, the secret backend and the message broker.

use crate::execution::{Execution, ExecutionLog, ExecutionStatus};
use crate::ids::*;
use crate::message::DispatchMessage;
use crate::trigger::Trigger;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Repository for triggers.
#[async_trait]
pub trait TriggerRepository: Send + Sync {
    /// Store a new trigger. Fails if the hash is already taken.
    async fn create(&self, trigger: &Trigger) -> Result<()>;

    /// Get a trigger by ID.
    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>>;

    /// Get a trigger by its hash credential.
    async fn get_by_hash(&self, hash: &str) -> Result<Option<Trigger>>;

    /// List triggers, oldest first.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Trigger>>;
}

/// Repository for executions and their captured output.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Create a new execution.
    async fn create(&self, execution: &Execution) -> Result<()>;

    /// Get an execution by ID.
    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>>;

    /// Executions of a trigger, newest first.
    async fn list_by_trigger(
        &self,
        trigger_id: TriggerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Execution>>;

    /// Compare-and-set status write.
    ///
    /// Returns `Ok(false)` when the stored status is no longer `from`, so
    /// two writers can never both move the same execution forward.
    async fn update_status(
        &self,
        id: ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<bool>;

    /// Queued executions, oldest first.
    async fn get_queued(&self, limit: u32) -> Result<Vec<Execution>>;

    /// Append one captured output line.
    async fn append_log(&self, log: &ExecutionLog) -> Result<()>;

    /// Captured output of an execution in sequence order.
    async fn logs(&self, execution_id: ExecutionId) -> Result<Vec<ExecutionLog>>;
}

/// Opaque key to JSON-blob secret backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn add(&self, key: &str, value: &str) -> Result<()>;

    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<String>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Processes one delivered message payload.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// `Ok` acknowledges the message. An error is redelivered when
    /// [`crate::Error::is_retryable`] says so, and dropped otherwise.
    async fn handle(&self, payload: &[u8]) -> Result<()>;
}

/// Durable FIFO queue between the coordinator and the worker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Enqueue a dispatch message.
    async fn publish(&self, message: &DispatchMessage) -> Result<()>;

    /// Deliver messages to `handler` one at a time until `shutdown` flips to
    /// `true`.
    async fn consume(
        &self,
        handler: Arc<dyn MessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()>;
}
