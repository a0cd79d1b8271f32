//! What a broker does with a message after the handler returns.

use hookrun_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processed; remove from the queue.
    Ack,
    /// Transient failure; redeliver while attempts remain.
    Retry,
    /// Poison message; never redeliver.
    Reject,
}

impl Disposition {
    pub fn of(outcome: &Result<()>) -> Self {
        match outcome {
            Ok(()) => Disposition::Ack,
            Err(e) if e.is_retryable() => Disposition::Retry,
            Err(_) => Disposition::Reject,
        }
    }

    /// Retries collapse into a rejection once `attempt` reaches `max_deliver`.
    pub fn with_attempt(self, attempt: i64, max_deliver: i64) -> Self {
        match self {
            Disposition::Retry if max_deliver > 0 && attempt >= max_deliver => {
                Disposition::Reject
            }
            other => other,
        }
    }
}
