//! Error types for hookrun.

use crate::execution::ExecutionStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Lookup errors
    #[error("Trigger not found")]
    TriggerNotFound,

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    // State machine errors
    #[error("Invalid status transition for execution {execution_id}: {from} -> {to}")]
    InvalidTransition {
        execution_id: String,
        from: ExecutionStatus,
        to: ExecutionStatus,
    },

    // Secret errors
    #[error("Secret unavailable: {0}")]
    SecretUnavailable(String),

    #[error("Invalid secret blob: {0}")]
    InvalidSecret(String),

    // Process errors
    #[error("Failed to start process `{program}`: {message}")]
    ProcessStart { program: String, message: String },

    #[error("Process failed with exit code {exit_code:?}: {message}")]
    ProcessFailed {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("Execution timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Cleanup failed: {0}")]
    Cleanup(String),

    // Message errors
    #[error("Malformed dispatch message: {0}")]
    MalformedMessage(String),

    // Validation errors
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Invalid workflow file: {0}")]
    InvalidWorkflow(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a broker should redeliver the message that produced this error.
    ///
    /// Poison messages and requests that can never succeed are terminal;
    /// infrastructure hiccups are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::MalformedMessage(_)
                | Error::TriggerNotFound
                | Error::ExecutionNotFound(_)
                | Error::InvalidTransition { .. }
                | Error::InvalidSecret(_)
                | Error::InvalidRepositoryUrl(_)
                | Error::InvalidWorkflow(_)
                | Error::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poison_messages_are_not_retried() {
        assert!(!Error::MalformedMessage("bad json".into()).is_retryable());
        assert!(!Error::ExecutionNotFound("exe_1".into()).is_retryable());
    }

    #[test]
    fn test_infrastructure_errors_are_retried() {
        assert!(Error::Database("connection reset".into()).is_retryable());
        assert!(Error::SecretUnavailable("timeout".into()).is_retryable());
    }
}
