//! Execution and execution log types.

use crate::ids::{ExecutionId, LogId, TriggerId};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One run of a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: ExecutionId,
    pub trigger_id: TriggerId,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    /// A fresh execution waiting in the queue.
    pub fn queued(trigger_id: TriggerId) -> Self {
        let now = Utc::now();
        Self {
            id: ExecutionId::new(),
            trigger_id,
            status: ExecutionStatus::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting anything but the forward edges of the
    /// state machine.
    pub fn transition(&mut self, next: ExecutionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                execution_id: self.id.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// `Queued -> In Progress -> {Done | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    #[serde(rename = "Queued")]
    Queued,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
    #[serde(rename = "Failed")]
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Done | ExecutionStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (ExecutionStatus::Queued, ExecutionStatus::InProgress)
                | (ExecutionStatus::InProgress, ExecutionStatus::Done)
                | (ExecutionStatus::InProgress, ExecutionStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Queued => "Queued",
            ExecutionStatus::InProgress => "In Progress",
            ExecutionStatus::Done => "Done",
            ExecutionStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Queued" => Ok(ExecutionStatus::Queued),
            "In Progress" => Ok(ExecutionStatus::InProgress),
            "Done" => Ok(ExecutionStatus::Done),
            "Failed" => Ok(ExecutionStatus::Failed),
            other => Err(Error::Serialization(format!(
                "unknown execution status `{}`",
                other
            ))),
        }
    }
}

/// One captured line of workflow output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: LogId,
    pub execution_id: ExecutionId,
    /// 1-based position in the output stream. Reads order by this.
    pub sequence: u64,
    pub log: String,
    pub created_at: DateTime<Utc>,
}

impl ExecutionLog {
    pub fn new(execution_id: ExecutionId, sequence: u64, log: impl Into<String>) -> Self {
        Self {
            id: LogId::new(),
            execution_id,
            sequence,
            log: log.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut execution = Execution::queued(TriggerId::new());
        execution.transition(ExecutionStatus::InProgress).unwrap();
        execution.transition(ExecutionStatus::Done).unwrap();
        assert_eq!(execution.status, ExecutionStatus::Done);
    }

    #[test]
    fn test_rejects_skipping_in_progress() {
        let mut execution = Execution::queued(TriggerId::new());
        let err = execution.transition(ExecutionStatus::Done).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(execution.status, ExecutionStatus::Queued);
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [ExecutionStatus::Done, ExecutionStatus::Failed] {
            for next in [
                ExecutionStatus::Queued,
                ExecutionStatus::InProgress,
                ExecutionStatus::Done,
                ExecutionStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ExecutionStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        assert_eq!(
            "In Progress".parse::<ExecutionStatus>().unwrap(),
            ExecutionStatus::InProgress
        );
    }
}
