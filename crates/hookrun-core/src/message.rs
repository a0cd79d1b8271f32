//! The dispatch message carried by the broker from the coordinator to the
//! worker.

use crate::execution::{Execution, ExecutionStatus};
use crate::ids::{ExecutionId, TriggerId};
use crate::trigger::{Trigger, redact};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema tag written into every dispatch message.
pub const DISPATCH_SCHEMA_V1: &str = "hookrun.dispatch.v1";

fn default_schema() -> String {
    DISPATCH_SCHEMA_V1.to_string()
}

/// Snapshot of an execution plus the trigger it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMessage {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub id: ExecutionId,
    pub trigger_id: TriggerId,
    pub status: ExecutionStatus,
    pub trigger: TriggerSnapshot,
}

/// Trigger fields the worker needs. `link_repository` carries the `.git`
/// suffix added at dispatch time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSnapshot {
    pub id: TriggerId,
    pub hash: String,
    pub action_to_run: String,
    pub link_repository: String,
    pub is_private: bool,
    #[serde(default)]
    pub repository_token: Option<String>,
    pub has_envs: bool,
}

impl fmt::Debug for TriggerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerSnapshot")
            .field("id", &self.id)
            .field("hash", &redact(&self.hash))
            .field("action_to_run", &self.action_to_run)
            .field("link_repository", &self.link_repository)
            .field("is_private", &self.is_private)
            .field(
                "repository_token",
                &self.repository_token.as_ref().map(|_| "***"),
            )
            .field("has_envs", &self.has_envs)
            .finish()
    }
}

impl DispatchMessage {
    pub fn new(execution: &Execution, trigger: &Trigger) -> Self {
        Self {
            schema: default_schema(),
            id: execution.id,
            trigger_id: execution.trigger_id,
            status: execution.status,
            trigger: TriggerSnapshot {
                id: trigger.id,
                hash: trigger.hash.clone(),
                action_to_run: trigger.action_to_run.clone(),
                link_repository: format!("{}.git", trigger.link_repository),
                is_private: trigger.is_private,
                repository_token: trigger.repository_token.clone(),
                has_envs: trigger.has_envs,
            },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a broker payload. Every failure is a poison message.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let message: DispatchMessage = serde_json::from_slice(payload)
            .map_err(|e| Error::MalformedMessage(e.to_string()))?;

        if message.schema != DISPATCH_SCHEMA_V1 {
            return Err(Error::MalformedMessage(format!(
                "unsupported schema `{}`",
                message.schema
            )));
        }

        if message.trigger_id != message.trigger.id {
            return Err(Error::MalformedMessage(
                "triggerId does not match trigger.id".to_string(),
            ));
        }

        Ok(message)
    }
}
