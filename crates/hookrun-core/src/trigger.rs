//! Trigger types: a hash-authenticated binding from a webhook to a workflow
//! file in a remote repository.

use crate::ids::TriggerId;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// A registered pipeline binding. Never mutated after creation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub id: TriggerId,
    /// Bearer credential and webhook signing key. Unique across triggers.
    pub hash: String,
    /// Workflow file name, relative to the workflows directory.
    pub action_to_run: String,
    /// Repository URL as stored, without a `.git` suffix.
    pub link_repository: String,
    pub is_private: bool,
    pub repository_token: Option<String>,
    pub has_envs: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
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
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Registration request for a new trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrigger {
    #[serde(default)]
    pub action_to_run: String,
    #[serde(default)]
    pub link_repository: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub repository_token: Option<String>,
    /// Environment secrets handed to the workflow tool. Stored in the secret
    /// store, never on the trigger itself.
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredTrigger {
    pub id: TriggerId,
    pub webhook_url: String,
    /// The trigger hash, to be configured as the webhook secret.
    pub github_secret: String,
}

/// Trims a trailing `/` and `.git` so every stored link has the same shape.
pub fn normalize_link(link: &str) -> String {
    let trimmed = link.trim().trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
}

/// Checks that a workflow identifier is a plain relative path that stays
/// inside the workflows directory.
pub fn validate_workflow_file(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidWorkflow("workflow file is empty".to_string()));
    }

    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(Error::InvalidWorkflow(format!(
            "`{}` must be a relative path inside the workflows directory",
            name
        )));
    }

    Ok(())
}

/// Shortens a credential for logs and error messages.
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}***", visible)
}
