//! Trigger registration and the read side of triggers, executions and logs.

use hookrun_core::execution::{Execution, ExecutionLog};
use hookrun_core::ids::{ExecutionId, TriggerId};
use hookrun_core::ports::{ExecutionRepository, SecretStore, TriggerRepository};
use hookrun_core::repo_url::RepositoryLocation;
use hookrun_core::trigger::{NewTrigger, RegisteredTrigger, Trigger, normalize_link, validate_workflow_file};
use hookrun_core::{Error, Result};
use std::sync::Arc;
use tracing::info;

pub struct TriggerService {
    triggers: Arc<dyn TriggerRepository>,
    executions: Arc<dyn ExecutionRepository>,
    secrets: Arc<dyn SecretStore>,
    public_base_url: String,
}

impl TriggerService {
    pub fn new(
        triggers: Arc<dyn TriggerRepository>,
        executions: Arc<dyn ExecutionRepository>,
        secrets: Arc<dyn SecretStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            triggers,
            executions,
            secrets,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn webhook_url(&self, hash: &str) -> String {
        format!("{}/triggers-execute/{}", self.public_base_url, hash)
    }

    /// Validate and store a new trigger.
    ///
    /// The secret blob is written before the trigger row, so a stored
    /// trigger with `has_envs` always has a secret to fetch.
    pub async fn register(&self, request: NewTrigger) -> Result<RegisteredTrigger> {
        let link = normalize_link(&request.link_repository);
        validate(&request, &link)?;

        let hash = uuid::Uuid::new_v4().to_string();
        let has_envs = !request.envs.is_empty();

        if has_envs {
            let blob = serde_json::to_string(&request.envs)?;
            self.secrets.add(&hash, &blob).await?;
        }

        let trigger = Trigger {
            id: TriggerId::new(),
            hash,
            action_to_run: request.action_to_run.trim().to_string(),
            link_repository: link,
            is_private: request.is_private,
            repository_token: if request.is_private {
                request.repository_token
            } else {
                None
            },
            has_envs,
            created_at: chrono::Utc::now(),
        };
        self.triggers.create(&trigger).await?;

        info!(
            trigger_id = %trigger.id,
            repository = %trigger.link_repository,
            workflow = %trigger.action_to_run,
            has_envs,
            secret_backend = self.secrets.name(),
            "Trigger registered"
        );

        Ok(RegisteredTrigger {
            id: trigger.id,
            webhook_url: self.webhook_url(&trigger.hash),
            github_secret: trigger.hash,
        })
    }

    pub async fn list_triggers(&self, limit: u32, offset: u32) -> Result<Vec<Trigger>> {
        self.triggers.list(limit, offset).await
    }

    pub async fn get_trigger(&self, id: TriggerId) -> Result<Trigger> {
        self.triggers.get(id).await?.ok_or(Error::TriggerNotFound)
    }

    /// Executions of a trigger, newest first.
    pub async fn list_executions(
        &self,
        trigger_id: TriggerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Execution>> {
        self.get_trigger(trigger_id).await?;
        self.executions
            .list_by_trigger(trigger_id, limit, offset)
            .await
    }

    /// Logs of an execution in emission order. The execution must belong
    /// to the trigger.
    pub async fn execution_logs(
        &self,
        trigger_id: TriggerId,
        execution_id: ExecutionId,
    ) -> Result<Vec<ExecutionLog>> {
        let execution = self
            .executions
            .get(execution_id)
            .await?
            .filter(|e| e.trigger_id == trigger_id)
            .ok_or_else(|| Error::ExecutionNotFound(execution_id.to_string()))?;

        self.executions.logs(execution.id).await
    }
}

fn validate(request: &NewTrigger, link: &str) -> Result<()> {
    if request.action_to_run.trim().is_empty() {
        return Err(Error::Validation("actionToRun is required".to_string()));
    }
    validate_workflow_file(request.action_to_run.trim())?;

    if link.is_empty() {
        return Err(Error::Validation("linkRepository is required".to_string()));
    }

    let has_token = request
        .repository_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());

    if request.is_private {
        if !has_token {
            return Err(Error::Validation(
                "repositoryToken is required for private repositories".to_string(),
            ));
        }
        RepositoryLocation::parse(link)?;
    }

    for key in request.envs.keys() {
        hookrun_runner::dotenv::validate_key(key)
            .map_err(|_| Error::Validation(format!("`{}` is not a valid env name", key)))?;
    }

    Ok(())
}
