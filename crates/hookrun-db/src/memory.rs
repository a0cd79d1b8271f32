//! In-memory trigger and execution storage.
//!
//! Insertion order stands in for creation time, so "newest first" is reverse
//! insertion order even when timestamps collide.

use async_trait::async_trait;
use hookrun_core::execution::{Execution, ExecutionLog, ExecutionStatus};
use hookrun_core::ids::{ExecutionId, TriggerId};
use hookrun_core::ports::{ExecutionRepository, TriggerRepository};
use hookrun_core::trigger::Trigger;
use hookrun_core::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    triggers: RwLock<Vec<Trigger>>,
    executions: RwLock<Vec<Execution>>,
    logs: RwLock<HashMap<ExecutionId, Vec<ExecutionLog>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: u32, offset: u32) -> Vec<T> {
    items.skip(offset as usize).take(limit as usize).collect()
}

#[async_trait]
impl TriggerRepository for InMemoryStore {
    async fn create(&self, trigger: &Trigger) -> Result<()> {
        let mut triggers = self.triggers.write().await;
        if triggers.iter().any(|t| t.hash == trigger.hash) {
            return Err(Error::Validation("trigger hash already exists".to_string()));
        }
        triggers.push(trigger.clone());
        Ok(())
    }

    async fn get(&self, id: TriggerId) -> Result<Option<Trigger>> {
        let triggers = self.triggers.read().await;
        Ok(triggers.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Option<Trigger>> {
        let triggers = self.triggers.read().await;
        Ok(triggers.iter().find(|t| t.hash == hash).cloned())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Trigger>> {
        let triggers = self.triggers.read().await;
        Ok(page(triggers.iter().cloned(), limit, offset))
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryStore {
    async fn create(&self, execution: &Execution) -> Result<()> {
        let mut executions = self.executions.write().await;
        if executions.iter().any(|e| e.id == execution.id) {
            return Err(Error::Validation(format!(
                "execution {} already exists",
                execution.id
            )));
        }
        executions.push(execution.clone());
        Ok(())
    }

    async fn get(&self, id: ExecutionId) -> Result<Option<Execution>> {
        let executions = self.executions.read().await;
        Ok(executions.iter().find(|e| e.id == id).cloned())
    }

    async fn list_by_trigger(
        &self,
        trigger_id: TriggerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Execution>> {
        let executions = self.executions.read().await;
        Ok(page(
            executions
                .iter()
                .rev()
                .filter(|e| e.trigger_id == trigger_id)
                .cloned(),
            limit,
            offset,
        ))
    }

    async fn update_status(
        &self,
        id: ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    ) -> Result<bool> {
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                execution_id: id.to_string(),
                from,
                to,
            });
        }

        let mut executions = self.executions.write().await;
        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::ExecutionNotFound(id.to_string()))?;

        if execution.status != from {
            return Ok(false);
        }
        execution.transition(to)?;
        Ok(true)
    }

    async fn get_queued(&self, limit: u32) -> Result<Vec<Execution>> {
        let executions = self.executions.read().await;
        Ok(page(
            executions
                .iter()
                .filter(|e| e.status == ExecutionStatus::Queued)
                .cloned(),
            limit,
            0,
        ))
    }

    async fn append_log(&self, log: &ExecutionLog) -> Result<()> {
        let mut logs = self.logs.write().await;
        logs.entry(log.execution_id).or_default().push(log.clone());
        Ok(())
    }

    async fn logs(&self, execution_id: ExecutionId) -> Result<Vec<ExecutionLog>> {
        let logs = self.logs.read().await;
        let mut lines = logs.get(&execution_id).cloned().unwrap_or_default();
        lines.sort_by_key(|l| l.sequence);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trigger(hash: &str) -> Trigger {
        Trigger {
            id: TriggerId::new(),
            hash: hash.to_string(),
            action_to_run: "ci.yml".to_string(),
            link_repository: "https://github.com/alice/sample".to_string(),
            is_private: false,
            repository_token: None,
            has_envs: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_trigger_hash_is_unique() {
        let store = InMemoryStore::new();
        TriggerRepository::create(&store, &trigger("same")).await.unwrap();
        let err = TriggerRepository::create(&store, &trigger("same"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_status_compare_and_set() {
        let store = InMemoryStore::new();
        let execution = Execution::queued(TriggerId::new());
        ExecutionRepository::create(&store, &execution).await.unwrap();

        assert!(
            store
                .update_status(execution.id, ExecutionStatus::Queued, ExecutionStatus::InProgress)
                .await
                .unwrap()
        );
        // Second writer loses the race.
        assert!(
            !store
                .update_status(execution.id, ExecutionStatus::Queued, ExecutionStatus::InProgress)
                .await
                .unwrap()
        );

        let stored = ExecutionRepository::get(&store, execution.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ExecutionStatus::InProgress);
    }

    #[tokio::test]
    async fn test_update_status_rejects_backward_edge() {
        let store = InMemoryStore::new();
        let execution = Execution::queued(TriggerId::new());
        ExecutionRepository::create(&store, &execution).await.unwrap();

        let err = store
            .update_status(execution.id, ExecutionStatus::Queued, ExecutionStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_executions_listed_newest_first() {
        let store = InMemoryStore::new();
        let trigger_id = TriggerId::new();
        let first = Execution::queued(trigger_id);
        let second = Execution::queued(trigger_id);
        ExecutionRepository::create(&store, &first).await.unwrap();
        ExecutionRepository::create(&store, &second).await.unwrap();
        ExecutionRepository::create(&store, &Execution::queued(TriggerId::new()))
            .await
            .unwrap();

        let listed = store.list_by_trigger(trigger_id, 10, 0).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let queued = store.get_queued(10).await.unwrap();
        assert_eq!(queued.len(), 3);
        assert_eq!(queued[0].id, first.id);
    }

    #[tokio::test]
    async fn test_logs_in_sequence_order() {
        let store = InMemoryStore::new();
        let id = ExecutionId::new();
        store.append_log(&ExecutionLog::new(id, 2, "second")).await.unwrap();
        store.append_log(&ExecutionLog::new(id, 1, "first")).await.unwrap();

        let lines: Vec<_> = store
            .logs(id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.log)
            .collect();
        assert_eq!(lines, vec!["first", "second"]);
    }
}
