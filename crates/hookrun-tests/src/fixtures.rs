//! Test fixtures for creating sample data.

use chrono::Utc;
use hookrun_core::execution::Execution;
use hookrun_core::ids::TriggerId;
use hookrun_core::trigger::{NewTrigger, Trigger};
use std::collections::BTreeMap;

pub const REPOSITORY: &str = "https://github.com/alice/sample";
pub const TOKEN: &str = "tok";

/// Factory for registration requests.
pub struct NewTriggerFixture;

impl NewTriggerFixture {
    pub fn public() -> NewTrigger {
        NewTrigger {
            action_to_run: "ci.yml".to_string(),
            link_repository: REPOSITORY.to_string(),
            ..Default::default()
        }
    }

    pub fn private() -> NewTrigger {
        NewTrigger {
            is_private: true,
            repository_token: Some(TOKEN.to_string()),
            ..Self::public()
        }
    }

    pub fn with_envs(pairs: &[(&str, &str)]) -> NewTrigger {
        NewTrigger {
            envs: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..Self::public()
        }
    }
}

/// Factory for stored triggers.
pub struct TriggerFixture;

impl TriggerFixture {
    pub fn public() -> Trigger {
        Trigger {
            id: TriggerId::new(),
            hash: format!("hash-{}", TriggerId::new().as_uuid()),
            action_to_run: "ci.yml".to_string(),
            link_repository: REPOSITORY.to_string(),
            is_private: false,
            repository_token: None,
            has_envs: false,
            created_at: Utc::now(),
        }
    }

    pub fn private() -> Trigger {
        Trigger {
            is_private: true,
            repository_token: Some(TOKEN.to_string()),
            ..Self::public()
        }
    }
}

/// Factory for executions.
pub struct ExecutionFixture;

impl ExecutionFixture {
    pub fn queued(trigger: &Trigger) -> Execution {
        Execution::queued(trigger.id)
    }
}
