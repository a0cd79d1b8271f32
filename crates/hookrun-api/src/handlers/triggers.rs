//! Trigger administration handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use hookrun_core::execution::{Execution, ExecutionLog};
use hookrun_core::ids::{ExecutionId, TriggerId};
use hookrun_core::trigger::{NewTrigger, RegisteredTrigger, Trigger};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, api_error};
use crate::state::AppState;

const MAX_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

/// A trigger as returned by the API. Never carries the repository token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub id: TriggerId,
    pub action_to_run: String,
    pub link_repository: String,
    pub is_private: bool,
    pub has_envs: bool,
    pub webhook_url: String,
    pub created_at: String,
}

impl TriggerResponse {
    fn new(trigger: &Trigger, webhook_url: String) -> Self {
        Self {
            id: trigger.id,
            action_to_run: trigger.action_to_run.clone(),
            link_repository: trigger.link_repository.clone(),
            is_private: trigger.is_private,
            has_envs: trigger.has_envs,
            webhook_url,
            created_at: trigger.created_at.to_rfc3339(),
        }
    }
}

pub async fn create_trigger(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTrigger>,
) -> Result<(StatusCode, Json<RegisteredTrigger>), ApiError> {
    let registered = state.triggers.register(request).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(registered)))
}

pub async fn list_triggers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TriggerResponse>>, ApiError> {
    let triggers = state
        .triggers
        .list_triggers(params.limit.min(MAX_LIMIT), params.offset)
        .await
        .map_err(api_error)?;

    Ok(Json(
        triggers
            .iter()
            .map(|t| TriggerResponse::new(t, state.triggers.webhook_url(&t.hash)))
            .collect(),
    ))
}

pub async fn list_executions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Execution>>, ApiError> {
    let trigger_id = parse_trigger_id(&id)?;

    let executions = state
        .triggers
        .list_executions(trigger_id, params.limit.min(MAX_LIMIT), params.offset)
        .await
        .map_err(api_error)?;

    Ok(Json(executions))
}

pub async fn execution_logs(
    State(state): State<Arc<AppState>>,
    Path((id, execution_id)): Path<(String, String)>,
) -> Result<Json<Vec<ExecutionLog>>, ApiError> {
    let trigger_id = parse_trigger_id(&id)?;
    let execution_id: ExecutionId = execution_id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid execution ID".to_string()))?;

    let logs = state
        .triggers
        .execution_logs(trigger_id, execution_id)
        .await
        .map_err(api_error)?;

    Ok(Json(logs))
}

fn parse_trigger_id(id: &str) -> Result<TriggerId, ApiError> {
    id.parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid trigger ID".to_string()))
}
