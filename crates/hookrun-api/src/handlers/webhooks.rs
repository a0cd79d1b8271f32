//! The signed webhook endpoint.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use hookrun_core::execution::Execution;
use hookrun_core::trigger::redact;
use std::sync::Arc;
use tracing::warn;

use crate::auth::{SIGNATURE_HEADER, verify_signature};
use crate::error::{ApiError, api_error};
use crate::state::AppState;

/// Queue an execution of the trigger identified by `hash`.
///
/// The body must be signed with the hash itself, so the signature is
/// checked before the trigger is looked up.
pub async fn execute_trigger(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Execution>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if hash.is_empty() || !verify_signature(hash.as_bytes(), &body, signature) {
        warn!(hash = %redact(&hash), "Rejected webhook with invalid signature");
        return Err((
            StatusCode::FORBIDDEN,
            "You don't have permission to do that action".to_string(),
        ));
    }

    let execution = state.coordinator.execute(&hash).await.map_err(api_error)?;
    Ok(Json(execution))
}
