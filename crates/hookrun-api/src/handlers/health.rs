//! Health check handler.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let broker = state.broker_health.as_ref().map(|probe| probe());
    let operational = broker
        .as_ref()
        .is_none_or(|check| check.status.is_operational());

    let status = if operational {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if operational { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "broker": broker.map(|check| check.to_json()),
        })),
    )
}
