//! API route definitions.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, triggers, webhooks};
use crate::middleware::{request_id, require_api_key};
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(admin_routes(state.clone()))
        .route("/triggers-execute/{hash}", post(webhooks::execute_trigger))
        .route("/health", get(health::health))
        .layer(axum_middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/triggers",
            get(triggers::list_triggers).post(triggers::create_trigger),
        )
        .route("/triggers/{id}/executions", get(triggers::list_executions))
        .route(
            "/triggers/{id}/executions/{execution_id}/logs",
            get(triggers::execution_logs),
        )
        .route_layer(axum_middleware::from_fn_with_state(state, require_api_key))
}
