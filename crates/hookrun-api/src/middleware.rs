//! HTTP middleware for the API server.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::auth::{API_KEY_HEADER, constant_time_eq};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inject a request ID into each request and its response.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok();
    if let Some(value) = &request_id {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;
    if let Some(value) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Reject requests whose `x-api-key` does not match the configured key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let authorized = match &state.api_key {
        Some(expected) => constant_time_eq(expected.as_bytes(), provided.as_bytes()),
        None => false,
    };

    if !authorized {
        warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return Err((
            StatusCode::FORBIDDEN,
            "You don't have permission to do that action".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
