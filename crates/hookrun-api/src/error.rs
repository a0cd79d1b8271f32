//! Mapping of domain errors to HTTP responses.

use axum::http::StatusCode;
use hookrun_core::Error;
use tracing::error;

pub type ApiError = (StatusCode, String);

pub fn api_error(err: Error) -> ApiError {
    match err {
        Error::TriggerNotFound => (StatusCode::NOT_FOUND, "Trigger not found".to_string()),
        Error::ExecutionNotFound(_) => (StatusCode::NOT_FOUND, "Execution not found".to_string()),
        Error::Validation(_)
        | Error::InvalidWorkflow(_)
        | Error::InvalidRepositoryUrl(_)
        | Error::InvalidSecret(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        other => {
            error!(error = %other, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
