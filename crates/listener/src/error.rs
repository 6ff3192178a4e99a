//! Errors returned synchronously by the service boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body is malformed or fails validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A job with this request id is still queued or running.
    #[error("request '{0}' is already in progress")]
    AlreadyInProgress(String),

    /// No job with this request id is known.
    #[error("unknown request '{0}'")]
    UnknownRequest(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::AlreadyInProgress(_) => StatusCode::CONFLICT,
            ServiceError::UnknownRequest(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
