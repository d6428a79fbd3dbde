use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Validation(_) | RagError::Embedding(_) => {
                ApiError::BadRequest(err.to_string())
            }
            RagError::DuplicateId(_) => ApiError::Conflict(err.to_string()),
            RagError::StoreUnavailable(_) | RagError::Configuration(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let message = match &self {
            ApiError::ServiceUnavailable(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Timeout(_) => self.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
