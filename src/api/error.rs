//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::orchestrator::IngestError;
use crate::pipeline::skills::SkillError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "NOT_FOUND", m.clone()),
            ApiError::Ingest(e) => match e {
                IngestError::EmptyUpload => {
                    (StatusCode::BAD_REQUEST, "EMPTY_UPLOAD", e.to_string())
                }
                IngestError::Skill(SkillError::NotFound(_)) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "SKILL_NOT_FOUND", e.to_string())
                }
                IngestError::DeadlineExceeded { .. } => {
                    (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", e.to_string())
                }
                _ => (StatusCode::BAD_GATEWAY, "INGEST_FAILED", e.to_string()),
            },
            ApiError::Internal(m) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", m.clone())
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response = ApiError::BadRequest("no file".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound("job".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn empty_upload_maps_to_400() {
        let response = ApiError::Ingest(IngestError::EmptyUpload).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_skill_maps_to_422() {
        let err = IngestError::Skill(SkillError::NotFound("notary-x".into()));
        let response = ApiError::Ingest(err).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
