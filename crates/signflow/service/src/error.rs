//! Error types for the REST surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use signflow_engine::{DownloadRejection, EngineError, SessionRejection};
use thiserror::Error;

/// API-level errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Terminal signing-link state; carries its own user-facing message.
    #[error("{0}")]
    LinkRejected(SessionRejection),

    /// Terminal download-link state.
    #[error("{0}")]
    DownloadRejected(DownloadRejection),

    /// Required fields still unset at submission.
    #[error("Required fields missing")]
    MissingFields(Vec<String>),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::NoSigners => {
                ApiError::Validation("document requires at least one signer or approver".into())
            }
            EngineError::MissingRequiredFields(fields) => ApiError::MissingFields(fields),
            EngineError::Rejected(rejection) => ApiError::LinkRejected(rejection),
            EngineError::DownloadRejected(rejection) => ApiError::DownloadRejected(rejection),
            EngineError::NotFound(what) => ApiError::NotFound(what),
            EngineError::Downstream(msg) => ApiError::Upstream(msg),
            EngineError::Storage(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", None)
            }
            ApiError::LinkRejected(rejection) => {
                let (status, code) = match rejection {
                    SessionRejection::Invalid => (StatusCode::NOT_FOUND, "INVALID_LINK"),
                    SessionRejection::Expired => (StatusCode::GONE, "LINK_EXPIRED"),
                    SessionRejection::DocumentVoided => (StatusCode::GONE, "DOCUMENT_VOIDED"),
                    SessionRejection::AlreadySigned => (StatusCode::CONFLICT, "ALREADY_SIGNED"),
                    SessionRejection::Declined => (StatusCode::GONE, "DECLINED"),
                };
                (
                    status,
                    code,
                    Some(serde_json::json!({ "message": rejection.user_message() })),
                )
            }
            ApiError::DownloadRejected(rejection) => {
                let (status, code) = match rejection {
                    DownloadRejection::Invalid => (StatusCode::NOT_FOUND, "INVALID_LINK"),
                    DownloadRejection::Expired => (StatusCode::GONE, "LINK_EXPIRED"),
                };
                (
                    status,
                    code,
                    Some(serde_json::json!({ "message": rejection.user_message() })),
                )
            }
            ApiError::MissingFields(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_REQUIRED_FIELDS",
                Some(serde_json::json!({ "fields": fields })),
            ),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_distinct_statuses() {
        assert_eq!(
            ApiError::from(EngineError::Rejected(SessionRejection::Expired))
                .into_response()
                .status(),
            StatusCode::GONE
        );
        assert_eq!(
            ApiError::from(EngineError::Rejected(SessionRejection::AlreadySigned))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(EngineError::NoSigners).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(EngineError::MissingRequiredFields(vec!["signature".into()]))
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
