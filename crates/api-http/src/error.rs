//! HTTP Error Types
//!
//! Maps application errors to status codes. Every error body is `{"detail": message}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ingestq_core::domain::DomainError;
use ingestq_core::error::AppError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
#[error("{detail}")]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), detail = %self.detail, "Request failed");
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Domain(
                e @ (DomainError::InvalidIdentifier(_) | DomainError::IdentifierOverflow(_)),
            ) => Self::bad_request(e.to_string()),
            AppError::Domain(e @ (DomainError::EmptyIdentifiers | DomainError::InvalidPriority(_))) => {
                Self::unprocessable(e.to_string())
            }
            AppError::Domain(e) => Self::internal(e.to_string()),
            AppError::NotFound(msg) => Self::not_found(msg),
            AppError::StoreUnavailable(msg) => Self::unavailable(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Any body the extractor refuses (bad JSON, wrong types, unknown priority,
/// missing content type) is a 422, the same as a failed schema validation.
/// Integer ids too large for `i64` are not rejected here; see
/// [`IngestRequest`](crate::types::IngestRequest).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_is_bad_request() {
        let err: ApiError = AppError::Domain(DomainError::InvalidIdentifier(0)).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Invalid ID: 0. Must be between 1 and 10^9+7");
    }

    #[test]
    fn test_overflowing_identifier_is_bad_request() {
        let err: ApiError =
            AppError::Domain(DomainError::IdentifierOverflow("100000000000000000000".into())).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.detail,
            "Invalid ID: 100000000000000000000. Must be between 1 and 10^9+7"
        );
    }

    #[test]
    fn test_validation_failures_are_unprocessable() {
        let empty: ApiError = AppError::Domain(DomainError::EmptyIdentifiers).into();
        assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);

        let priority: ApiError =
            AppError::Domain(DomainError::InvalidPriority("URGENT".into())).into();
        assert_eq!(priority.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                AppError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_not_found_keeps_message() {
        let err: ApiError = AppError::NotFound("Ingestion job not found".into()).into();
        assert_eq!(err.to_string(), "Ingestion job not found");
    }
}
