//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dashboard::DashboardError;
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Dashboard gesture failed
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// Store layer error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

fn store_status(error: &StoreError) -> (StatusCode, &'static str) {
    match error {
        StoreError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
        StoreError::NotAnObject(_) => (StatusCode::CONFLICT, "TYPE_CONFLICT"),
        StoreError::EntryTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "ENTRY_TOO_LARGE"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    }
}

impl ApiError {
    /// Status code and machine-readable code for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Dashboard(e) => match e {
                DashboardError::InvalidLoad(_) => (StatusCode::BAD_REQUEST, "INVALID_LOAD"),
                DashboardError::Store(e) => store_status(e),
                DashboardError::LimitWrites { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "LIMIT_WRITE_FAILED")
                }
                DashboardError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            },
            ApiError::Store(e) => store_status(e),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid = ApiError::from(DashboardError::InvalidLoad(9));
        assert_eq!(invalid.status(), (StatusCode::BAD_REQUEST, "INVALID_LOAD"));
        assert_eq!(invalid.to_string(), "Invalid load number: 9 (expected 1-4)");

        let conflict = ApiError::from(StoreError::NotAnObject("relays/relay1".to_string()));
        assert_eq!(conflict.status(), (StatusCode::CONFLICT, "TYPE_CONFLICT"));

        let too_large = ApiError::from(StoreError::EntryTooLarge { size: 5, max: 4 });
        assert_eq!(too_large.status(), (StatusCode::PAYLOAD_TOO_LARGE, "ENTRY_TOO_LARGE"));

        let nested = ApiError::from(DashboardError::Store(StoreError::Closed));
        assert_eq!(nested.status().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_body_shape() {
        let response = ApiError::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
