use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used for every request the URL gate refuses to serve.
///
/// Rejections never say which path segment or policy caused them.
pub const GENERIC_NOT_FOUND: &str = "not found";

/// Stable, machine-readable error codes.
///
/// Clients match on the code, never on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    ValidationFailed,
    PermissionDenied,
    StorageError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::StorageError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response: `{"code": "NOT_FOUND", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Error type shared by the admin API and the gate.
///
/// Display is the bare message; the code travels separately.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// Caller may not use this surface.
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// The opaque 404 the gate answers with when a policy rejects a request.
    pub fn generic_not_found() -> Self {
        ServiceError::NotFound(GENERIC_NOT_FOUND.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::Conflict(_) => ErrorCode::AlreadyExists,
            ServiceError::Validation(_) => ErrorCode::ValidationFailed,
            ServiceError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            ServiceError::Storage(_) => ErrorCode::StorageError,
            ServiceError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.code().as_str()
    }

    pub fn status_code(&self) -> StatusCode {
        self.code().status()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), axum::Json(self.body())).into_response()
    }
}
