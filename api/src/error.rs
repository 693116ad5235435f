use authz::{AuthzError, ReasonCode};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid principal headers: {0}")]
    InvalidPrincipal(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure for OpenAPI documentation
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Authz(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::UnknownResourceKind(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPrincipal(_) => StatusCode::UNAUTHORIZED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Authz(AuthzError::Validation(_)) => "VALIDATION_ERROR",
            ApiError::Authz(AuthzError::AuthenticationMissing) => "UNAUTHORIZED",
            ApiError::Authz(AuthzError::Denied { .. }) => "FORBIDDEN",
            ApiError::Authz(AuthzError::NotFound { .. }) => "NOT_FOUND",
            ApiError::Authz(AuthzError::Store(_)) => "INTERNAL_ERROR",
            ApiError::UnknownResourceKind(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidPrincipal(_) => "UNAUTHORIZED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to any client.
    fn public_message(&self) -> String {
        match self {
            ApiError::Authz(AuthzError::Store(_)) | ApiError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Diagnostic detail, only rendered outside production.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Authz(AuthzError::Denied { reason }) => {
                Some(json!({ "reason_code": reason.as_str() }))
            }
            ApiError::Authz(AuthzError::NotFound { reason, kind, id }) => Some(json!({
                "reason_code": reason.as_str(),
                "kind": kind.as_str(),
                "id": id,
            })),
            ApiError::Authz(AuthzError::Store(err)) => Some(json!({ "store_error": err.message })),
            ApiError::InternalError(message) => Some(json!({ "cause": message })),
            _ => None,
        }
    }

    /// Reason code carried by the underlying authorization failure.
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            ApiError::Authz(err) => err.reason_code(),
            _ => None,
        }
    }

    /// Render the error. Production responses omit internal detail, so a
    /// broken ownership chain looks like any other missing resource.
    pub fn into_response_with(self, verbose: bool) -> Response {
        let status = self.status_code();
        let error_response = ApiErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
                details: if verbose { self.details() } else { None },
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
