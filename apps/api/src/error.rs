//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shelf                                  │
//! │                                                                         │
//! │  Handler                                                               │
//! │  Result<T, ApiError>                                                   │
//! │       │                                                                 │
//! │       ├── DbError::NotFound ──────────────► 404 not_found              │
//! │       ├── DbError::UniqueViolation ───────► 400 invalid (per field)    │
//! │       ├── ValidationError ────────────────► 400 invalid (per field)    │
//! │       ├── CoreError::InvalidPage ─────────► 404 not_found              │
//! │       ├── missing / bad token ────────────► 401                        │
//! │       ├── not the author ─────────────────► 403 permission_denied      │
//! │       ├── throttle exceeded ──────────────► 429 + Retry-After          │
//! │       └── anything else ──────────────────► 500 (logged, generic text) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! {
//!   "code": "invalid",
//!   "detail": "rating must be between 1 and 5",
//!   "fields": { "rating": ["rating must be between 1 and 5"] }
//! }
//! ```

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shelf_core::{CoreError, ValidationError};
use shelf_db::DbError;

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Input validation failed (400)
    Invalid,

    /// No credentials were sent (401)
    NotAuthenticated,

    /// Credentials or token were rejected (401)
    AuthenticationFailed,

    /// Authenticated but not allowed (403)
    PermissionDenied,

    /// Resource not found (404)
    NotFound,

    /// Rate limit exceeded (429)
    Throttled,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for the code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Invalid => StatusCode::BAD_REQUEST,
            ErrorCode::NotAuthenticated | ErrorCode::AuthenticationFailed => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Throttled => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable message
    pub detail: String,

    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,

    /// Seconds until a throttled client may retry
    #[serde(skip)]
    pub retry_after: Option<u64>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        ApiError {
            code,
            detail: detail.into(),
            fields: None,
            retry_after: None,
        }
    }

    /// Creates a validation error attached to a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), vec![message.clone()]);

        ApiError {
            code: ErrorCode::Invalid,
            detail: message,
            fields: Some(fields),
            retry_after: None,
        }
    }

    /// Creates a validation error without a field.
    pub fn invalid(detail: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Invalid, detail)
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("No {} matches the given query.", resource),
        )
    }

    /// Request carried no credentials.
    pub fn not_authenticated() -> Self {
        ApiError::new(
            ErrorCode::NotAuthenticated,
            "Authentication credentials were not provided.",
        )
    }

    /// Credentials or token were rejected.
    pub fn authentication_failed(detail: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::AuthenticationFailed, detail)
    }

    /// Caller may not act on the resource.
    pub fn permission_denied() -> Self {
        ApiError::new(
            ErrorCode::PermissionDenied,
            "You do not have permission to perform this action.",
        )
    }

    /// Caller exceeded a rate limit.
    pub fn throttled(wait_secs: u64) -> Self {
        ApiError {
            code: ErrorCode::Throttled,
            detail: format!(
                "Request was throttled. Expected available in {} seconds.",
                wait_secs
            ),
            fields: None,
            retry_after: Some(wait_secs),
        }
    }

    /// Creates an internal error. The message is what the client sees.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ApiError {}

/// Converts validation errors to per-field API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = match &err {
            ValidationError::InvalidFormat { reason, .. } | ValidationError::Rejected { reason, .. } => {
                reason.clone()
            }
            other => other.to_string(),
        };
        ApiError::field(err.field(), message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPage => ApiError::new(ErrorCode::NotFound, "Invalid page."),
            CoreError::ReservedAccount(_) => ApiError::permission_denied(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(&entity),
            DbError::UniqueViolation { field, value } => {
                ApiError::field(field.clone(), format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::invalid("Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint violation: {}", message);
                ApiError::invalid("Value out of range")
            }
            DbError::Domain(e) => e.into(),
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::internal("A server error occurred.")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::internal("A server error occurred.")
            }
        }
    }
}

/// Malformed or missing JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid(format!("JSON parse error - {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after;

        let mut response = (status, Json(self)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
