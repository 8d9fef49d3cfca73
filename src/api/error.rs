//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::backend::BackendError;

const MAX_ID_LENGTH: usize = 128;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn internal_err(self, msg: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn internal_err(self, msg: &str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::internal_error(msg, e))
    }
}

/// API error type with automatic response conversion.
///
/// Every variant renders as `{"error": CODE, "message": text}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Auth(AuthError),
    NotFound(String),
    RateLimited,
    /// Non-2xx backend answer, status mirrored
    Upstream {
        status: StatusCode,
        code: String,
        message: String,
    },
    /// `FASTAPI_BASE_URL` missing
    Configuration,
    /// Backend could not be reached
    Unavailable,
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn internal_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal(context.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Configuration | ApiError::Unavailable | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Auth(e) => e.code(),
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RateLimited => "RATE_LIMITED",
            ApiError::Upstream { code, .. } => code,
            ApiError::Configuration => "CONFIGURATION_ERROR",
            ApiError::Unavailable => "BACKEND_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
            ApiError::Auth(e) => e.message(),
            ApiError::RateLimited => "Too many requests. Please try again later.",
            ApiError::Upstream { message, .. } => message,
            ApiError::Configuration => "Backend service URL is not configured",
            ApiError::Unavailable => "Backend service is unavailable",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status().as_u16(), self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::SessionExpired => Self::Auth(AuthError::TokenExpired),
            BackendError::NotConfigured => {
                error!("FASTAPI_BASE_URL is not set, cannot reach backend");
                Self::Configuration
            }
            BackendError::Unreachable(e) => {
                error!(error = %e, "Backend unreachable");
                Self::Unavailable
            }
            BackendError::InvalidUrl(e) => Self::internal_error("Invalid backend URL", e),
            BackendError::Transport(e) => Self::internal_error("Backend request failed", e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        Self::BadRequest("Invalid JSON in request body".into())
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.code(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}

/// Validate a path id before it is interpolated into a backend path.
pub fn validate_id(id: &str, what: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::bad_request(format!("{} cannot be empty", what)));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(ApiError::bad_request(format!("{} is too long", what)));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::bad_request(format!("Invalid {} format", what)));
    }
    Ok(())
}
