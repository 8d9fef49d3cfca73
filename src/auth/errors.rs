//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Credential failures reported to API clients as 401 with a machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    NoAuthToken,
    NoRefreshToken,
    TokenExpired,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoAuthToken => "NO_AUTH_TOKEN",
            Self::NoRefreshToken => "NO_REFRESH_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NoAuthToken => "Authentication required",
            Self::NoRefreshToken => "Session has no refresh token",
            Self::TokenExpired => "Session expired, please log in again",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for AuthError {}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: self.code(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}
