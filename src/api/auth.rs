//! Session endpoints: login, registration, logout, explicit refresh, session status.
//!
//! Tokens issued by the backend never reach the browser as JSON. They are moved into
//! the session cookies and stripped from the relayed body.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::ApiState;
use super::error::ApiError;
use super::proxy::{JsonBody, json_body, relay_json};
use crate::auth::{AuthError, SessionTokens, SessionUpdate, record_session_update};
use crate::backend::{BackendError, BackendRequest, TokenPair};
use crate::gate::has_valid_tokens;
use crate::jwt::{now_secs, peek_claims};
use crate::rate_limit::rate_limit_login;

const MAX_PASSWORD_LENGTH: usize = 256;

pub fn router(state: ApiState) -> Router {
    let limited = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/session", get(session))
        .route("/me", get(me))
        .with_state(state)
        .merge(limited)
}

#[derive(Deserialize, Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize, Serialize)]
struct RegisterRequest {
    email: String,
    password: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

#[derive(Serialize)]
struct SessionResponse {
    authenticated: bool,
    expires_at: Option<u64>,
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::bad_request("Password is too long"));
    }
    Ok(())
}

pub(super) fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::bad_request("Invalid email address")),
    }
}

/// Move the token pair out of a backend auth response into the session cookies.
/// Returns whether the body carried a pair.
fn take_tokens(body: &mut Value) -> Result<bool, ApiError> {
    let Some(object) = body.as_object_mut() else {
        return Ok(false);
    };
    if !object.contains_key("access_token") && !object.contains_key("refresh_token") {
        return Ok(false);
    }

    let pair = TokenPair {
        access_token: take_string(object, "access_token"),
        refresh_token: take_string(object, "refresh_token"),
        expires_at: object.get("expires_at").cloned(),
    };
    if pair.access_token.is_empty() || pair.refresh_token.is_empty() {
        return Err(ApiError::internal("Backend returned an incomplete token pair"));
    }

    record_session_update(SessionUpdate::Rotate(pair));
    Ok(true)
}

fn take_string(object: &mut serde_json::Map<String, Value>, key: &str) -> String {
    match object.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

async fn login(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&payload.email, &payload.password)?;

    let request = BackendRequest::post("/api/v1/auth/login")
        .json(json!(payload))
        .skip_auth();
    let (status, mut body) = json_body(state.backend.send(&session, request).await?).await?;

    if !take_tokens(&mut body)? {
        return Err(ApiError::internal("Backend login response carried no tokens"));
    }
    info!("User logged in");
    Ok((status, Json(body)))
}

async fn register(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&payload.email, &payload.password)?;

    let request = BackendRequest::post("/api/v1/auth/register")
        .json(json!(payload))
        .skip_auth();
    let (status, mut body) = json_body(state.backend.send(&session, request).await?).await?;

    let signed_in = take_tokens(&mut body)?;
    info!(signed_in, "User registered");
    Ok((status, Json(body)))
}

/// Best effort: the backend is told, but cookies are cleared whatever it answers.
async fn logout(State(state): State<ApiState>, session: SessionTokens) -> impl IntoResponse {
    if session.access().is_some() {
        let mut request = BackendRequest::post("/api/v1/auth/logout");
        if let Some(refresh_token) = session.refresh() {
            request = request.json(json!({ "refresh_token": refresh_token }));
        }
        match state.backend.send(&session, request).await {
            Ok(result) if !result.status().is_success() => {
                warn!(status = result.status().as_u16(), "Backend logout failed")
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Backend logout failed"),
        }
    }

    record_session_update(SessionUpdate::Clear);
    Json(json!({ "success": true }))
}

async fn refresh(
    State(state): State<ApiState>,
    session: SessionTokens,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = session.refresh().ok_or(AuthError::NoRefreshToken)?;

    match state.backend.refresh_tokens(refresh_token).await {
        Ok(pair) => {
            let expires_at = pair.expires_at.clone();
            record_session_update(SessionUpdate::Rotate(pair));
            Ok((
                StatusCode::OK,
                Json(json!({ "success": true, "expires_at": expires_at })),
            ))
        }
        Err(BackendError::SessionExpired) => {
            record_session_update(SessionUpdate::Clear);
            Err(AuthError::TokenExpired.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Answered locally from the cookies; the backend is not consulted.
async fn session(session: SessionTokens) -> Json<SessionResponse> {
    let authenticated = has_valid_tokens(&session, now_secs());
    let expires_at = if authenticated {
        session
            .access()
            .and_then(|token| peek_claims(token).ok())
            .and_then(|claims| claims.exp)
    } else {
        None
    };
    Json(SessionResponse {
        authenticated,
        expires_at,
    })
}

async fn me(
    State(state): State<ApiState>,
    session: SessionTokens,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::get("/api/v1/auth/me");
    relay_json(state.backend.send(&session, request).await?).await
}
