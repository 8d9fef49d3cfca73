//! Relaying backend responses to the browser.

use axum::{
    Json,
    body::Body,
    extract::{FromRequest, Request},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ApiError;
use crate::backend::{BackendError, BackendResponse, ErrorEnvelope};

/// Headers copied from a backend download onto the browser response.
const PASSTHROUGH_HEADERS: [header::HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::CONTENT_DISPOSITION,
    header::CONTENT_LENGTH,
];

/// JSON body extractor whose rejection renders as an [`ApiError`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Convert a non-2xx backend response into an error mirroring its status.
pub async fn upstream_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let envelope = ErrorEnvelope::parse(&body);

    debug!(status = status.as_u16(), "Backend returned an error");

    ApiError::Upstream {
        status,
        code: envelope.code().unwrap_or_else(|| default_code(status).to_string()),
        message: envelope.message().unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Backend request failed")
                .to_string()
        }),
    }
}

fn default_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => "VALIDATION_ERROR",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "CONFLICT",
        StatusCode::TOO_MANY_REQUESTS => "RATE_LIMITED",
        _ => "BACKEND_ERROR",
    }
}

/// Fail with the mirrored backend error unless the response is 2xx.
pub async fn ensure_success(result: BackendResponse) -> Result<reqwest::Response, ApiError> {
    if result.status().is_success() {
        Ok(result.response)
    } else {
        Err(upstream_error(result.response).await)
    }
}

/// Read a 2xx JSON body; empty bodies read as `null`.
pub async fn json_body(result: BackendResponse) -> Result<(StatusCode, Value), ApiError> {
    let response = ensure_success(result).await?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| BackendError::from_reqwest(&e))?;

    if body.is_empty() {
        return Ok((status, Value::Null));
    }
    let value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::internal_error("Backend returned invalid JSON", e))?;
    Ok((status, value))
}

/// Pass a JSON response through with the backend's status.
pub async fn relay_json(result: BackendResponse) -> Result<Response, ApiError> {
    match json_body(result).await? {
        (status, Value::Null) => Ok(status.into_response()),
        (status, value) => Ok((status, Json(value)).into_response()),
    }
}

/// Stream a binary response through, keeping its content headers.
pub async fn relay_binary(result: BackendResponse) -> Result<Response, ApiError> {
    let upstream = ensure_success(result).await?;
    let status = upstream.status();
    let headers: Vec<(header::HeaderName, HeaderValue)> = PASSTHROUGH_HEADERS
        .iter()
        .filter_map(|name| {
            upstream
                .headers()
                .get(name)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    response.headers_mut().extend(headers);
    Ok(response)
}
