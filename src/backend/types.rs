//! Wire types shared with the external backend.

use axum::body::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backend path that exchanges a refresh token for a new pair.
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Access/refresh pair issued by the backend on login and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Passed through untouched; the backend may send a timestamp or an ISO string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Value>,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Error body shapes the backend is known to produce:
/// `{"error": {"code", "message"}}`, `{"error": "...", "message": "..."}`, or
/// FastAPI's `{"detail": ...}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
}

impl ErrorEnvelope {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Machine-readable code, if the body carries one.
    pub fn code(&self) -> Option<String> {
        match &self.error {
            Some(Value::Object(inner)) => inner
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string),
            Some(Value::String(code)) => Some(code.clone()),
            _ => None,
        }
    }

    /// Human-readable message, if the body carries one.
    pub fn message(&self) -> Option<String> {
        if let Some(Value::Object(inner)) = &self.error {
            if let Some(message) = inner.get("message").and_then(Value::as_str) {
                return Some(message.to_string());
            }
        }
        if let Some(message) = &self.message {
            return Some(message.clone());
        }
        match &self.detail {
            Some(Value::String(detail)) => Some(detail.clone()),
            // FastAPI validation errors: [{"loc": [...], "msg": "...", ...}]
            Some(Value::Array(items)) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    }
}

/// One part of a buffered multipart upload.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    /// Plain text fields carry neither a file name nor a content type.
    pub fn is_text(&self) -> bool {
        self.file_name.is_none() && self.content_type.is_none()
    }
}

/// Request body kept in a replayable form so a refreshed retry resends it unchanged.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A call to the backend, described independently of any particular attempt.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// Path relative to the backend base URL, or an absolute URL.
    pub path: String,
    pub query: Option<String>,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
    /// Send without credentials and never attempt a refresh.
    pub skip_auth: bool,
}

impl BackendRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: RequestBody::Empty,
            headers: Vec::new(),
            skip_auth: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Empty query strings are dropped.
    pub fn query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}
