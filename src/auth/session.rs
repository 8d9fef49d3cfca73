//! Session tokens read from request cookies, and request-scoped cookie updates.
//!
//! Handlers and the backend client never touch `Set-Cookie` directly. They record a
//! [`SessionUpdate`] in task-local storage and [`apply_session_cookies`] turns it into
//! response headers once the handler has finished.

use std::cell::RefCell;
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::cookie::{ACCESS_COOKIE_NAME, CookiePolicy, REFRESH_COOKIE_NAME, get_cookie};
use crate::backend::TokenPair;

tokio::task_local! {
    /// Pending cookie mutation for the current request.
    static SESSION_UPDATE: RefCell<Option<SessionUpdate>>;
}

/// Access and refresh tokens carried by the incoming request. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl SessionTokens {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name| {
            get_cookie(headers, name)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            access: read(ACCESS_COOKIE_NAME),
            refresh: read(REFRESH_COOKIE_NAME),
        }
    }

    pub fn access(&self) -> Option<&str> {
        self.access.as_deref()
    }

    pub fn refresh(&self) -> Option<&str> {
        self.refresh.as_deref()
    }
}

impl<S> FromRequestParts<S> for SessionTokens
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Cookie mutation produced while handling a request.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Overwrite both cookies with a new pair.
    Rotate(TokenPair),
    /// Expire both cookies.
    Clear,
}

/// Record a cookie mutation for the current request. The last update wins.
pub fn record_session_update(update: SessionUpdate) {
    let recorded = SESSION_UPDATE.try_with(|cell| {
        cell.borrow_mut().replace(update);
    });
    if recorded.is_err() {
        tracing::debug!("Session update recorded outside of a cookie scope, ignoring");
    }
}

/// Middleware that applies the recorded [`SessionUpdate`] as `Set-Cookie` headers.
pub async fn apply_session_cookies(
    State(policy): State<CookiePolicy>,
    request: Request,
    next: Next,
) -> Response {
    let (mut response, update) = SESSION_UPDATE
        .scope(RefCell::new(None), async move {
            let response = next.run(request).await;
            let update = SESSION_UPDATE.with(|cell| cell.borrow_mut().take());
            (response, update)
        })
        .await;

    let Some(update) = update else {
        return response;
    };

    let cookies = match &update {
        SessionUpdate::Rotate(pair) => policy.rotation_cookies(pair),
        SessionUpdate::Clear => policy.clear_cookies(),
    };

    let headers = response.headers_mut();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!("Refusing to write session cookie with invalid characters"),
        }
    }

    response
}
