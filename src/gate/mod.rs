//! Request gate: decides whether a request may reach its handler.
//!
//! Runs in front of every route. Static assets pass untouched; other paths are
//! classified through a [`RouteTable`] and combined with the optimistic token check
//! to allow, redirect, or reject the request.

mod middleware;
mod routes;
mod validity;

use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::{AuthError, SessionTokens};

pub use middleware::request_gate;
pub use routes::{RouteClass, RouteTable, is_api_path};
pub use validity::{TokenStatus, has_valid_tokens, token_status};

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Signed-in visitor on an auth page
    RedirectHome(String),
    /// Unauthenticated page request; carries the full login location
    RedirectToLogin(String),
    /// Unauthenticated API request
    Reject(AuthError),
}

impl IntoResponse for GateDecision {
    /// `Allow` has no response of its own; the middleware never converts it.
    fn into_response(self) -> Response {
        match self {
            GateDecision::Allow => axum::http::StatusCode::NO_CONTENT.into_response(),
            GateDecision::RedirectHome(location) | GateDecision::RedirectToLogin(location) => {
                Redirect::temporary(&location).into_response()
            }
            GateDecision::Reject(error) => error.into_response(),
        }
    }
}

/// The gate with its route table.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    routes: RouteTable,
}

impl Gate {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn decide(&self, path: &str, tokens: &SessionTokens, now: u64) -> GateDecision {
        if self.routes.is_static_asset(path) {
            return GateDecision::Allow;
        }

        let class = self.routes.classify(path);
        let status = token_status(tokens.access(), tokens.refresh(), now);

        if status.is_valid() {
            return match class {
                RouteClass::AuthPage => GateDecision::RedirectHome(self.routes.home_path.clone()),
                _ => GateDecision::Allow,
            };
        }

        if class != RouteClass::Protected {
            return GateDecision::Allow;
        }

        if is_api_path(path) {
            GateDecision::Reject(status.auth_error().unwrap_or(AuthError::NoAuthToken))
        } else {
            GateDecision::RedirectToLogin(self.login_location(path))
        }
    }

    /// Login URL preserving the requested path, except for the root.
    fn login_location(&self, path: &str) -> String {
        if path == "/" {
            return self.routes.login_path.clone();
        }
        let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
        format!("{}?redirect={}", self.routes.login_path, encoded)
    }
}
