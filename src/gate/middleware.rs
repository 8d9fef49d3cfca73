//! Axum middleware wrapping [`Gate::decide`].

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{Gate, GateDecision};
use crate::auth::SessionTokens;
use crate::jwt::now_secs;

/// Gate every request before routing.
pub async fn request_gate(State(gate): State<Arc<Gate>>, request: Request, next: Next) -> Response {
    let tokens = SessionTokens::from_headers(request.headers());
    let path = request.uri().path();

    match gate.decide(path, &tokens, now_secs()) {
        GateDecision::Allow => next.run(request).await,
        decision => {
            debug!(path = %path, decision = ?decision, "Request stopped at gate");
            decision.into_response()
        }
    }
}
