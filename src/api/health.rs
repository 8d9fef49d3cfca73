//! Liveness endpoint. Answered locally, never forwarded.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Version embedded at compile time from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend_configured: bool,
}

pub fn router(state: ApiState) -> Router {
    Router::new().route("/", get(health)).with_state(state)
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        backend_configured: state.backend.is_configured(),
    })
}
