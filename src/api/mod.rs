mod auth;
mod chat;
mod documents;
mod error;
mod health;
mod proxy;
mod search;
mod stream;
mod teams;

use axum::{Router, http::Uri};

use crate::backend::BackendClient;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt, validate_id};
pub use stream::{STREAM_INTERRUPTED_EVENT, relay_event_stream};

/// State shared by every API handler.
#[derive(Clone)]
pub struct ApiState {
    pub backend: BackendClient,
    pub rate_limit: RateLimitConfig,
}

/// Create the API router.
pub fn create_api_router(backend: BackendClient, rate_limit: RateLimitConfig) -> Router {
    let state = ApiState {
        backend,
        rate_limit,
    };

    Router::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/search", search::router(state.clone()))
        .nest("/chat", chat::router(state.clone()))
        .nest("/documents", documents::router(state.clone()))
        .nest("/teams", teams::router(state.clone()))
        .nest("/health", health::router(state))
        .fallback(api_not_found)
}

async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No API route for {}", uri.path()))
}
