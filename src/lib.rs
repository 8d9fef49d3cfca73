pub mod api;
pub mod auth;
pub mod backend;
pub mod cli;
pub mod gate;
pub mod jwt;
pub mod pages;
pub mod rate_limit;

use api::create_api_router;
use auth::{CookiePolicy, apply_session_cookies};
use axum::{Router, middleware};
use backend::BackendClient;
use cli::{ClientIpHeader, Environment};
use gate::{Gate, RouteTable, request_gate};
use rate_limit::RateLimitConfig;
use std::sync::Arc;
use url::Url;

pub struct ServerConfig {
    /// Base URL of the backend service; `None` makes backend routes answer `CONFIGURATION_ERROR`
    pub backend_url: Option<Url>,
    /// Deployment environment (cookie flags and lifetimes)
    pub environment: Environment,
    /// Route classification used by the gate
    pub routes: RouteTable,
    /// IP extraction strategy for rate limiting (requires running behind a proxy)
    pub client_ip_header: Option<ClientIpHeader>,
    /// Login and registration attempts per client IP per minute
    pub login_rate_per_minute: u32,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Result<Router, reqwest::Error> {
    let backend = BackendClient::new(config.backend_url.clone())?;
    let rate_limit = RateLimitConfig::new(config.login_rate_per_minute, config.client_ip_header);
    let gate = Arc::new(Gate::new(config.routes.clone()));
    let routes = Arc::new(config.routes.clone());
    let cookie_policy = CookiePolicy::for_environment(config.environment);

    // Gate runs inside the cookie layer so session updates from every response are applied
    Ok(Router::new()
        .fallback(pages::page_shell)
        .with_state(routes)
        .nest("/api", create_api_router(backend, rate_limit))
        .layer(middleware::from_fn_with_state(gate, request_gate))
        .layer(middleware::from_fn_with_state(
            cookie_policy,
            apply_session_cookies,
        )))
}
