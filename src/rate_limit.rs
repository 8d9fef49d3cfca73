//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down credential stuffing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::auth::extract_client_ip;
use crate::cli::ClientIpHeader;

/// Default login/register attempts per client IP per minute.
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;

/// Key used when the client IP cannot be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter shared by login and registration
    pub login: Arc<IpLimiter>,
    /// Where the client IP is read from
    pub client_ip_header: Option<ClientIpHeader>,
}

impl RateLimitConfig {
    /// A zero rate is treated as one attempt per minute.
    pub fn new(attempts_per_minute: u32, client_ip_header: Option<ClientIpHeader>) -> Self {
        let per_minute = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            client_ip_header,
        }
    }
}

/// Middleware for rate limiting login and registration.
pub async fn rate_limit_login(
    State(config): State<RateLimitConfig>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request, config.client_ip_header).unwrap_or_else(|e| {
        debug!(reason = e, "Client IP unavailable, using shared bucket");
        UNKNOWN_CLIENT.to_string()
    });

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, path = %request.uri().path(), "Login rate limit exceeded");
            ApiError::RateLimited.into_response()
        }
    }
}
