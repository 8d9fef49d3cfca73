//! Cookie parsing and `Set-Cookie` rendering for the session tokens.

use axum::http::header;

use crate::backend::TokenPair;
use crate::cli::Environment;
use crate::jwt::{
    ACCESS_TOKEN_DURATION_SECS, DEV_ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS,
};

/// Cookie name for the access token (1 hour in production).
pub const ACCESS_COOKIE_NAME: &str = "auth_token";

/// Cookie name for the refresh token (30 days).
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Flags and lifetimes applied to every session cookie the gateway writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub access_max_age: u64,
    pub refresh_max_age: u64,
}

impl CookiePolicy {
    /// Production gets `Secure` cookies and the full access token lifetime.
    pub fn for_environment(environment: Environment) -> Self {
        let production = environment.is_production();
        Self {
            secure: production,
            access_max_age: if production {
                ACCESS_TOKEN_DURATION_SECS
            } else {
                DEV_ACCESS_TOKEN_DURATION_SECS
            },
            refresh_max_age: REFRESH_TOKEN_DURATION_SECS,
        }
    }

    fn render(&self, name: &str, value: &str, max_age: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            name, value, max_age, secure
        )
    }

    pub fn access_cookie(&self, token: &str) -> String {
        self.render(ACCESS_COOKIE_NAME, token, self.access_max_age)
    }

    pub fn refresh_cookie(&self, token: &str) -> String {
        self.render(REFRESH_COOKIE_NAME, token, self.refresh_max_age)
    }

    /// Both cookies for a freshly issued token pair.
    pub fn rotation_cookies(&self, pair: &TokenPair) -> [String; 2] {
        [
            self.access_cookie(&pair.access_token),
            self.refresh_cookie(&pair.refresh_token),
        ]
    }

    /// Expire both cookies immediately.
    pub fn clear_cookies(&self) -> [String; 2] {
        [
            self.render(ACCESS_COOKIE_NAME, "", 0),
            self.render(REFRESH_COOKIE_NAME, "", 0),
        ]
    }
}
