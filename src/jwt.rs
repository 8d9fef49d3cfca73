//! Unverified JWT claim inspection.
//!
//! The gateway never holds the signing key; the backend is the only party that
//! verifies tokens. These helpers read the `exp`/`iat` claims out of the payload
//! segment so the gate can make a cheap, optimistic expiry decision.

use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Access token cookie lifetime in production: 1 hour
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// Access token cookie lifetime outside production, short so refresh is exercised.
pub const DEV_ACCESS_TOKEN_DURATION_SECS: u64 = 30;

/// Refresh token cookie lifetime: 30 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Tokens expiring within this window are considered due for refresh.
pub const EXPIRY_SKEW_SECS: u64 = 60;

/// Time-related claims of an access token. Everything else in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: Option<u64>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<u64>,
}

impl TokenClaims {
    /// Whether the token expires before `now + EXPIRY_SKEW_SECS`.
    /// Returns `None` when the token carries no `exp` claim.
    pub fn expires_soon(&self, now: u64) -> Option<bool> {
        self.exp.map(|exp| exp < now.saturating_add(EXPIRY_SKEW_SECS))
    }
}

/// Decode the claims of a JWT without verifying its signature.
///
/// The header and payload segments must both decode; the signature is never checked.
pub fn peek_claims(token: &str) -> Result<TokenClaims, JwtError> {
    jsonwebtoken::dangerous::insecure_decode::<TokenClaims>(token)
        .map(|data| data.claims)
        .map_err(JwtError::Decoding)
}

/// Current Unix time in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Errors that can occur while inspecting a token.
#[derive(Debug)]
pub enum JwtError {
    /// Token is not a well-formed JWT
    Decoding(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
        }
    }
}

impl std::error::Error for JwtError {}
