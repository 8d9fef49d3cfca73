//! Optimistic token validity check.
//!
//! Nothing here verifies a signature. An access token that cannot be decoded, or that
//! is about to expire, still counts as valid while a refresh token is present: the
//! backend call that follows will either accept it or trigger a refresh.

use crate::auth::{AuthError, SessionTokens};
use crate::jwt::peek_claims;

/// What the gate can tell about a request's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    MissingAccess,
    MissingRefresh,
    /// `exp` is more than the skew window away
    Fresh,
    /// `exp` is within the skew window or already past
    ExpiringSoon,
    /// No readable `exp` claim
    Undecodable,
}

impl TokenStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Fresh | Self::ExpiringSoon | Self::Undecodable)
    }

    /// The 401 reported to API clients for an invalid status.
    pub fn auth_error(self) -> Option<AuthError> {
        match self {
            Self::MissingAccess => Some(AuthError::NoAuthToken),
            Self::MissingRefresh => Some(AuthError::NoRefreshToken),
            _ => None,
        }
    }
}

pub fn token_status(access: Option<&str>, refresh: Option<&str>, now: u64) -> TokenStatus {
    let Some(access) = access else {
        return TokenStatus::MissingAccess;
    };
    if refresh.is_none() {
        return TokenStatus::MissingRefresh;
    }

    match peek_claims(access).ok().and_then(|c| c.expires_soon(now)) {
        Some(true) => TokenStatus::ExpiringSoon,
        Some(false) => TokenStatus::Fresh,
        None => TokenStatus::Undecodable,
    }
}

pub fn has_valid_tokens(tokens: &SessionTokens, now: u64) -> bool {
    token_status(tokens.access(), tokens.refresh(), now).is_valid()
}
