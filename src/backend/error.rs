//! Backend client errors.

/// Errors raised while talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// `FASTAPI_BASE_URL` was not provided
    NotConfigured,
    /// The request path could not be turned into a URL
    InvalidUrl(String),
    /// Connection to the backend could not be established
    Unreachable(String),
    /// Any other transport failure (reset, timeout, malformed response)
    Transport(String),
    /// The refresh token was rejected; the session is over
    SessionExpired,
}

impl BackendError {
    pub(crate) fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Unreachable(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotConfigured => write!(f, "Backend base URL is not configured"),
            BackendError::InvalidUrl(e) => write!(f, "Invalid backend URL: {}", e),
            BackendError::Unreachable(e) => write!(f, "Backend unreachable: {}", e),
            BackendError::Transport(e) => write!(f, "Backend request failed: {}", e),
            BackendError::SessionExpired => write!(f, "Refresh token rejected"),
        }
    }
}

impl std::error::Error for BackendError {}
