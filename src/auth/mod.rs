//! Cookie-held session credentials.
//!
//! Two tokens live in HTTP-only cookies: a short-lived access token attached as a
//! bearer credential on backend calls, and a long-lived refresh token exchanged for a
//! new pair when the backend rejects the access token. This module reads them, renders
//! the cookies, and applies rotations to outgoing responses.

mod cookie;
mod errors;
mod ip;
mod session;

pub use cookie::{ACCESS_COOKIE_NAME, CookiePolicy, REFRESH_COOKIE_NAME, get_cookie};
pub use errors::AuthError;
pub use ip::extract_client_ip;
pub use session::{SessionTokens, SessionUpdate, apply_session_cookies, record_session_update};
