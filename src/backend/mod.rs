//! Client for the external backend service.
//!
//! Every data operation is delegated to the backend. Calls carry the caller's access
//! token, and a rejected token is refreshed and the call retried once.

mod client;
mod error;
mod refresh;
mod types;

pub use client::{BackendClient, BackendResponse, REQUEST_ID_HEADER};
pub use error::BackendError;
pub use refresh::{REFRESH_REUSE_WINDOW, RefreshCoordinator};
pub use types::{BackendRequest, FormPart, REFRESH_PATH, RequestBody, TokenPair};
pub(crate) use types::ErrorEnvelope;
