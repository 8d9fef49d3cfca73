//! HTTP client for the external backend with bearer attachment and refresh-on-401.

use std::sync::Arc;

use futures::FutureExt;
use reqwest::{StatusCode, multipart};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::error::BackendError;
use super::refresh::RefreshCoordinator;
use super::types::{
    BackendRequest, ErrorEnvelope, FormPart, REFRESH_PATH, RefreshRequest, RequestBody,
    TokenPair,
};
use crate::auth::{SessionTokens, SessionUpdate, record_session_update};

const USER_AGENT: &str = concat!("monolith-gateway/", env!("CARGO_PKG_VERSION"));

/// Header carrying the per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Final response of a backend call, after any refresh and retry.
pub struct BackendResponse {
    pub response: reqwest::Response,
}

impl BackendResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: Option<Url>,
    refresh: RefreshCoordinator,
}

/// Cheaply cloneable handle to the backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<Inner>,
}

impl BackendClient {
    /// Create a client. A missing base URL is not an error here; every call that
    /// needs it fails with [`BackendError::NotConfigured`] instead.
    pub fn new(base_url: Option<Url>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                refresh: RefreshCoordinator::default(),
            }),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.inner.base_url.is_some()
    }

    /// Turn a backend path into a URL. Absolute `http(s)` URLs pass through unchanged;
    /// anything else is appended to the base URL verbatim.
    pub fn resolve(&self, path: &str) -> Result<Url, BackendError> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }

        let base = self
            .inner
            .base_url
            .as_ref()
            .ok_or(BackendError::NotConfigured)?;
        let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| BackendError::InvalidUrl(e.to_string()))
    }

    /// Perform one backend call on behalf of `session`.
    ///
    /// Unless `skip_auth` is set, the access token is attached as a bearer credential. A
    /// 401 with a refresh token available triggers exactly one refresh and one retry;
    /// the retried response is returned whatever its status. Rotated tokens and cleared
    /// sessions are recorded for the response cookies.
    pub async fn send(
        &self,
        session: &SessionTokens,
        request: BackendRequest,
    ) -> Result<BackendResponse, BackendError> {
        let request_id = Uuid::new_v4().to_string();
        let mut url = self.resolve(&request.path)?;
        if request.query.is_some() {
            url.set_query(request.query.as_deref());
        }

        let bearer = if request.skip_auth {
            None
        } else {
            session.access()
        };

        let response = self.execute(&request, &url, bearer, &request_id).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.skip_auth {
            return Ok(BackendResponse { response });
        }

        let Some(refresh_token) = session.refresh() else {
            debug!(request_id = %request_id, "Backend returned 401 and no refresh token is available");
            return Ok(BackendResponse { response });
        };
        drop(response);

        info!(request_id = %request_id, path = %request.path, "Access token rejected, refreshing");

        let pair = match self.refresh_tokens(refresh_token).await {
            Ok(pair) => pair,
            Err(BackendError::SessionExpired) => {
                record_session_update(SessionUpdate::Clear);
                return Err(BackendError::SessionExpired);
            }
            Err(e) => return Err(e),
        };
        record_session_update(SessionUpdate::Rotate(pair.clone()));

        let response = self
            .execute(&request, &url, Some(&pair.access_token), &request_id)
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(request_id = %request_id, "Backend rejected the refreshed access token");
        }

        Ok(BackendResponse { response })
    }

    /// Exchange a refresh token for a new pair, sharing the exchange with concurrent callers.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, BackendError> {
        let url = self.resolve(REFRESH_PATH)?;
        let http = self.inner.http.clone();
        let token = refresh_token.to_string();

        self.inner
            .refresh
            .run(refresh_token, move || {
                exchange_refresh_token(http, url, token).boxed()
            })
            .await
    }

    async fn execute(
        &self,
        request: &BackendRequest,
        url: &Url,
        bearer: Option<&str>,
        request_id: &str,
    ) -> Result<reqwest::Response, BackendError> {
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, request_id);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        debug!(
            request_id = %request_id,
            method = %request.method,
            url = %url,
            authenticated = bearer.is_some(),
            "Forwarding request to backend"
        );

        builder.send().await.map_err(|e| {
            warn!(request_id = %request_id, error = %e, "Backend request failed");
            BackendError::from_reqwest(&e)
        })
    }
}

fn build_form(parts: &[FormPart]) -> Result<multipart::Form, BackendError> {
    let mut form = multipart::Form::new();
    for part in parts {
        if part.is_text() {
            let text = String::from_utf8_lossy(&part.data).into_owned();
            form = form.text(part.name.clone(), text);
            continue;
        }

        let mut file = multipart::Part::bytes(part.data.to_vec());
        if let Some(file_name) = &part.file_name {
            file = file.file_name(file_name.clone());
        }
        if let Some(content_type) = &part.content_type {
            file = file
                .mime_str(content_type)
                .map_err(|e| BackendError::Transport(e.to_string()))?;
        }
        form = form.part(part.name.clone(), file);
    }
    Ok(form)
}

async fn exchange_refresh_token(
    http: reqwest::Client,
    url: Url,
    refresh_token: String,
) -> Result<TokenPair, BackendError> {
    let response = http
        .post(url)
        .json(&RefreshRequest {
            refresh_token: &refresh_token,
        })
        .send()
        .await
        .map_err(|e| {
            warn!(error = %e, "Token refresh request failed");
            BackendError::from_reqwest(&e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let code = ErrorEnvelope::parse(&body).code();
        warn!(
            status = status.as_u16(),
            code = code.as_deref().unwrap_or("unknown"),
            "Backend rejected refresh token"
        );
        return Err(BackendError::SessionExpired);
    }

    let pair: TokenPair = response.json().await.map_err(|e| {
        warn!(error = %e, "Refresh response was not a token pair");
        BackendError::SessionExpired
    })?;

    if pair.access_token.is_empty() || pair.refresh_token.is_empty() {
        warn!("Refresh response contained an empty token");
        return Err(BackendError::SessionExpired);
    }

    info!("Access token refreshed");
    Ok(pair)
}
