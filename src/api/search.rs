use axum::{Router, extract::State, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiState;
use super::error::{ApiError, ResultExt};
use super::proxy::{JsonBody, relay_json};
use crate::auth::SessionTokens;
use crate::backend::BackendRequest;

const MAX_QUERY_LENGTH: usize = 1000;
const MAX_LIMIT: u32 = 100;

pub fn router(state: ApiState) -> Router {
    Router::new().route("/", post(search)).with_state(state)
}

/// Search request. Fields the gateway does not inspect (filters, team scope) are
/// forwarded unchanged.
#[derive(Deserialize, Serialize)]
struct SearchRequest {
    query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SearchRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(ApiError::bad_request("Search query cannot be empty"));
        }
        if query.len() > MAX_QUERY_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Search query cannot be longer than {} characters",
                MAX_QUERY_LENGTH
            )));
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(ApiError::bad_request(format!(
                    "Limit must be between 1 and {}",
                    MAX_LIMIT
                )));
            }
        }
        Ok(())
    }
}

async fn search(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(payload): JsonBody<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let body = serde_json::to_value(&payload).internal_err("Failed to encode search request")?;
    let request = BackendRequest::post("/api/v1/search").json(body);
    relay_json(state.backend.send(&session, request).await?).await
}
