//! Chat endpoints, including the streamed variant.

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiState;
use super::error::{ApiError, ResultExt, validate_id};
use super::proxy::{JsonBody, ensure_success, relay_json};
use super::stream::relay_event_stream;
use crate::auth::SessionTokens;
use crate::backend::BackendRequest;

const MAX_MESSAGE_LENGTH: usize = 10_000;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(chat))
        .route("/stream", post(chat_stream))
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .with_state(state)
}

#[derive(Deserialize, Serialize)]
struct ChatRequest {
    message: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ChatRequest {
    fn into_body(self) -> Result<Value, ApiError> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(ApiError::bad_request("Message cannot be empty"));
        }
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Message cannot be longer than {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        serde_json::to_value(&self).internal_err("Failed to encode chat request")
    }
}

async fn chat(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::post("/api/v1/chat").json(payload.into_body()?);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn chat_stream(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::post("/api/v1/chat/stream")
        .json(payload.into_body()?)
        .header("accept", "text/event-stream");
    let upstream = ensure_success(state.backend.send(&session, request).await?).await?;
    Ok(relay_event_stream(upstream))
}

async fn list_conversations(
    State(state): State<ApiState>,
    session: SessionTokens,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::get("/api/v1/chat/conversations").query(query);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn get_conversation(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Conversation ID")?;
    let request = BackendRequest::get(format!("/api/v1/chat/conversations/{}", id));
    relay_json(state.backend.send(&session, request).await?).await
}

async fn delete_conversation(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Conversation ID")?;
    let request = BackendRequest::delete(format!("/api/v1/chat/conversations/{}", id));
    relay_json(state.backend.send(&session, request).await?).await
}
