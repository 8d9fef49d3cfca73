//! Team management endpoints.

use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiState;
use super::auth::validate_email;
use super::error::{ApiError, ResultExt, validate_id};
use super::proxy::{JsonBody, relay_json};
use crate::auth::SessionTokens;
use crate::backend::BackendRequest;

const MAX_TEAM_NAME_LENGTH: usize = 100;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/{id}/members", get(list_members))
        .route("/{id}/invite", post(invite_member))
        .route("/{id}/members/{user_id}", delete(remove_member))
        .with_state(state)
}

#[derive(Deserialize, Serialize)]
struct CreateTeamRequest {
    name: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize)]
struct InviteRequest {
    email: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

async fn list_teams(
    State(state): State<ApiState>,
    session: SessionTokens,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::get("/api/v1/teams");
    relay_json(state.backend.send(&session, request).await?).await
}

async fn create_team(
    State(state): State<ApiState>,
    session: SessionTokens,
    JsonBody(mut payload): JsonBody<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Team name cannot be empty"));
    }
    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Team name cannot be longer than {} characters",
            MAX_TEAM_NAME_LENGTH
        )));
    }
    payload.name = name.to_string();

    let body = serde_json::to_value(&payload).internal_err("Failed to encode team request")?;
    let request = BackendRequest::post("/api/v1/teams").json(body);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn list_members(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Team ID")?;
    let request = BackendRequest::get(format!("/api/v1/teams/{}/members", id));
    relay_json(state.backend.send(&session, request).await?).await
}

async fn invite_member(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<InviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Team ID")?;
    validate_email(&payload.email)?;

    let body = serde_json::to_value(&payload).internal_err("Failed to encode invite request")?;
    let request = BackendRequest::post(format!("/api/v1/teams/{}/invite", id)).json(body);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn remove_member(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Team ID")?;
    validate_id(&user_id, "User ID")?;
    let request = BackendRequest::delete(format!("/api/v1/teams/{}/members/{}", id, user_id));
    relay_json(state.backend.send(&session, request).await?).await
}
