//! Document listing, upload, download, and deletion.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, RawQuery, State, multipart::MultipartRejection},
    response::IntoResponse,
    routing::{get, post},
};
use tracing::debug;

use super::ApiState;
use super::error::{ApiError, validate_id};
use super::proxy::{relay_binary, relay_json};
use crate::auth::SessionTokens;
use crate::backend::{BackendRequest, FormPart};

/// Maximum accepted upload size (all parts combined)
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(list_documents))
        .route(
            "/upload",
            post(upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/{id}", get(get_document).delete(delete_document))
        .route("/{id}/download", get(download_document))
        .with_state(state)
}

/// Buffer every field so the upload can be replayed after a token refresh.
async fn read_parts(mut multipart: Multipart) -> Result<Vec<FormPart>, ApiError> {
    let mut parts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e.body_text())))?;

        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    Ok(parts)
}

async fn upload_document(
    State(state): State<ApiState>,
    session: SessionTokens,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let multipart =
        multipart.map_err(|_| ApiError::bad_request("Expected a multipart/form-data body"))?;
    let parts = read_parts(multipart).await?;

    let files = parts.iter().filter(|part| part.file_name.is_some()).count();
    if files == 0 {
        return Err(ApiError::bad_request("No file provided"));
    }
    debug!(files, parts = parts.len(), "Forwarding document upload");

    let request = BackendRequest::post("/api/v1/documents/upload").multipart(parts);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn list_documents(
    State(state): State<ApiState>,
    session: SessionTokens,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let request = BackendRequest::get("/api/v1/documents").query(query);
    relay_json(state.backend.send(&session, request).await?).await
}

async fn get_document(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Document ID")?;
    let request = BackendRequest::get(format!("/api/v1/documents/{}", id));
    relay_json(state.backend.send(&session, request).await?).await
}

async fn delete_document(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Document ID")?;
    let request = BackendRequest::delete(format!("/api/v1/documents/{}", id));
    relay_json(state.backend.send(&session, request).await?).await
}

async fn download_document(
    State(state): State<ApiState>,
    session: SessionTokens,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&id, "Document ID")?;
    let request = BackendRequest::get(format!("/api/v1/documents/{}/download", id));
    relay_binary(state.backend.send(&session, request).await?).await
}
