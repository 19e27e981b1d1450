use crate::constants::{DEFAULT_CONTENT_TYPE, DEFAULT_UPLOAD_NAME};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::IntoResponse,
    Json,
};
use blobgate_core::AppError;
use blobgate_storage::keys::direct_upload_key;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Original file name; `Lease.pdf` when omitted
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Key the object was stored under
    pub pathname: String,
    pub size: usize,
}

/// Store the raw request body in the bucket
#[utoipa::path(
    post,
    path = "/api/blob/upload",
    tag = "blob",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Object stored", body = UploadResponse),
        (status = 400, description = "Empty body or blank name", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, query, headers, body),
    fields(operation = "upload", size_bytes = body.len())
)]
pub async fn upload_blob(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(query) = query?;

    if body.is_empty() {
        tracing::warn!("Rejected upload with empty body");
        return Err(AppError::InvalidInput("empty body".to_string()).into());
    }

    let name = query.name.as_deref().unwrap_or(DEFAULT_UPLOAD_NAME);
    let pathname = direct_upload_key(&state.config.upload_folder, name, Utc::now())?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let size = body.len();
    let storage = state.storage.get_client().await?;
    storage.put_object(&pathname, body, &content_type).await?;

    tracing::info!(
        bucket = %storage.bucket(),
        pathname = %pathname,
        content_type = %content_type,
        size_bytes = size,
        "Upload stored"
    );

    Ok(Json(UploadResponse { pathname, size }))
}
