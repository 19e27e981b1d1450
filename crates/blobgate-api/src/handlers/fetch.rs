use crate::constants::DEFAULT_CONTENT_TYPE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use blobgate_core::AppError;
use blobgate_storage::keys::normalize_path;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct FetchRequest {
    /// Object key; leading slashes are ignored
    pub pathname: Option<String>,
}

/// Download an object by query string
#[utoipa::path(
    get,
    path = "/api/blob/fetch",
    tag = "blob",
    params(FetchRequest),
    responses(
        (status = 200, description = "Object bytes, served with the stored content type", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Missing pathname", body = ErrorResponse),
        (status = 404, description = "Object does not exist", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "fetch"))]
pub async fn fetch_by_query(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FetchRequest>, QueryRejection>,
) -> Result<Response, HttpAppError> {
    let Query(request) = query?;
    fetch_object(&state, request.pathname).await
}

/// Download an object named in a JSON body
#[utoipa::path(
    post,
    path = "/api/blob/fetch",
    tag = "blob",
    request_body = FetchRequest,
    responses(
        (status = 200, description = "Object bytes, served with the stored content type", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Missing pathname", body = ErrorResponse),
        (status = 404, description = "Object does not exist", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "fetch"))]
pub async fn fetch_by_body(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<FetchRequest>,
) -> Result<Response, HttpAppError> {
    fetch_object(&state, request.pathname).await
}

async fn fetch_object(state: &AppState, pathname: Option<String>) -> Result<Response, HttpAppError> {
    let pathname = pathname
        .map(|p| normalize_path(&p))
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing pathname".to_string()))?;

    let storage = state.storage.get_client().await?;

    if !storage.exists(&pathname).await? {
        return Err(AppError::NotFound("not found".to_string()).into());
    }

    let content_type = match storage.content_type(&pathname).await {
        Ok(Some(content_type)) => content_type,
        Ok(None) => DEFAULT_CONTENT_TYPE.to_string(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                pathname = %pathname,
                "Metadata lookup failed, serving as octet-stream"
            );
            DEFAULT_CONTENT_TYPE.to_string()
        }
    };

    let bytes = storage.download(&pathname).await?;

    tracing::debug!(
        pathname = %pathname,
        content_type = %content_type,
        size_bytes = bytes.len(),
        "Serving object"
    );

    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
