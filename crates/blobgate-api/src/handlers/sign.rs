use crate::constants::{MAX_SIGNED_UPLOAD_BYTES, SIGNED_UPLOAD_CONTENT_TYPE};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use blobgate_core::AppError;
use blobgate_storage::keys::signed_upload_key;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SignRequest {
    pub name: Option<String>,
    /// File size in bytes; must be a JSON number
    #[schema(value_type = Option<u64>)]
    pub size: Option<Value>,
    /// MIME type the client will upload with
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadHeaders {
    #[serde(rename = "Content-Type")]
    pub content_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// Pre-authorized `PUT` URL
    pub upload_url: String,
    pub key: String,
    /// Expiry, in milliseconds since the Unix epoch
    pub expire_at: i64,
    /// Headers the upload request must carry
    pub headers: UploadHeaders,
}

/// A validated sign request.
struct SignTarget<'a> {
    name: &'a str,
    content_type: &'a str,
}

fn validate(request: &SignRequest) -> Result<SignTarget<'_>, AppError> {
    let required = || AppError::InvalidInput("name/size/type required".to_string());

    let name = request
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(required)?;
    let size = request
        .size
        .as_ref()
        .and_then(Value::as_f64)
        .ok_or_else(required)?;
    let content_type = request
        .content_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(required)?;

    if size > MAX_SIGNED_UPLOAD_BYTES as f64 {
        return Err(AppError::PayloadTooLarge("file too large".to_string()));
    }
    if !content_type.eq_ignore_ascii_case(SIGNED_UPLOAD_CONTENT_TYPE) {
        return Err(AppError::UnsupportedMediaType(
            "only pdf allowed".to_string(),
        ));
    }

    Ok(SignTarget { name, content_type })
}

/// Issue a signed URL for uploading one PDF straight to the bucket
#[utoipa::path(
    post,
    path = "/api/blob/sign",
    tag = "blob",
    request_body = SignRequest,
    responses(
        (status = 200, description = "Signed upload URL issued", body = SignResponse),
        (status = 400, description = "Missing name, size or type", body = ErrorResponse),
        (status = 413, description = "File larger than 25 MiB", body = ErrorResponse),
        (status = 415, description = "Type is not application/pdf", body = ErrorResponse),
        (status = 500, description = "Signing failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "sign"))]
pub async fn sign_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let target = validate(&request)?;

    let key = signed_upload_key(state.config.path_prefix.as_deref(), target.name, Utc::now())?;
    let ttl = Duration::from_secs(state.config.sign_ttl_secs);

    let storage = state.storage.get_client().await?;
    let upload_url = storage
        .signed_upload_url(&key, target.content_type, ttl)
        .await?;

    let expire_at = Utc::now().timestamp_millis() + (state.config.sign_ttl_secs * 1000) as i64;

    tracing::info!(
        bucket = %storage.bucket(),
        key = %key,
        ttl_secs = state.config.sign_ttl_secs,
        "Issued signed upload URL"
    );

    Ok(Json(SignResponse {
        upload_url,
        key,
        expire_at,
        headers: UploadHeaders {
            content_type: target.content_type.to_string(),
        },
    }))
}

/// CORS preflight for the sign route
#[utoipa::path(
    options,
    path = "/api/blob/sign",
    tag = "blob",
    responses(
        (status = 204, description = "Preflight accepted")
    )
)]
pub async fn sign_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
