use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blobgate_core::AppError;
use blobgate_storage::keys::{denied_paths, normalize_path, object_path};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const DELETE_DISABLED_MESSAGE: &str = "delete is disabled by GCS_DELETE_ENABLED=false";

/// Delete one object (`{ pathname }`) or several (`{ paths }`).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DeleteRequest {
    Batch(BatchDelete),
    Single(SingleDelete),
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BatchDelete {
    pub paths: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SingleDelete {
    pub pathname: String,
}

impl DeleteRequest {
    /// Normalized targets, with paths that normalize to nothing dropped.
    fn into_targets(self) -> Vec<String> {
        let raw = match self {
            DeleteRequest::Batch(batch) => batch.paths,
            DeleteRequest::Single(single) => vec![single.pathname],
        };
        raw.iter()
            .map(|p| normalize_path(p))
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Returned with 202 when deletion is switched off.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteSkippedResponse {
    pub ok: bool,
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteOutcome {
    pub path: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// True when every target was deleted (or was already absent)
    pub ok: bool,
    pub deleted: Vec<String>,
    pub failed: Vec<DeleteOutcome>,
}

/// Delete objects from the bucket
#[utoipa::path(
    post,
    path = "/api/blob/delete",
    tag = "blob",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Deletion attempted for every target", body = DeleteResponse),
        (status = 202, description = "Deletion disabled, nothing was touched", body = DeleteSkippedResponse),
        (status = 400, description = "No targets, malformed body or path, or paths outside GCS_DOC_PREFIX", body = ErrorResponse),
        (status = 500, description = "Storage unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(operation = "delete", targets = tracing::field::Empty)
)]
pub async fn delete_blobs(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteRequest>,
) -> Result<Response, HttpAppError> {
    let targets = request.into_targets();
    tracing::Span::current().record("targets", targets.len());

    if targets.is_empty() {
        return Err(AppError::InvalidInput("missing pathname or paths".to_string()).into());
    }

    for path in &targets {
        object_path(path)?;
    }

    if let Some(prefix) = state.config.path_prefix.as_deref() {
        let denied = denied_paths(&targets, Some(prefix));
        if !denied.is_empty() {
            return Err(AppError::PolicyDenied {
                prefix: prefix.to_string(),
                denied,
            }
            .into());
        }
    }

    if !state.config.delete_enabled {
        tracing::warn!(
            count = targets.len(),
            example = %targets[0],
            "Delete disabled, skipping"
        );
        let body = DeleteSkippedResponse {
            ok: false,
            deleted: Vec::new(),
            skipped: targets,
            message: DELETE_DISABLED_MESSAGE.to_string(),
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    let storage = state.storage.get_client().await?;

    let results = join_all(targets.iter().map(|path| {
        let storage = Arc::clone(&storage);
        async move {
            match storage.delete_if_exists(path).await {
                Ok(()) => DeleteOutcome {
                    path: path.clone(),
                    ok: true,
                    error: None,
                },
                Err(e) => DeleteOutcome {
                    path: path.clone(),
                    ok: false,
                    error: Some(e.to_string()),
                },
            }
        }
    }))
    .await;

    let (deleted, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.ok);
    let deleted: Vec<String> = deleted.into_iter().map(|r| r.path).collect();

    if failed.is_empty() {
        tracing::info!(
            bucket = %storage.bucket(),
            prefix = ?state.config.path_prefix,
            deleted = deleted.len(),
            "Delete completed"
        );
    } else {
        tracing::warn!(
            bucket = %storage.bucket(),
            prefix = ?state.config.path_prefix,
            deleted = deleted.len(),
            failed = failed.len(),
            "Delete completed with failures"
        );
    }

    let body = DeleteResponse {
        ok: failed.is_empty(),
        deleted,
        failed,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}
