//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blobgate API",
        version = "0.1.0",
        description = "Upload, fetch, delete and signed-upload proxy for a Google Cloud Storage bucket"
    ),
    paths(
        handlers::upload::upload_blob,
        handlers::fetch::fetch_by_query,
        handlers::fetch::fetch_by_body,
        handlers::delete::delete_blobs,
        handlers::sign::sign_upload,
        handlers::sign::sign_preflight,
        handlers::health::health,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::upload::UploadResponse,
        handlers::fetch::FetchRequest,
        handlers::delete::DeleteRequest,
        handlers::delete::BatchDelete,
        handlers::delete::SingleDelete,
        handlers::delete::DeleteResponse,
        handlers::delete::DeleteOutcome,
        handlers::delete::DeleteSkippedResponse,
        handlers::sign::SignRequest,
        handlers::sign::SignResponse,
        handlers::sign::UploadHeaders,
    )),
    tags(
        (name = "blob", description = "Object operations"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
