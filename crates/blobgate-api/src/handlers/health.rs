/// Liveness check. Never touches storage.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    )
)]
pub async fn health() -> &'static str {
    "OK"
}
