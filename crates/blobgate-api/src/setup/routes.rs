//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::constants::{DELETE_PATH, FETCH_PATH, HEALTH_PATH, OPENAPI_PATH, SIGN_PATH, UPLOAD_PATH};
use crate::handlers;
use crate::middleware::{sign_cors_middleware, SignCorsConfig};
use crate::state::AppState;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use blobgate_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let blob_routes = blob_routes().layer(cors);

    // The sign route answers its own preflight and sets its own CORS headers.
    let sign_cors = Arc::new(SignCorsConfig::new(config.cors_allow_origins.clone()));
    let sign_routes = sign_routes().layer(axum::middleware::from_fn_with_state(
        sign_cors,
        sign_cors_middleware,
    ));

    let app = blob_routes
        .merge(sign_routes)
        .route(HEALTH_PATH, get(handlers::health::health))
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn blob_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(UPLOAD_PATH, post(handlers::upload::upload_blob))
        .route(
            FETCH_PATH,
            get(handlers::fetch::fetch_by_query).post(handlers::fetch::fetch_by_body),
        )
        .route(DELETE_PATH, post(handlers::delete::delete_blobs))
}

fn sign_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        SIGN_PATH,
        post(handlers::sign::sign_upload).options(handlers::sign::sign_preflight),
    )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.allows_any_origin() {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_allow_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS_ALLOW_ORIGIN entry: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
