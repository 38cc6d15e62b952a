//! Router assembly.
//!
//! ## Structure
//! - `POST    /upload` — ingest a multipart form, answer `{"msg": ...}`
//! - `OPTIONS /upload` — CORS preflight, empty body
//! - `GET     /healthz`, `GET /readyz` — probes
//! - anything else — static files from the document root
//!
//! Both `/upload` methods, and any error they produce, carry the permissive
//! CORS headers. Static responses force revalidation on every request.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{preflight, upload},
    },
    config::AppConfig,
    middleware::cors,
    services::{
        ingest_service::IngestService, upload_policy::UploadPolicy, upload_store::UploadStore,
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    middleware,
    routing::{get, post},
};
use std::path::PathBuf;
use tower::Layer;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

const STATIC_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub doc_root: PathBuf,
    /// Transport ceiling for `/upload` bodies, above the policy limits.
    pub max_body_bytes: u64,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let policy = UploadPolicy::new(cfg.max_part_bytes, cfg.max_request_bytes);
        let store = UploadStore::from_dir(cfg.upload_dir.clone());
        Self {
            ingest: IngestService::new(policy, store, cfg.json_escape),
            doc_root: cfg.doc_root.clone(),
            max_body_bytes: cfg.max_body_bytes,
        }
    }
}

/// Build the complete application router.
pub fn routes(state: AppState) -> Router {
    let body_limit = usize::try_from(state.max_body_bytes).unwrap_or(usize::MAX);

    let static_files = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static(STATIC_CACHE_CONTROL),
    )
    .layer(ServeDir::new(&state.doc_root));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/upload",
            post(upload)
                .options(preflight)
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(cors::annotate)),
        )
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
