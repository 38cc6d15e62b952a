//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the document root and upload directory

use crate::{routes::routes::AppState, services::upload_store::UploadStore};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Confirms the static document root is a directory.
/// 2. When uploads are written to disk, performs a write/read/delete in the
///    upload directory.
///
/// HTTP 200 when all checks pass, HTTP 503 when any check fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = HashMap::new();
    checks.insert("doc_root", doc_root_check(&state.doc_root).await);
    if let UploadStore::Disk(store) = &state.ingest.store {
        checks.insert("upload_dir", disk_check(&store.base_dir).await);
    }

    let overall_ok = checks.values().all(|check| check.ok);
    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn doc_root_check(root: &Path) -> CheckStatus {
    match fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => CheckStatus::ok(),
        Ok(_) => CheckStatus::failed("not a directory"),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    }
}

async fn disk_check(dir: &Path) -> CheckStatus {
    let tmp_path = dir.join(format!(".readyz-{}", Uuid::new_v4()));
    match fs::write(&tmp_path, b"readyz").await {
        Ok(_) => match fs::read(&tmp_path).await {
            Ok(bytes) => {
                if bytes == b"readyz" {
                    match fs::remove_file(&tmp_path).await {
                        Ok(_) => CheckStatus::ok(),
                        Err(e) => CheckStatus {
                            ok: true,
                            error: Some(format!("could not remove tmp file: {}", e)),
                        },
                    }
                } else {
                    let _ = fs::remove_file(&tmp_path).await;
                    CheckStatus::failed("file content mismatch")
                }
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                CheckStatus::failed(format!("could not read tmp file: {}", e))
            }
        },
        Err(e) => CheckStatus::failed(format!("could not write tmp file: {}", e)),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
        }
    }
}
