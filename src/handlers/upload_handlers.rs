//! HTTP handlers for `/upload`.

use crate::{errors::AppError, routes::routes::AppState};
use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// `OPTIONS /upload` — preflight. Empty body; CORS headers come from the layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// `POST /upload` — ingest a `multipart/form-data` body and acknowledge it.
///
/// Query-string parameters take part in field value lookup.
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let body = state.ingest.acknowledge(query, multipart).await?;

    let mut response = (StatusCode::OK, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}
