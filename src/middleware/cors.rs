//! Permissive cross-origin headers for the upload endpoint.
//!
//! Browsers send a preflight `OPTIONS` before an Ajax multipart POST from
//! another origin; both it and the POST itself must carry these headers,
//! including when the request fails.

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// Attach `Access-Control-Allow-Origin: *` and `Access-Control-Allow-Headers: *`.
pub async fn annotate(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}
