use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use std::path::Path;
use tower::ServiceExt;
use upload_echo::{
    routes::routes::{AppState, routes},
    services::{
        ingest_service::IngestService, response_encoder::JsonEscape,
        upload_policy::UploadPolicy, upload_store::UploadStore,
    },
};

const BOUNDARY: &str = "----upload-echo-test";

fn app(doc_root: &Path, policy: UploadPolicy, store: UploadStore, escape: JsonEscape) -> Router {
    app_with_body_limit(doc_root, policy, store, escape, policy.default_body_limit())
}

fn app_with_body_limit(
    doc_root: &Path,
    policy: UploadPolicy,
    store: UploadStore,
    escape: JsonEscape,
    max_body_bytes: u64,
) -> Router {
    routes(AppState {
        ingest: IngestService::new(policy, store, escape),
        doc_root: doc_root.to_path_buf(),
        max_body_bytes,
    })
}

fn default_app(doc_root: &Path) -> Router {
    app(
        doc_root,
        UploadPolicy::default(),
        UploadStore::Discard,
        JsonEscape::Newlines,
    )
}

fn field(name: &str, value: &str) -> String {
    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
}

fn file(name: &str, content_type: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
    )
}

fn post_upload(uri: &str, parts: &[String]) -> Request<Body> {
    let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_cors(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}

#[tokio::test]
async fn preflight_has_cors_headers_and_no_body() {
    let root = tempfile::tempdir().unwrap();
    let response = default_app(root.path())
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/upload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn empty_form_acknowledges_header_only() {
    let root = tempfile::tempdir().unwrap();
    let response = default_app(root.path())
        .oneshot(post_upload("/upload", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        body_text(response).await,
        r#"{"msg":"----Received by server----\n"}"#
    );
}

#[tokio::test]
async fn acknowledgment_has_no_trailing_newline() {
    let root = tempfile::tempdir().unwrap();
    let response = default_app(root.path())
        .oneshot(post_upload("/upload", &[field("a", "b")]))
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        &bytes[..],
        br#"{"msg":"----Received by server----\nparamName=a paramValue=b\n"}"#
    );
    assert!(!bytes.contains(&b'\n'));
}

#[tokio::test]
async fn mixed_form_is_echoed_in_order() {
    let root = tempfile::tempdir().unwrap();
    let parts = [
        file("f", "text/plain", "x.txt", ""),
        field("a", "b"),
        file("g", "image/png", "y.png", "PNG"),
    ];
    let response = default_app(root.path())
        .oneshot(post_upload("/upload", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        concat!(
            r#"{"msg":"----Received by server----\n"#,
            r#"paramName=f contentType=text/plain fileName=x.txt fileSize=0 decision=skipped\n"#,
            r#"paramName=a paramValue=b\n"#,
            r#"paramName=g contentType=image/png fileName=y.png fileSize=3 decision=persisted\n"}"#,
        )
    );
}

#[tokio::test]
async fn oversized_part_is_rejected_but_request_succeeds() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        root.path(),
        UploadPolicy::new(8, 1024),
        UploadStore::Discard,
        JsonEscape::Newlines,
    );
    let parts = [
        file("big", "text/plain", "big.txt", "123456789"),
        file("fit", "text/plain", "fit.txt", "12345678"),
    ];
    let response = app.oneshot(post_upload("/upload", &parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("fileName=big.txt fileSize=9 decision=rejected"));
    assert!(text.contains("fileName=fit.txt fileSize=8 decision=persisted"));
}

#[tokio::test]
async fn part_over_limit_does_not_consume_request_budget() {
    let root = tempfile::tempdir().unwrap();
    let app = app_with_body_limit(
        root.path(),
        UploadPolicy::new(64, 128),
        UploadStore::Discard,
        JsonEscape::Newlines,
        4096,
    );
    let parts = [
        file("over", "text/plain", "over.bin", &"a".repeat(65)),
        file("fits", "text/plain", "fits.bin", &"b".repeat(64)),
    ];
    let response = app.oneshot(post_upload("/upload", &parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("fileName=over.bin fileSize=65 decision=rejected"));
    assert!(text.contains("fileName=fits.bin fileSize=64 decision=persisted"));
}

#[tokio::test]
async fn cumulative_limit_rejects_through_http() {
    let root = tempfile::tempdir().unwrap();
    let app = app_with_body_limit(
        root.path(),
        UploadPolicy::new(64, 100),
        UploadStore::Discard,
        JsonEscape::Newlines,
        4096,
    );
    let parts = [
        file("a", "text/plain", "a.bin", &"a".repeat(64)),
        file("b", "text/plain", "b.bin", &"b".repeat(64)),
        file("c", "text/plain", "c.bin", &"c".repeat(36)),
    ];
    let response = app.oneshot(post_upload("/upload", &parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("fileName=a.bin fileSize=64 decision=persisted"));
    assert!(text.contains("fileName=b.bin fileSize=64 decision=rejected"));
    assert!(text.contains("fileName=c.bin fileSize=36 decision=persisted"));
}

#[tokio::test]
async fn query_string_takes_part_in_field_lookup() {
    let root = tempfile::tempdir().unwrap();
    let response = default_app(root.path())
        .oneshot(post_upload("/upload?a=query", &[field("a", "body")]))
        .await
        .unwrap();

    assert!(body_text(response).await.contains("paramName=a paramValue=query"));
}

#[tokio::test]
async fn full_escape_keeps_quotes_valid() {
    let root = tempfile::tempdir().unwrap();
    let app = app(
        root.path(),
        UploadPolicy::default(),
        UploadStore::Discard,
        JsonEscape::Full,
    );
    let response = app
        .oneshot(post_upload("/upload", &[field("q", "say \"hi\"")]))
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        parsed["msg"],
        "----Received by server----\nparamName=q paramValue=say \"hi\"\n"
    );
}

#[tokio::test]
async fn truncated_body_is_a_client_error_with_cors() {
    let root = tempfile::tempdir().unwrap();
    let body = format!(
        "{}--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"f\"; filename=\"x\"\r\nContent-Type: text/plain\r\n\r\ncut short",
        field("a", "b")
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = default_app(root.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    let parsed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["status"], 400);
}

#[tokio::test]
async fn non_multipart_post_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = default_app(root.path()).oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
    assert_cors(&response);
}

#[tokio::test]
async fn body_over_request_limit_is_payload_too_large() {
    let root = tempfile::tempdir().unwrap();
    let app = app_with_body_limit(
        root.path(),
        UploadPolicy::new(64, 256),
        UploadStore::Discard,
        JsonEscape::Newlines,
        512,
    );
    let big = "x".repeat(4096);
    let response = app
        .oneshot(post_upload("/upload", &[file("f", "text/plain", "f.txt", &big)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_cors(&response);
}

#[tokio::test]
async fn other_methods_on_upload_are_not_allowed() {
    let root = tempfile::tempdir().unwrap();
    let response = default_app(root.path())
        .oneshot(Request::builder().uri("/upload").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn disk_store_writes_accepted_files() {
    let root = tempfile::tempdir().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let app = app(
        root.path(),
        UploadPolicy::default(),
        UploadStore::from_dir(Some(uploads.path().to_path_buf())),
        JsonEscape::Newlines,
    );
    let parts = [
        file("f", "text/plain", "notes.txt", "hello"),
        file("g", "text/plain", "empty.txt", ""),
    ];
    let response = app.oneshot(post_upload("/upload", &parts)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(uploads.path().join("notes.txt")).unwrap(),
        "hello"
    );
    assert!(!uploads.path().join("empty.txt").exists());
}

#[tokio::test]
async fn static_files_force_revalidation() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), "<h1>upload</h1>").unwrap();

    let response = default_app(root.path())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "no-store, no-cache, must-revalidate"
    );
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(body_text(response).await, "<h1>upload</h1>");

    let missing = default_app(root.path())
        .oneshot(
            Request::builder()
                .uri("/missing.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_readiness() {
    let root = tempfile::tempdir().unwrap();
    let uploads = tempfile::tempdir().unwrap();
    let app = app(
        root.path(),
        UploadPolicy::default(),
        UploadStore::from_dir(Some(uploads.path().to_path_buf())),
        JsonEscape::Newlines,
    );

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let ready = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body_text(ready).await).unwrap();
    assert_eq!(parsed["checks"]["upload_dir"]["ok"], true);
    assert_eq!(parsed["checks"]["doc_root"]["ok"], true);
}

#[tokio::test]
async fn readiness_fails_without_doc_root() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nope");
    let response = default_app(&missing)
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
