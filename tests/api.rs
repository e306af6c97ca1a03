//! HTTP API tests driven through the router with `oneshot`

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{build_pdf, multipart_body, test_state, MockOcr, TestPage};
use pdf_extraction_service::config::Config;
use pdf_extraction_service::extract::ExtractionEngine;
use pdf_extraction_service::ocr::OcrService;
use pdf_extraction_service::{app, AppState};

const BOUNDARY: &str = "----pdf-extraction-test";

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_request(
    field: &str,
    filename: &str,
    data: &[u8],
    extra: &[(&str, &str)],
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(BOUNDARY, field, filename, data, extra)))
        .unwrap()
}

fn extract_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/extract")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn router(config: Config) -> Router {
    app(test_state(config, MockOcr::returning("scanned words")).await)
}

fn sample_pdf() -> Vec<u8> {
    build_pdf(
        &[
            TestPage::Text(vec!["Introduction to the report"]),
            TestPage::Blank,
        ],
        None,
    )
}

/// Serve `sample_pdf` at `/report.pdf`, counting downloads
async fn document_server(hits: Arc<AtomicUsize>) -> String {
    let pdf = sample_pdf();
    let router = Router::new().route(
        "/report.pdf",
        get(move || {
            let hits = Arc::clone(&hits);
            let pdf = pdf.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                ([(header::CONTENT_TYPE, "application/pdf")], pdf)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{}", addr)
}

#[tokio::test]
async fn upload_returns_extraction_result() {
    let app = router(Config::default()).await;

    let response = app
        .oneshot(upload_request(
            "file",
            "report.pdf",
            &sample_pdf(),
            &[("generate_preview", "true"), ("include_layout", "1")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["page_count"], 2);
    assert_eq!(body["method"], "hybrid");
    assert_eq!(body["pages"][0]["page_number"], 1);
    assert_eq!(body["pages"][0]["ocr_used"], false);
    assert_eq!(body["pages"][1]["ocr_used"], true);
    assert_eq!(body["pages"][1]["text"], "scanned words");
    assert!(body["pages"][0]["layout"].is_array());
    assert!(body["preview_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn upload_accepts_pdf_field_name() {
    let app = router(Config::default()).await;
    let response = app
        .oneshot(upload_request("pdf", "alt.pdf", &sample_pdf(), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let app = router(Config::default()).await;
    let response = app
        .oneshot(upload_request("attachment", "report.pdf", &sample_pdf(), &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn upload_rejects_invalid_documents() {
    let app = router(Config::default()).await;

    let response = app
        .clone()
        .oneshot(upload_request("file", "notes.txt", b"just some text", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "INVALID_DOCUMENT");

    let response = app
        .oneshot(upload_request("file", "broken.pdf", b"%PDF-1.4\n%%EOF", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["code"], "CORRUPT_DOCUMENT");
}

#[tokio::test]
async fn upload_enforces_size_limit() {
    let mut config = Config::default();
    config.documents.max_upload_bytes = 64;
    let app = router(config).await;

    let response = app
        .oneshot(upload_request("file", "big.pdf", &sample_pdf(), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(read_json(response).await["code"], "DOCUMENT_TOO_LARGE");
}

#[tokio::test]
async fn extract_requires_a_location() {
    let app = router(Config::default()).await;

    let response = app
        .clone()
        .oneshot(extract_request(json!({ "filename": "a.pdf" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "BAD_REQUEST");

    let malformed = Request::builder()
        .method("POST")
        .uri("/extract")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(malformed).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extract_rejects_client_file_urls() {
    let app = router(Config::default()).await;
    let response = app
        .oneshot(extract_request(
            json!({ "pdf_url": "file:///Users/someone/Downloads/report.pdf" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "LOCAL_FILE_UPLOAD_REQUIRED");
}

#[tokio::test]
async fn extract_local_paths_follow_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.pdf");
    std::fs::write(&path, sample_pdf()).unwrap();
    let location = path.to_string_lossy().to_string();

    let denied = router(Config::default())
        .await
        .oneshot(extract_request(json!({ "file_path": location })))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(denied).await["code"], "LOCAL_FILE_ACCESS_DENIED");

    let mut config = Config::default();
    config.documents.allow_local_files = true;
    let app = router(config).await;

    let response = app
        .clone()
        .oneshot(extract_request(json!({ "file_path": location, "filename": "renamed.pdf" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["filename"], "renamed.pdf");
    assert_eq!(body["page_count"], 2);

    let missing = dir.path().join("missing.pdf").to_string_lossy().to_string();
    let response = app
        .oneshot(extract_request(json!({ "file_path": missing })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unavailable_engine_returns_503_and_degraded_health() {
    let config = Config::default();
    let engine =
        ExtractionEngine::unavailable(config.engine_config(), Arc::new(OcrService::disabled()));
    let app = app(AppState::with_engine(config, engine).unwrap());

    let response = app
        .clone()
        .oneshot(upload_request("file", "report.pdf", &sample_pdf(), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(response).await["code"], "ENGINE_UNAVAILABLE");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["docling_available"], false);
}

#[tokio::test]
async fn requests_beyond_capacity_are_rejected_while_health_responds() {
    let mut config = Config::default();
    config.workers.concurrency = 1;
    config.workers.max_queue = 0;
    config.workers.queue_timeout = Duration::from_secs(7);

    let state = test_state(config, MockOcr::slow("slow scan", Duration::from_millis(800))).await;
    let app = app(state.clone());
    let scanned = build_pdf(&[TestPage::Blank], None);

    let first = tokio::spawn({
        let app = app.clone();
        let scanned = scanned.clone();
        async move {
            app.oneshot(upload_request("file", "slow.pdf", &scanned, &[]))
                .await
                .unwrap()
        }
    });

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.workers().stats().active == 0 {
        assert!(tokio::time::Instant::now() < deadline, "first request never started");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let busy = app
        .clone()
        .oneshot(upload_request("file", "second.pdf", &scanned, &[]))
        .await
        .unwrap();
    assert_eq!(busy.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(busy.headers()[header::RETRY_AFTER], "7");
    assert_eq!(read_json(busy).await["code"], "SERVER_BUSY");

    let health = tokio::time::timeout(
        Duration::from_millis(500),
        app.clone().oneshot(get("/health")),
    )
    .await
    .expect("health check should not wait for workers")
    .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body = read_json(health).await;
    assert_eq!(body["workers"]["active"], 1);
    assert_eq!(body["workers"]["rejected"], 1);

    let first = first.await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(read_json(first).await["pages"][0]["text"], "slow scan");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = router(Config::default()).await;
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["service"], "pdf-extraction-service");
    assert!(body["endpoints"].as_array().unwrap().len() >= 4);
}

#[tokio::test]
async fn upload_rejects_oversized_flag_fields() {
    let app = router(Config::default()).await;
    let huge = "1".repeat(5 * 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "file",
            "report.pdf",
            &sample_pdf(),
            &[("generate_preview", huge.as_str())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn upload_body_limit_covers_unknown_fields() {
    let mut config = Config::default();
    config.documents.max_upload_bytes = 1024;
    let app = router(config).await;
    let padding = "x".repeat(256 * 1024);

    let response = app
        .oneshot(upload_request(
            "file",
            "report.pdf",
            b"%PDF-1.4\n",
            &[("notes", padding.as_str())],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(read_json(response).await["code"], "DOCUMENT_TOO_LARGE");
}

#[tokio::test]
async fn extract_downloads_remote_document_with_preview() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = document_server(Arc::clone(&hits)).await;
    let app = router(Config::default()).await;

    let response = app
        .oneshot(extract_request(
            json!({ "pdf_url": format!("{}/report.pdf", base) }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["page_count"], 2);
    assert!(body["preview_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn busy_requests_are_turned_away_before_reading_documents() {
    let mut config = Config::default();
    config.workers.concurrency = 1;
    config.workers.max_queue = 0;
    config.documents.allow_local_files = true;

    let state = test_state(config, MockOcr::returning("x")).await;
    let app = app(state.clone());
    let hits = Arc::new(AtomicUsize::new(0));
    let base = document_server(Arc::clone(&hits)).await;

    let held = state.workers().acquire().await.unwrap();

    // Reading this path would answer NOT_FOUND
    let response = app
        .clone()
        .oneshot(extract_request(
            json!({ "file_path": "/nonexistent/missing.pdf" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(response).await["code"], "SERVER_BUSY");

    let response = app
        .clone()
        .oneshot(extract_request(
            json!({ "pdf_url": format!("{}/report.pdf", base) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // Reading this upload would answer INVALID_DOCUMENT
    let response = app
        .clone()
        .oneshot(upload_request("file", "notes.txt", b"just some text", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_json(response).await["code"], "SERVER_BUSY");
    assert_eq!(state.workers().stats().rejected, 3);

    drop(held);
    let response = app
        .oneshot(extract_request(
            json!({ "pdf_url": format!("{}/report.pdf", base) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
