//! PDF Extraction Service
//!
//! HTTP service that extracts per-page text from PDFs, reading the text
//! layer directly and falling back to OCR for scanned pages.
//!
//! # Modules
//!
//! - `document`: Receiving, fetching, validating and staging documents
//! - `mupdf`: Thread-aware MuPDF access (text, rendering, info dictionary)
//! - `extract`: Extraction engine, text cleaning, layout hints
//! - `ocr`: OCR providers (Tesseract, Ollama) and fall-through service
//! - `worker`: Bounded worker pool for extraction concurrency
//! - `routes`: HTTP handlers

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod mupdf;
pub mod ocr;
pub mod routes;
pub mod state;
pub mod worker;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

/// Service name reported by the health and info endpoints
pub const SERVICE_NAME: &str = "pdf-extraction-service";

/// Room for multipart framing and flag fields on top of the document limit
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.loader().config().max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::health::service_info))
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/health", get(routes::health::health_check))
        // The upload handler checks the document size itself while streaming
        .route(
            "/upload",
            post(routes::upload::upload_document).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/extract", post(routes::extract::extract_document))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
