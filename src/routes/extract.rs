//! Extract-by-location route
//!
//! `POST /extract` takes a JSON body naming the document by URL or, when
//! enabled, by a path on the server.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::Instrument;

use crate::error::{AppError, Result};
use crate::extract::{ExtractOptions, ExtractionResult};
use crate::state::AppState;

use super::{admit, request_span, run_extraction};

/// Extraction request body
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// `http(s)://` URL of the document
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Path on the server (requires `ALLOW_LOCAL_FILES`)
    #[serde(default)]
    pub file_path: Option<String>,
    /// Overrides the filename derived from the location
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub options: ExtractOptions,
}

impl ExtractRequest {
    fn location(&self) -> Option<&str> {
        [self.pdf_url.as_deref(), self.file_path.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Fetch a document and extract it
///
/// The document is fetched only once a worker is free.
pub async fn extract_document(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let location = request.location().map(str::to_string).ok_or_else(|| {
        AppError::BadRequest("Request must include 'pdf_url' or 'file_path'".to_string())
    })?;

    async move {
        let permit = admit(&state).await?;

        let document = state
            .loader()
            .fetch(&location, request.filename.as_deref())
            .await?;

        let result = run_extraction(&state, &permit, document, &request.options).await?;
        Ok::<_, AppError>(Json(result))
    }
    .instrument(request_span())
    .await
}
