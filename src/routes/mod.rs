//! Route modules for the PDF extraction service

pub mod extract;
pub mod health;
pub mod upload;

use tracing::field;
use uuid::Uuid;

use crate::document::Document;
use crate::error::{AppError, Result};
use crate::extract::{ExtractOptions, ExtractionError, ExtractionResult};
use crate::state::AppState;
use crate::worker::WorkerPermit;

/// Span covering one extraction request
pub(crate) fn request_span() -> tracing::Span {
    tracing::info_span!(
        "extraction",
        request_id = %Uuid::new_v4(),
        document_id = field::Empty,
        size = field::Empty
    )
}

/// Take a worker for this request
///
/// Runs before any document bytes are read, so requests that are queued or
/// turned away never hold a document in memory.
pub(crate) async fn admit(state: &AppState) -> Result<WorkerPermit> {
    if !state.engine().is_available() {
        return Err(ExtractionError::EngineUnavailable.into());
    }

    let workers = state.workers();
    workers
        .acquire()
        .await
        .map_err(|e| AppError::busy(e, workers.retry_after_secs()))
}

/// Open and extract a document on an admitted worker
pub(crate) async fn run_extraction(
    state: &AppState,
    _permit: &WorkerPermit,
    document: Document,
    options: &ExtractOptions,
) -> Result<ExtractionResult> {
    let span = tracing::Span::current();
    span.record("document_id", field::display(document.id()));
    span.record("size", document.size());

    let staged = state.loader().stage(document).await?;
    Ok(state.engine().extract(&staged, options).await?)
}
