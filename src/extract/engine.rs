//! Extraction engine
//!
//! Reads every page of a staged document in order. Pages with a text layer
//! are read directly; pages without one are rendered and handed to OCR.
//! A page that fails is recorded and the rest of the document continues.

use std::sync::Arc;
use std::time::Instant;

use base64::Engine as _;

use crate::document::{DocumentError, DocumentResult, StagedDocument};
use crate::mupdf::{
    extract_page_text, read_info, render_page_png, render_preview_png, PageText, PdfInfo,
    SafeDocument, PROBE_PDF,
};
use crate::ocr::OcrService;

use super::layout::{detect_tables, layout_blocks};
use super::text::{clean_text, detect_title, significant_chars};
use super::types::{
    ExtractOptions, ExtractionMetadata, ExtractionMethod, ExtractionResult, PageMethod, PageRecord,
};

/// Confidence assigned to text read from the text layer
pub const NATIVE_CONFIDENCE: f64 = 0.95;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Resolution pages are rendered at for OCR
    pub ocr_dpi: u32,
    /// Pages with fewer non-whitespace characters go to OCR
    pub ocr_min_text_chars: usize,
    /// OCR language, provider default when `None`
    pub ocr_language: Option<String>,
    /// Preview bounding box
    pub preview_width: u32,
    pub preview_height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ocr_dpi: 300,
            ocr_min_text_chars: 1,
            ocr_language: None,
            preview_width: 300,
            preview_height: 400,
        }
    }
}

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Extraction engine is not available")]
    EngineUnavailable,

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Extraction engine
pub struct ExtractionEngine {
    config: EngineConfig,
    ocr: Arc<OcrService>,
    available: bool,
}

impl ExtractionEngine {
    /// Create the engine and run the startup self-test
    pub async fn new(config: EngineConfig, ocr: Arc<OcrService>) -> Self {
        let available = match self_test().await {
            Ok(()) => {
                tracing::info!("Extraction engine self-test passed");
                true
            }
            Err(e) => {
                tracing::error!("Extraction engine self-test failed: {}", e);
                false
            }
        };

        Self {
            config,
            ocr,
            available,
        }
    }

    /// Engine that rejects every extraction
    pub fn unavailable(config: EngineConfig, ocr: Arc<OcrService>) -> Self {
        Self {
            config,
            ocr,
            available: false,
        }
    }

    /// Result of the startup self-test
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract a staged document
    ///
    /// Fails only when the engine is unavailable; per-page problems are
    /// reported in the page records and mark the result partial.
    pub async fn extract(
        &self,
        staged: &StagedDocument,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult, ExtractionError> {
        if !self.available {
            return Err(ExtractionError::EngineUnavailable);
        }

        let started = Instant::now();
        let document = &staged.document;
        let page_count = staged.page_count();

        tracing::info!(
            document_id = %document.id(),
            filename = %document.filename(),
            pages = page_count,
            "Starting extraction"
        );

        let info = match with_pdf(&staged.pdf, |doc| Ok(read_info(doc))).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(
                    document_id = %document.id(),
                    "Failed to read document info: {}",
                    e
                );
                PdfInfo::default()
            }
        };

        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let record = self.extract_page(&staged.pdf, index, options).await;
            if let Some(error) = &record.error {
                tracing::warn!(
                    document_id = %document.id(),
                    page = record.page_number,
                    "Page extraction failed: {}",
                    error
                );
            }
            pages.push(record);
        }

        let preview_image = if options.generate_preview {
            self.preview(&staged.pdf).await
        } else {
            None
        };

        let content = pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let failed_pages: Vec<usize> = pages
            .iter()
            .filter(|p| p.error.is_some())
            .map(|p| p.page_number)
            .collect();

        let extraction_confidence = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.confidence.unwrap_or(0.0)).sum::<f64>() / pages.len() as f64
        };

        let word_count = content.split_whitespace().count();
        let title = detect_title(info.title.as_deref(), &content, document.stem());
        let method = ExtractionMethod::from_pages(&pages);

        let metadata = ExtractionMetadata {
            info,
            file_size: document.size(),
            has_tables: pages.iter().any(|p| !p.tables.is_empty()),
            ocr_pages: pages.iter().filter(|p| p.ocr_used).count(),
        };

        let processing_time_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            document_id = %document.id(),
            filename = %document.filename(),
            pages = page_count,
            method = ?method,
            words = word_count,
            failed = failed_pages.len(),
            duration_ms = processing_time_ms,
            "Extraction complete"
        );

        Ok(ExtractionResult {
            success: true,
            document_id: document.id().to_string(),
            filename: document.filename().to_string(),
            title,
            method,
            char_count: content.chars().count(),
            word_count,
            page_count,
            partial: !failed_pages.is_empty(),
            failed_pages,
            extraction_confidence,
            metadata,
            summary: format!("Extracted {} words from {} pages", word_count, page_count),
            preview_image,
            processing_time_ms,
            content,
            pages,
        })
    }

    async fn extract_page(
        &self,
        pdf: &Arc<SafeDocument>,
        index: usize,
        options: &ExtractOptions,
    ) -> PageRecord {
        let page_number = index + 1;

        let native = with_pdf(pdf, move |doc| {
            let page = doc.load_page(index as i32)?;
            extract_page_text(&page)
        })
        .await;

        let page_text = match native {
            Ok(page_text) => page_text,
            Err(e) => {
                tracing::debug!(page = page_number, "Text layer unreadable: {}", e);
                PageText::default()
            }
        };

        let text = clean_text(&page_text.text);
        let mut record = if significant_chars(&text) >= self.config.ocr_min_text_chars {
            PageRecord::with_text(page_number, text, PageMethod::Native, NATIVE_CONFIDENCE)
        } else {
            self.ocr_page(pdf, index).await
        };

        record.width = page_text.width;
        record.height = page_text.height;
        if record.method == PageMethod::Native {
            record.tables = detect_tables(&page_text);
            if options.include_layout {
                record.layout = Some(layout_blocks(&page_text));
            }
        }

        record
    }

    async fn ocr_page(&self, pdf: &Arc<SafeDocument>, index: usize) -> PageRecord {
        let page_number = index + 1;

        if !self.ocr.is_available() {
            return PageRecord::failed(
                page_number,
                false,
                "Page has no text layer and no OCR provider is available".to_string(),
            );
        }

        let dpi = self.config.ocr_dpi;
        let png = match with_pdf(pdf, move |doc| {
            let page = doc.load_page(index as i32)?;
            render_page_png(&page, dpi)
        })
        .await
        {
            Ok(png) => png,
            Err(e) => {
                return PageRecord::failed(
                    page_number,
                    true,
                    format!("Failed to render page: {}", e),
                );
            }
        };

        match self.ocr.recognize(&png, self.config.ocr_language.as_deref()).await {
            Ok(result) => {
                tracing::debug!(
                    page = page_number,
                    provider = %result.provider,
                    confidence = result.confidence,
                    "OCR complete"
                );
                let confidence = (result.confidence / 100.0).clamp(0.0, 1.0);
                PageRecord::with_text(
                    page_number,
                    clean_text(&result.text),
                    PageMethod::Ocr,
                    confidence,
                )
            }
            Err(e) => PageRecord::failed(page_number, true, e.to_string()),
        }
    }

    async fn preview(&self, pdf: &Arc<SafeDocument>) -> Option<String> {
        let (width, height) = (self.config.preview_width, self.config.preview_height);

        match with_pdf(pdf, move |doc| {
            let page = doc.load_page(0)?;
            render_preview_png(&page, width, height)
        })
        .await
        {
            Ok(png) => Some(format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png)
            )),
            Err(e) => {
                tracing::warn!(document_id = %pdf.id(), "Preview generation failed: {}", e);
                None
            }
        }
    }
}

/// Run a MuPDF operation on a blocking thread
async fn with_pdf<F, R>(pdf: &Arc<SafeDocument>, f: F) -> DocumentResult<R>
where
    F: FnOnce(&mupdf::Document) -> DocumentResult<R> + Send + 'static,
    R: Send + 'static,
{
    let pdf = Arc::clone(pdf);
    tokio::task::spawn_blocking(move || pdf.with_doc(f)).await?
}

/// Open the embedded probe document and read its first page
async fn self_test() -> DocumentResult<()> {
    tokio::task::spawn_blocking(|| {
        let pdf =
            SafeDocument::from_bytes(Arc::new(PROBE_PDF.to_vec()), "self-test".to_string())?;
        pdf.with_doc(|doc| {
            let page = doc.load_page(0)?;
            extract_page_text(&page)?;
            Ok(())
        })
    })
    .await?
}
