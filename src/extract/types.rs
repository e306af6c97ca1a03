//! Extraction result types

use serde::{Deserialize, Serialize};

use crate::document::BoundingBox;
use crate::mupdf::PdfInfo;

/// Per-request extraction options
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractOptions {
    /// Render a thumbnail of the first page
    #[serde(default = "default_true")]
    pub generate_preview: bool,
    /// Include text blocks with bounding boxes in each page record
    #[serde(default)]
    pub include_layout: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            generate_preview: true,
            include_layout: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// How a single page was read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMethod {
    /// Text layer
    Native,
    /// Rendered and recognised
    Ocr,
    /// Nothing could be read
    None,
}

/// How the document as a whole was read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Native,
    Ocr,
    Hybrid,
    None,
}

impl ExtractionMethod {
    /// Summarise per-page methods
    pub fn from_pages(pages: &[PageRecord]) -> Self {
        let native = pages.iter().any(|p| p.method == PageMethod::Native);
        let ocr = pages.iter().any(|p| p.method == PageMethod::Ocr);
        match (native, ocr) {
            (true, true) => Self::Hybrid,
            (true, false) => Self::Native,
            (false, true) => Self::Ocr,
            (false, false) => Self::None,
        }
    }
}

/// Detected table region on a page
#[derive(Debug, Clone, Serialize)]
pub struct TableRegion {
    pub bbox: BoundingBox,
    pub rows: usize,
    pub columns: usize,
}

/// Text block with its position on the page
#[derive(Debug, Clone, Serialize)]
pub struct LayoutBlock {
    pub bbox: BoundingBox,
    pub line_count: usize,
    pub text: String,
}

/// Extraction output for one page
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// 1-based page number
    pub page_number: usize,
    pub text: String,
    pub char_count: usize,
    pub word_count: usize,
    pub ocr_used: bool,
    pub method: PageMethod,
    /// 0.0 - 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    pub tables: Vec<TableRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Vec<LayoutBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    /// Record for a page whose text could be read
    pub fn with_text(
        page_number: usize,
        text: String,
        method: PageMethod,
        confidence: f64,
    ) -> Self {
        Self {
            page_number,
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            ocr_used: method == PageMethod::Ocr,
            method,
            confidence: Some(confidence),
            text,
            width: 0.0,
            height: 0.0,
            tables: Vec::new(),
            layout: None,
            error: None,
        }
    }

    /// Record for a page that failed
    pub fn failed(page_number: usize, ocr_used: bool, error: String) -> Self {
        Self {
            page_number,
            text: String::new(),
            char_count: 0,
            word_count: 0,
            ocr_used,
            method: PageMethod::None,
            confidence: Some(0.0),
            width: 0.0,
            height: 0.0,
            tables: Vec::new(),
            layout: None,
            error: Some(error),
        }
    }
}

/// Document-level metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionMetadata {
    #[serde(flatten)]
    pub info: PdfInfo,
    pub file_size: u64,
    pub has_tables: bool,
    pub ocr_pages: usize,
}

/// Structured output of one extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub document_id: String,
    pub filename: String,
    pub title: String,
    pub method: ExtractionMethod,
    /// Page texts joined with blank lines
    pub content: String,
    pub page_count: usize,
    pub word_count: usize,
    pub char_count: usize,
    /// Ordered by page number
    pub pages: Vec<PageRecord>,
    /// At least one page failed
    pub partial: bool,
    /// 1-based numbers of failed pages
    pub failed_pages: Vec<usize>,
    pub extraction_confidence: f64,
    pub metadata: ExtractionMetadata,
    pub summary: String,
    /// `data:image/png;base64,...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    pub processing_time_ms: u64,
}
