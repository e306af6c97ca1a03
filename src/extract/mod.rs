//! Content extraction
//!
//! Turns a staged PDF into an [`ExtractionResult`]: per-page text from the
//! text layer with OCR fallback, table and layout hints, title detection and
//! an optional first-page preview.

mod engine;
mod layout;
mod text;
mod types;

pub use engine::{EngineConfig, ExtractionEngine, ExtractionError, NATIVE_CONFIDENCE};
pub use layout::{detect_tables, layout_blocks};
pub use text::{clean_text, detect_title, significant_chars};
pub use types::{
    ExtractOptions, ExtractionMetadata, ExtractionMethod, ExtractionResult, LayoutBlock,
    PageMethod, PageRecord, TableRegion,
};
