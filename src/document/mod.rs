//! Document intake
//!
//! Receiving, fetching, validating and staging documents before extraction.
//!
//! ```text
//!   upload bytes ──┐
//!                  ├─► DocumentLoader::receive/fetch ─► Document
//!   URL / path  ───┘         (size, header checks)
//!                                    │
//!                                    ▼
//!                      DocumentLoader::stage ─► StagedDocument
//!                       (MuPDF open, page count,
//!                        encryption check)
//! ```

mod error;
mod loader;
mod types;

pub use error::{DocumentError, DocumentResult, Result};
pub use loader::{DocumentLoader, LoaderConfig, SourceLocation, StagedDocument};
pub use types::{BoundingBox, Document, DocumentFormat, DEFAULT_FILENAME, PDF_MIME};
