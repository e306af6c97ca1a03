//! OCR Module
//!
//! Provides OCR (Optical Character Recognition) for PDF pages that carry no
//! text layer.
//!
//! Supports multiple backends:
//! - Tesseract (local CLI, requires installation)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pdf_extraction_service::ocr::{OcrService, OcrServiceConfig};
//!
//! let service = OcrService::initialize(OcrServiceConfig::default()).await;
//!
//! // Providers that answered the startup probe
//! let providers = service.available_providers();
//!
//! // OCR a rendered page
//! let result = service.recognize(&png_bytes, Some("eng")).await?;
//! ```

mod provider;
mod service;
mod types;

pub use provider::{OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use service::{OcrService, OcrServiceConfig};
pub use types::{OcrError, OcrProvider, OcrResult};
