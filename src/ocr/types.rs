//! OCR Types
//!
//! Defines types for OCR processing of scanned PDF pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OCR provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    /// Tesseract OCR (local CLI)
    Tesseract,
    /// Ollama vision model (local LLM)
    Ollama,
}

impl fmt::Display for OcrProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tesseract => write!(f, "tesseract"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for OcrProvider {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ollama" => Ok(Self::Ollama),
            other => Err(OcrError::UnknownProvider(other.to_string())),
        }
    }
}

/// OCR result
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Recognized text
    pub text: String,
    /// Confidence score (0-100)
    pub confidence: f64,
    /// Provider used
    pub provider: OcrProvider,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Unknown OCR provider '{0}', expected tesseract or ollama")]
    UnknownProvider(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_roundtrip() {
        for provider in [OcrProvider::Tesseract, OcrProvider::Ollama] {
            let parsed: OcrProvider = provider.to_string().parse().unwrap();
            assert_eq!(parsed, provider);
        }
        assert_eq!(" Tesseract ".parse::<OcrProvider>().unwrap(), OcrProvider::Tesseract);
        assert!(matches!(
            "OpenAI".parse::<OcrProvider>(),
            Err(OcrError::UnknownProvider(name)) if name == "openai"
        ));
    }
}
