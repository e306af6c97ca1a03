//! OCR Providers
//!
//! Defines the provider trait and implementations for different OCR backends.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{OcrError, OcrProvider, OcrResult};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Perform OCR on a PNG image
    async fn recognize(
        &self,
        image_data: &[u8],
        language: Option<&str>,
    ) -> Result<OcrResult, OcrError>;
}

/// Tesseract OCR provider
///
/// Runs the `tesseract` binary, streaming the image over stdin and reading
/// text from stdout.
pub struct TesseractProvider {
    /// Default language
    default_language: String,
    /// Page segmentation mode
    psm: u8,
    /// Binary to execute
    binary: String,
}

impl TesseractProvider {
    pub fn new(default_language: &str, psm: u8) -> Self {
        Self {
            default_language: default_language.to_string(),
            psm,
            binary: "tesseract".to_string(),
        }
    }

    /// Use a specific tesseract binary
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn recognize(
        &self,
        image_data: &[u8],
        language: Option<&str>,
    ) -> Result<OcrResult, OcrError> {
        let lang = language.unwrap_or(&self.default_language);

        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(lang)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(self.psm.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::ProviderNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ),
                _ => OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::ProcessingError("tesseract stdin unavailable".to_string()))?;
        let image = image_data.to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&image).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if let Ok(Err(e)) = writer.await {
            tracing::debug!("tesseract closed stdin early: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence: 80.0, // The plain-text output carries no confidence
            provider: OcrProvider::Tesseract,
        })
    }
}

/// Ollama vision model provider
pub struct OllamaProvider {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(
        &self,
        image_data: &[u8],
        language: Option<&str>,
    ) -> Result<OcrResult, OcrError> {
        use base64::Engine;

        let url = format!("{}/api/generate", self.base_url);

        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let lang_hint = language
            .map(|l| format!(" The text is in {}.", l))
            .unwrap_or_default();

        let prompt = format!(
            "Extract all text from this image exactly as written.{} Return only the extracted text, nothing else.",
            lang_hint
        );

        let request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [image_base64],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = result["response"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(OcrResult {
            text,
            confidence: 75.0, // LLMs don't provide confidence scores
            provider: OcrProvider::Ollama,
        })
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub response: OcrResult,
    pub available: bool,
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        self.response.provider
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(
        &self,
        _image_data: &[u8],
        _language: Option<&str>,
    ) -> Result<OcrResult, OcrError> {
        Ok(self.response.clone())
    }
}
