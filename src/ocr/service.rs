//! OCR Service
//!
//! Orchestrates OCR providers for pages without a text layer.

use std::sync::Arc;

use super::{
    provider::{OcrProviderTrait, OllamaProvider, TesseractProvider},
    types::{OcrError, OcrProvider, OcrResult},
};

/// OCR service configuration
#[derive(Debug, Clone)]
pub struct OcrServiceConfig {
    /// Whether OCR is used at all
    pub enabled: bool,
    /// Preferred provider order
    pub providers: Vec<OcrProvider>,
    /// Default OCR language
    pub default_language: String,
    /// Tesseract page segmentation mode
    pub tesseract_psm: u8,
    /// Ollama base URL
    pub ollama_url: String,
    /// Ollama model name
    pub ollama_model: String,
}

impl Default for OcrServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: vec![OcrProvider::Tesseract],
            default_language: "eng".to_string(),
            tesseract_psm: 3,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llava".to_string(),
        }
    }
}

/// A configured provider and the result of its startup probe
struct ProbedProvider {
    provider: Arc<dyn OcrProviderTrait>,
    available: bool,
}

/// OCR service
///
/// Provider availability is probed once, when the service is built.
pub struct OcrService {
    config: OcrServiceConfig,
    providers: Vec<ProbedProvider>,
}

impl OcrService {
    /// Build the configured providers and probe them
    pub async fn initialize(config: OcrServiceConfig) -> Self {
        if !config.enabled {
            tracing::info!("OCR disabled by configuration");
            return Self::disabled();
        }

        let mut providers: Vec<Arc<dyn OcrProviderTrait>> = Vec::new();
        for kind in &config.providers {
            match kind {
                OcrProvider::Tesseract => providers.push(Arc::new(TesseractProvider::new(
                    &config.default_language,
                    config.tesseract_psm,
                ))),
                OcrProvider::Ollama => providers.push(Arc::new(OllamaProvider::new(
                    &config.ollama_url,
                    &config.ollama_model,
                ))),
            }
        }

        Self::from_providers(config, providers).await
    }

    /// Use explicit provider instances, probed in the given order
    pub async fn from_providers(
        config: OcrServiceConfig,
        providers: Vec<Arc<dyn OcrProviderTrait>>,
    ) -> Self {
        let mut probed = Vec::with_capacity(providers.len());

        for provider in providers {
            let available = config.enabled && provider.is_available().await;
            if available {
                tracing::info!("OCR provider {} available", provider.provider_type());
            } else {
                tracing::warn!("OCR provider {} not available", provider.provider_type());
            }
            probed.push(ProbedProvider { provider, available });
        }

        Self {
            config,
            providers: probed,
        }
    }

    /// Service with OCR turned off
    pub fn disabled() -> Self {
        Self {
            config: OcrServiceConfig {
                enabled: false,
                providers: Vec::new(),
                ..Default::default()
            },
            providers: Vec::new(),
        }
    }

    /// Whether at least one provider can be used
    pub fn is_available(&self) -> bool {
        self.providers.iter().any(|p| p.available)
    }

    /// Providers that passed the startup probe, in preference order
    pub fn available_providers(&self) -> Vec<OcrProvider> {
        self.providers
            .iter()
            .filter(|p| p.available)
            .map(|p| p.provider.provider_type())
            .collect()
    }

    /// Perform OCR on a PNG image
    ///
    /// Tries each available provider in order and returns the first success.
    pub async fn recognize(
        &self,
        image_data: &[u8],
        language: Option<&str>,
    ) -> Result<OcrResult, OcrError> {
        let lang = language.unwrap_or(&self.config.default_language);
        let mut last_error = None;

        for entry in self.providers.iter().filter(|p| p.available) {
            match entry.provider.recognize(image_data, Some(lang)).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        "OCR provider {} failed: {}, trying next",
                        entry.provider.provider_type(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::ProviderNotAvailable("No OCR providers available".to_string())
        }))
    }
}
