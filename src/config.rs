//! Configuration management for the PDF extraction service

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::document::LoaderConfig;
use crate::extract::EngineConfig;
use crate::ocr::{OcrProvider, OcrServiceConfig};

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub workers: WorkerConfig,
    pub documents: DocumentConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Concurrent extractions
    pub concurrency: usize,
    /// Requests allowed to wait for a worker
    pub max_queue: usize,
    pub queue_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub max_upload_bytes: u64,
    pub allow_local_files: bool,
    pub download_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub enabled: bool,
    pub providers: Vec<OcrProvider>,
    pub language: String,
    pub dpi: u32,
    pub min_text_chars: usize,
    pub tesseract_psm: u8,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Refuse to start without a working OCR provider
    pub required: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            workers: WorkerConfig {
                concurrency: 1,
                max_queue: 4,
                queue_timeout: Duration::from_secs(30),
            },
            documents: DocumentConfig {
                max_upload_bytes: 50 * 1024 * 1024,
                allow_local_files: false,
                download_timeout: Duration::from_secs(30),
            },
            ocr: OcrConfig {
                enabled: true,
                providers: vec![OcrProvider::Tesseract],
                language: "eng".to_string(),
                dpi: 300,
                min_text_chars: 1,
                tesseract_psm: 3,
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
                required: false,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// Unset or empty keys take their defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let concurrency: usize = parse(&get, "WEB_CONCURRENCY", defaults.workers.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "WEB_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let max_upload_mb: u64 = parse(
            &get,
            "MAX_UPLOAD_MB",
            defaults.documents.max_upload_bytes / (1024 * 1024),
        )?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::Invalid {
                key: "MAX_UPLOAD_MB",
                value: max_upload_mb.to_string(),
                reason: "too large".to_string(),
            })?;

        let providers = match get("OCR_PROVIDERS") {
            Some(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    s.parse::<OcrProvider>().map_err(|e| ConfigError::Invalid {
                        key: "OCR_PROVIDERS",
                        value: raw.clone(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.ocr.providers,
        };

        Ok(Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or(defaults.server.host),
                port: parse(&get, "PORT", defaults.server.port)?,
            },
            workers: WorkerConfig {
                concurrency,
                max_queue: parse(&get, "EXTRACT_MAX_QUEUE", defaults.workers.max_queue)?,
                queue_timeout: Duration::from_secs(parse(
                    &get,
                    "EXTRACT_QUEUE_TIMEOUT_SECS",
                    defaults.workers.queue_timeout.as_secs(),
                )?),
            },
            documents: DocumentConfig {
                max_upload_bytes,
                allow_local_files: parse_bool(
                    &get,
                    "ALLOW_LOCAL_FILES",
                    defaults.documents.allow_local_files,
                )?,
                download_timeout: Duration::from_secs(parse(
                    &get,
                    "DOWNLOAD_TIMEOUT_SECS",
                    defaults.documents.download_timeout.as_secs(),
                )?),
            },
            ocr: OcrConfig {
                enabled: parse_bool(&get, "OCR_ENABLED", defaults.ocr.enabled)?,
                providers,
                language: get("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                dpi: parse(&get, "OCR_DPI", defaults.ocr.dpi)?,
                min_text_chars: parse(&get, "OCR_MIN_TEXT_CHARS", defaults.ocr.min_text_chars)?,
                tesseract_psm: parse(&get, "TESSERACT_PSM", defaults.ocr.tesseract_psm)?,
                ollama_url: get("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                required: parse_bool(&get, "REQUIRE_OCR", defaults.ocr.required)?,
            },
        })
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            max_bytes: self.documents.max_upload_bytes,
            allow_local_files: self.documents.allow_local_files,
            download_timeout: self.documents.download_timeout,
            ..Default::default()
        }
    }

    pub fn ocr_service_config(&self) -> OcrServiceConfig {
        OcrServiceConfig {
            enabled: self.ocr.enabled,
            providers: self.ocr.providers.clone(),
            default_language: self.ocr.language.clone(),
            tesseract_psm: self.ocr.tesseract_psm,
            ollama_url: self.ocr.ollama_url.clone(),
            ollama_model: self.ocr.ollama_model.clone(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ocr_dpi: self.ocr.dpi,
            ocr_min_text_chars: self.ocr.min_text_chars,
            ocr_language: Some(self.ocr.language.clone()),
            ..Default::default()
        }
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected true or false".to_string(),
            }),
        },
        None => Ok(default),
    }
}
