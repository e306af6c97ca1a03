//! Application state management

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::document::{DocumentError, DocumentLoader};
use crate::extract::ExtractionEngine;
use crate::ocr::OcrService;
use crate::worker::WorkerPool;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize document loader: {0}")]
    Loader(#[from] DocumentError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    loader: DocumentLoader,
    engine: ExtractionEngine,
    workers: WorkerPool,
    started_at: Instant,
}

impl AppState {
    /// Create the application state
    ///
    /// Probes the configured OCR providers and runs the engine self-test.
    pub async fn new(config: Config) -> Result<Self, StateError> {
        let ocr = OcrService::initialize(config.ocr_service_config()).await;
        Self::with_ocr(config, ocr).await
    }

    /// Create the application state with an already built OCR service
    pub async fn with_ocr(config: Config, ocr: OcrService) -> Result<Self, StateError> {
        let engine = ExtractionEngine::new(config.engine_config(), Arc::new(ocr)).await;
        Self::with_engine(config, engine)
    }

    /// Create the application state around an existing engine
    pub fn with_engine(config: Config, engine: ExtractionEngine) -> Result<Self, StateError> {
        let loader = DocumentLoader::new(config.loader_config())?;
        let workers = WorkerPool::new(
            config.workers.concurrency,
            config.workers.max_queue,
            config.workers.queue_timeout,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                loader,
                engine,
                workers,
                started_at: Instant::now(),
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document loader
    pub fn loader(&self) -> &DocumentLoader {
        &self.inner.loader
    }

    /// Get the extraction engine
    pub fn engine(&self) -> &ExtractionEngine {
        &self.inner.engine
    }

    /// Get the worker pool
    pub fn workers(&self) -> &WorkerPool {
        &self.inner.workers
    }

    /// Time since the state was created
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
