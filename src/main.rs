//! PDF Extraction Service
//!
//! Exit codes: 0 clean shutdown, 1 bind/serve failure, 2 invalid
//! configuration, 3 OCR required but unavailable.

use std::process::ExitCode;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_extraction_service::worker::WorkerPool;
use pdf_extraction_service::{app, AppState, Config};

const EXIT_SERVE_FAILURE: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;
const EXIT_OCR_UNAVAILABLE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_extraction_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
    };

    tracing::info!("Starting PDF extraction service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Workers: {} (queue {}, timeout {}s)",
        config.workers.concurrency,
        config.workers.max_queue,
        config.workers.queue_timeout.as_secs()
    );
    tracing::info!(
        "Max upload: {} MB, local files: {}",
        config.documents.max_upload_bytes / (1024 * 1024),
        config.documents.allow_local_files
    );
    tracing::info!(
        "OCR: enabled={}, providers={:?}, language={}, dpi={}",
        config.ocr.enabled,
        config.ocr.providers,
        config.ocr.language,
        config.ocr.dpi
    );

    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize application state: {}", e);
            return ExitCode::from(EXIT_SERVE_FAILURE);
        }
    };

    if !state.engine().is_available() {
        tracing::warn!("Extraction engine unavailable, serving in degraded mode");
    }

    if config.ocr.required && !state.engine().ocr().is_available() {
        tracing::error!("REQUIRE_OCR is set but no OCR provider is available");
        return ExitCode::from(EXIT_OCR_UNAVAILABLE);
    }

    if let Err(e) = serve(&config, state).await {
        tracing::error!("Server error: {:#}", e);
        return ExitCode::from(EXIT_SERVE_FAILURE);
    }

    tracing::info!("Server shutdown complete");
    ExitCode::SUCCESS
}

async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("PDF extraction service listening on {}", addr);

    let workers = state.workers().clone();

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal(workers))
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}

/// Graceful shutdown signal handler
///
/// Closes the worker pool once a signal arrives so queued requests are
/// turned away while in-flight extractions finish.
async fn shutdown_signal(workers: WorkerPool) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    workers.close();
}
