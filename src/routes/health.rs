//! Health check endpoints
//!
//! Reads only precomputed flags and pool counters, so it answers promptly
//! while every worker is busy.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ocr::OcrProvider;
use crate::state::AppState;
use crate::worker::PoolStats;
use crate::SERVICE_NAME;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `healthy` when the engine is usable, `degraded` otherwise
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Extraction engine passed its startup self-test
    pub docling_available: bool,
    pub ocr_available: bool,
    pub ocr_providers: Vec<OcrProvider>,
    pub workers: PoolStats,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine();
    let available = engine.is_available();

    Json(HealthResponse {
        status: if available { "healthy" } else { "degraded" },
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        docling_available: available,
        ocr_available: engine.ocr().is_available(),
        ocr_providers: engine.ocr().available_providers(),
        workers: state.workers().stats(),
        uptime_secs: state.uptime().as_secs(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Service identity and endpoint listing
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "GET /health",
            "GET /api/v1/health",
            "POST /upload",
            "POST /extract",
        ],
    })
}
