//! Error types for the PDF extraction service

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::extract::ExtractionError;
use crate::worker::WorkerError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request body too large: {0}")]
    RequestTooLarge(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Server busy: {source}")]
    Busy {
        source: WorkerError,
        retry_after_secs: u64,
    },
}

impl AppError {
    pub fn busy(source: WorkerError, retry_after_secs: u64) -> Self {
        Self::Busy {
            source,
            retry_after_secs,
        }
    }

    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::RequestTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "DOCUMENT_TOO_LARGE"),
            AppError::Document(e) | AppError::Extraction(ExtractionError::Document(e)) => {
                document_status(e)
            }
            AppError::Extraction(ExtractionError::EngineUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ENGINE_UNAVAILABLE")
            }
            AppError::Busy { .. } => (StatusCode::SERVICE_UNAVAILABLE, "SERVER_BUSY"),
        }
    }
}

fn document_status(err: &DocumentError) -> (StatusCode, &'static str) {
    match err {
        DocumentError::Empty | DocumentError::NotPdf(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_DOCUMENT")
        }
        DocumentError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "DOCUMENT_TOO_LARGE"),
        DocumentError::Corrupt(_) | DocumentError::NoPages => {
            (StatusCode::UNPROCESSABLE_ENTITY, "CORRUPT_DOCUMENT")
        }
        DocumentError::Encrypted => (StatusCode::UNPROCESSABLE_ENTITY, "ENCRYPTED_DOCUMENT"),
        DocumentError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DocumentError::LocalFileUploadRequired(_) => {
            (StatusCode::BAD_REQUEST, "LOCAL_FILE_UPLOAD_REQUIRED")
        }
        DocumentError::LocalFileAccessDenied(_) => {
            (StatusCode::BAD_REQUEST, "LOCAL_FILE_ACCESS_DENIED")
        }
        DocumentError::Download(_) => (StatusCode::BAD_REQUEST, "DOWNLOAD_FAILED"),
        DocumentError::ImageError(_)
        | DocumentError::ContextError(_)
        | DocumentError::TaskJoin(_)
        | DocumentError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let server_fault = match &self {
            AppError::Document(e) | AppError::Extraction(ExtractionError::Document(e)) => {
                !e.is_client_error()
            }
            AppError::BadRequest(_)
            | AppError::RequestTooLarge(_)
            | AppError::Extraction(_)
            | AppError::Busy { .. } => false,
        };

        let message = if server_fault {
            tracing::error!(code, "Request failed: {}", self);
            "An internal error occurred".to_string()
        } else {
            tracing::warn!(code, status = status.as_u16(), "Request rejected: {}", self);
            self.to_string()
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
            code,
            details: if cfg!(debug_assertions) {
                Some(format!("{:?}", self))
            } else {
                None
            },
        });

        let mut response = (status, body).into_response();

        if let AppError::Busy {
            retry_after_secs, ..
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
