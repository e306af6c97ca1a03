//! Document error types
//!
//! Errors raised while receiving, fetching, validating and reading documents.

use thiserror::Error;

/// Document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Zero-byte upload or download
    #[error("Document is empty")]
    Empty,

    /// Document exceeds the configured size limit
    #[error("Document is {size} bytes, limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// Bytes do not carry a PDF header
    #[error("Not a PDF document: {0}")]
    NotPdf(String),

    /// PDF structure could not be read
    #[error("Corrupt document: {0}")]
    Corrupt(String),

    /// PDF requires a password
    #[error("Document is password protected")]
    Encrypted,

    /// PDF opened but contains no pages
    #[error("Document has no pages")]
    NoPages,

    /// Local file does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// `file://` URLs point at the client's filesystem, not ours
    #[error("Local file paths are not accessible from the server, upload the file instead: {0}")]
    LocalFileUploadRequired(String),

    /// Server-local paths are disabled by configuration
    #[error("Local file access is disabled: {0}")]
    LocalFileAccessDenied(String),

    /// Remote fetch failed
    #[error("Failed to download document: {0}")]
    Download(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    ImageError(String),

    /// MuPDF context error
    #[error("MuPDF context error: {0}")]
    ContextError(String),

    /// Blocking task was cancelled or panicked
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DocumentError {
    /// Whether the error is caused by the client's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Empty
                | Self::TooLarge { .. }
                | Self::NotPdf(_)
                | Self::Corrupt(_)
                | Self::Encrypted
                | Self::NoPages
                | Self::NotFound(_)
                | Self::LocalFileUploadRequired(_)
                | Self::LocalFileAccessDenied(_)
                | Self::Download(_)
        )
    }
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ContextError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for DocumentError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocumentError::TaskJoin(err.to_string())
    }
}
