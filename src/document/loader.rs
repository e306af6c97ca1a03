//! Document loader
//!
//! Receives uploaded bytes or fetches a document by location, performs the
//! cheap checks (size, header) and stages documents for extraction by
//! opening them with MuPDF.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use super::error::{DocumentError, DocumentResult};
use super::types::{Document, DocumentFormat};
use crate::mupdf::SafeDocument;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum document size in bytes
    pub max_bytes: u64,
    /// Whether plain server-local paths may be read
    pub allow_local_files: bool,
    /// Timeout for remote downloads
    pub download_timeout: Duration,
    /// User-Agent sent when downloading
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            allow_local_files: false,
            download_timeout: Duration::from_secs(30),
            user_agent: format!("pdf-extraction-service/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Where a requested document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// `http://` or `https://` URL
    Remote(String),
    /// `file://` URL from a client device
    ClientFile(String),
    /// Plain path on the server
    LocalPath(PathBuf),
}

impl SourceLocation {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(location.to_string())
        } else if lower.starts_with("file://") {
            Self::ClientFile(location.to_string())
        } else {
            Self::LocalPath(PathBuf::from(location))
        }
    }

    /// Filename implied by the location, if any
    pub fn filename_hint(&self) -> Option<String> {
        let raw = match self {
            Self::Remote(url) | Self::ClientFile(url) => url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').next())
                .map(|s| s.to_string()),
            Self::LocalPath(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        };
        raw.filter(|name| !name.is_empty())
    }
}

/// A document that MuPDF has opened and validated
#[derive(Clone)]
pub struct StagedDocument {
    pub document: Document,
    pub pdf: Arc<SafeDocument>,
}

impl StagedDocument {
    pub fn page_count(&self) -> usize {
        self.pdf.page_count()
    }
}

/// Document loader
#[derive(Clone)]
pub struct DocumentLoader {
    config: LoaderConfig,
    client: reqwest::Client,
}

impl DocumentLoader {
    pub fn new(config: LoaderConfig) -> DocumentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DocumentError::Download(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Accept uploaded bytes
    pub fn receive(
        &self,
        filename: Option<&str>,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> DocumentResult<Document> {
        let document = Document::new(filename, content_type, data);
        self.validate(&document)?;
        Ok(document)
    }

    /// Fetch a document by URL or path
    ///
    /// `filename` overrides the name derived from the location.
    pub async fn fetch(&self, location: &str, filename: Option<&str>) -> DocumentResult<Document> {
        let source = SourceLocation::parse(location);
        let name = filename
            .map(|s| s.to_string())
            .or_else(|| source.filename_hint());

        let (data, content_type) = match &source {
            SourceLocation::Remote(url) => self.download(url).await?,
            SourceLocation::ClientFile(url) => {
                return Err(DocumentError::LocalFileUploadRequired(url.clone()));
            }
            SourceLocation::LocalPath(path) => (self.read_local(path).await?, None),
        };

        let document = Document::new(name.as_deref(), content_type.as_deref(), data);
        self.validate(&document)?;
        Ok(document)
    }

    /// Cheap checks that do not need MuPDF
    pub fn validate(&self, document: &Document) -> DocumentResult<()> {
        if document.size() == 0 {
            return Err(DocumentError::Empty);
        }

        if document.size() > self.config.max_bytes {
            return Err(DocumentError::TooLarge {
                size: document.size(),
                max: self.config.max_bytes,
            });
        }

        if document.format() != Some(DocumentFormat::Pdf) {
            return Err(DocumentError::NotPdf(format!(
                "'{}' does not start with a PDF header",
                document.filename()
            )));
        }

        Ok(())
    }

    /// Open the document with MuPDF on a blocking thread
    pub async fn stage(&self, document: Document) -> DocumentResult<StagedDocument> {
        let data = Arc::clone(document.data());
        let id = document.id().to_string();

        let pdf = tokio::task::spawn_blocking(move || SafeDocument::from_bytes(data, id)).await??;

        tracing::debug!(
            document_id = %document.id(),
            filename = %document.filename(),
            pages = pdf.page_count(),
            "Document staged"
        );

        Ok(StagedDocument {
            document,
            pdf: Arc::new(pdf),
        })
    }

    async fn download(&self, url: &str) -> DocumentResult<(Vec<u8>, Option<String>)> {
        tracing::info!(url = %url, "Downloading document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocumentError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocumentError::Download(format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_lowercase());

        if let Some(ct) = &content_type {
            if !ct.contains("pdf") && !ct.starts_with("application/") {
                tracing::warn!(content_type = %ct, "Unexpected content type for document download");
            }
        }

        let max = self.config.max_bytes;
        if let Some(len) = response.content_length() {
            if len > max {
                return Err(DocumentError::TooLarge { size: len, max });
            }
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DocumentError::Download(e.to_string()))?;
            if data.len() as u64 + chunk.len() as u64 > max {
                return Err(DocumentError::TooLarge {
                    size: data.len() as u64 + chunk.len() as u64,
                    max,
                });
            }
            data.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = data.len(), "Download complete");
        Ok((data, content_type))
    }

    async fn read_local(&self, path: &Path) -> DocumentResult<Vec<u8>> {
        if !self.config.allow_local_files {
            return Err(DocumentError::LocalFileAccessDenied(path.display().to_string()));
        }

        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(DocumentError::NotFound(path.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.len() > self.config.max_bytes {
            return Err(DocumentError::TooLarge {
                size: metadata.len(),
                max: self.config.max_bytes,
            });
        }

        Ok(tokio::fs::read(path).await?)
    }
}
