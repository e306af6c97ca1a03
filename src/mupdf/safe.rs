//! Thread-safe document wrapper for MuPDF
//!
//! MuPDF documents are not thread-safe. This wrapper:
//!
//! 1. Stores the document bytes behind an `Arc`
//! 2. Opens a fresh document for each operation
//! 3. Uses `parking_lot::Mutex` to serialize access
//!
//! This avoids holding long-lived `mupdf::Document` handles across
//! `spawn_blocking` boundaries; only the bytes cross threads.

use std::sync::Arc;

use mupdf::Document;
use parking_lot::Mutex;

use crate::document::{DocumentError, DocumentFormat, DocumentResult};

/// Thread-safe PDF handle
pub struct SafeDocument {
    /// Document bytes
    data: Arc<Vec<u8>>,
    /// Document identifier
    id: String,
    /// Cached page count
    page_count: usize,
    /// Mutex for serializing access
    lock: Mutex<()>,
}

impl SafeDocument {
    /// Open and validate a PDF from shared bytes
    ///
    /// Fails with `Corrupt` when MuPDF cannot read the structure, `Encrypted`
    /// when a password is required and `NoPages` for empty documents.
    pub fn from_bytes(data: Arc<Vec<u8>>, id: String) -> DocumentResult<Self> {
        let mime = DocumentFormat::Pdf.mime_type();
        let doc = Document::from_bytes(data.as_slice(), mime)
            .map_err(|e| DocumentError::Corrupt(e.to_string()))?;

        if doc.needs_password().unwrap_or(false) {
            return Err(DocumentError::Encrypted);
        }

        let page_count = doc
            .page_count()
            .map_err(|e| DocumentError::Corrupt(e.to_string()))?;
        if page_count <= 0 {
            return Err(DocumentError::NoPages);
        }

        Ok(Self {
            data,
            id,
            page_count: page_count as usize,
            lock: Mutex::new(()),
        })
    }

    /// Get the document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Execute a closure with access to a freshly opened document
    ///
    /// Access is serialized; the document is dropped when the closure returns.
    ///
    /// ```ignore
    /// let bounds = safe_doc.with_doc(|doc| {
    ///     let page = doc.load_page(0)?;
    ///     Ok(page.bounds()?)
    /// })?;
    /// ```
    pub fn with_doc<F, R>(&self, f: F) -> DocumentResult<R>
    where
        F: FnOnce(&Document) -> DocumentResult<R>,
    {
        let _guard = self.lock.lock();
        let doc = Document::from_bytes(self.data.as_slice(), DocumentFormat::Pdf.mime_type())?;
        f(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mupdf::PROBE_PDF;

    #[test]
    fn test_open_probe_document() {
        let doc = SafeDocument::from_bytes(Arc::new(PROBE_PDF.to_vec()), "probe".into()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.id(), "probe");
    }

    #[test]
    fn test_with_doc_reopens() {
        let doc = SafeDocument::from_bytes(Arc::new(PROBE_PDF.to_vec()), "probe".into()).unwrap();
        for _ in 0..3 {
            let count = doc.with_doc(|d| Ok(d.page_count()?)).unwrap();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = SafeDocument::from_bytes(Arc::new(b"not a pdf at all".to_vec()), "x".into());
        assert!(result.is_err());
    }
}
