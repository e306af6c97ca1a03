//! Core document types

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default name for documents received without one
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Default content type for PDF payloads
pub const PDF_MIME: &str = "application/pdf";

/// How far into the file a `%PDF-` header may appear.
/// Readers tolerate leading garbage (mail headers, BOMs) before the header.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
}

impl DocumentFormat {
    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 5 {
            return None;
        }

        let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
        if window.windows(5).any(|w| w == b"%PDF-") {
            return Some(Self::Pdf);
        }

        None
    }

    /// MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
        }
    }
}

/// A received document
///
/// Immutable once constructed. The bytes are shared so the blocking MuPDF
/// workers can hold them without copying.
#[derive(Debug, Clone)]
pub struct Document {
    id: String,
    filename: String,
    content_type: String,
    data: Arc<Vec<u8>>,
}

impl Document {
    /// Create a document from raw bytes
    ///
    /// The filename is reduced to its last path component; the id is the
    /// SHA-256 of the content.
    pub fn new(filename: Option<&str>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        let filename = sanitize_filename(filename);
        let content_type = content_type
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(PDF_MIME)
            .to_string();
        let id = hex::encode(Sha256::digest(&data));

        Self {
            id,
            filename,
            content_type,
            data: Arc::new(data),
        }
    }

    /// Content checksum (hex SHA-256)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Filename without a trailing `.pdf` extension
    pub fn stem(&self) -> &str {
        let name = self.filename.as_str();
        match name.len().checked_sub(4).and_then(|cut| name.get(cut..).map(|ext| (cut, ext))) {
            Some((cut, ext)) if cut > 0 && ext.eq_ignore_ascii_case(".pdf") => &name[..cut],
            _ => name,
        }
    }

    /// Detected format, if any
    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_magic_bytes(self.bytes())
    }
}

/// Keep only the final path component of a client-supplied filename
fn sanitize_filename(filename: Option<&str>) -> String {
    filename
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(DEFAULT_FILENAME)
        .to_string()
}

/// Rectangle in page coordinates (points, origin top-left)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_ltrb(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes_detection() {
        assert_eq!(
            DocumentFormat::from_magic_bytes(b"%PDF-1.7\n..."),
            Some(DocumentFormat::Pdf)
        );
        // Leading garbage before the header is tolerated
        assert_eq!(
            DocumentFormat::from_magic_bytes(b"\xEF\xBB\xBF%PDF-1.4\n"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(DocumentFormat::from_magic_bytes(b"PK\x03\x04zipdata"), None);
        assert_eq!(DocumentFormat::from_magic_bytes(b"%PD"), None);
    }

    #[test]
    fn test_header_beyond_window_rejected() {
        let mut data = vec![b' '; HEADER_SEARCH_WINDOW];
        data.extend_from_slice(b"%PDF-1.4");
        assert_eq!(DocumentFormat::from_magic_bytes(&data), None);
    }

    #[test]
    fn test_document_identity() {
        let doc = Document::new(Some("../../etc/report.PDF"), None, b"%PDF-1.4".to_vec());
        assert_eq!(doc.filename(), "report.PDF");
        assert_eq!(doc.stem(), "report");
        assert_eq!(doc.content_type(), PDF_MIME);
        assert_eq!(doc.size(), 8);
        assert_eq!(doc.id().len(), 64);

        let same = Document::new(Some("other.pdf"), None, b"%PDF-1.4".to_vec());
        assert_eq!(doc.id(), same.id());
    }

    #[test]
    fn test_default_filename() {
        let doc = Document::new(None, Some(""), Vec::new());
        assert_eq!(doc.filename(), DEFAULT_FILENAME);
        assert_eq!(doc.stem(), "document");

        let doc = Document::new(Some("C:\\Users\\me\\"), None, Vec::new());
        assert_eq!(doc.filename(), DEFAULT_FILENAME);
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(10.0, 10.0, 10.0, 10.0);
        let b = BoundingBox::new(15.0, 5.0, 20.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::from_ltrb(10.0, 5.0, 35.0, 20.0));
    }
}
