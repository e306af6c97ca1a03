//! Low-level MuPDF Wrapper
//!
//! Safe, thread-aware access to the MuPDF library.
//!
//! # Thread Safety
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. Callers hold a
//! [`SafeDocument`], which keeps only the document bytes and opens a fresh
//! `mupdf::Document` per operation under a mutex. All MuPDF work is expected
//! to run inside `tokio::task::spawn_blocking`.
//!
//! # Usage
//!
//! ```rust,ignore
//! let doc = SafeDocument::from_bytes(bytes, "doc-123".into())?;
//!
//! let text = doc.with_doc(|d| {
//!     let page = d.load_page(0)?;
//!     stext::extract_page_text(&page)
//! })?;
//! ```

mod info;
mod render;
mod safe;
mod stext;

pub use info::{read_info, PdfInfo};
pub use render::{preview_scale, render_page_png, render_preview_png, scale_for_dpi};
pub use safe::SafeDocument;
pub use stext::{extract_page_text, PageText, TextBlock, TextLine};

/// Minimal one-page PDF used to verify that MuPDF is usable at startup
pub const PROBE_PDF: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>
endobj
4 0 obj
<< /Length 0 >>
stream
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000226 00000 n
trailer
<< /Size 5 /Root 1 0 R >>
startxref
276
%%EOF";
