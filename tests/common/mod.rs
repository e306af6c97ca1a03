//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pdf_extraction_service::config::Config;
use pdf_extraction_service::ocr::{
    OcrError, OcrProvider, OcrProviderTrait, OcrResult, OcrService,
};
use pdf_extraction_service::AppState;

/// Page content for generated PDFs
pub enum TestPage {
    /// Lines of Helvetica text
    Text(Vec<&'static str>),
    /// No content stream, stands in for a scanned page
    Blank,
}

/// Build a PDF with the given pages and optional info-dictionary title
pub fn build_pdf(pages: &[TestPage], title: Option<&str>) -> Vec<u8> {
    // 1 catalog, 2 pages, 3 font, 4 info, then page/content pairs
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + i * 2).collect();

    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" "),
        pages.len()
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    objects.push(match title {
        Some(t) => format!("<< /Title ({}) /Producer (integration tests) >>", escape(t)),
        None => "<< /Producer (integration tests) >>".to_string(),
    });

    for (page, page_id) in pages.iter().zip(&page_ids) {
        let content = match page {
            TestPage::Text(lines) => {
                let mut ops = String::from("BT\n/F1 14 Tf\n72 720 Td\n");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        ops.push_str("0 -20 Td\n");
                    }
                    ops.push_str(&format!("({}) Tj\n", escape(line)));
                }
                ops.push_str("ET\n");
                ops
            }
            TestPage::Blank => String::new(),
        };

        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    pdf.extend_from_slice(
        format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
    );
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 4 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );

    pdf
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// OCR provider returning canned text
pub struct MockOcr {
    pub text: &'static str,
    pub confidence: f64,
    pub delay: Duration,
    pub fail: bool,
}

impl MockOcr {
    pub fn returning(text: &'static str) -> Self {
        Self {
            text,
            confidence: 88.0,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning("")
        }
    }

    pub fn slow(text: &'static str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::returning(text)
        }
    }
}

#[async_trait]
impl OcrProviderTrait for MockOcr {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(
        &self,
        image_data: &[u8],
        _language: Option<&str>,
    ) -> Result<OcrResult, OcrError> {
        assert!(image_data.starts_with(b"\x89PNG"), "OCR input should be a PNG");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(OcrError::ProcessingError("mock failure".to_string()));
        }

        Ok(OcrResult {
            text: self.text.to_string(),
            confidence: self.confidence,
            provider: OcrProvider::Tesseract,
        })
    }
}

/// OCR service backed by a single mock provider
pub async fn mock_ocr(config: &Config, provider: MockOcr) -> OcrService {
    OcrService::from_providers(config.ocr_service_config(), vec![Arc::new(provider)]).await
}

/// Application state with a mock OCR provider
pub async fn test_state(config: Config, provider: MockOcr) -> AppState {
    let ocr = mock_ocr(&config, provider).await;
    AppState::with_ocr(config, ocr).await.unwrap()
}

/// Multipart body with a single file field plus extra text fields
pub fn multipart_body(
    boundary: &str,
    field: &str,
    filename: &str,
    data: &[u8],
    extra: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in extra {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
            boundary, field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
