//! Page rasterization
//!
//! Renders pages to PNG for OCR input and first-page previews.

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage};
use mupdf::{Colorspace, Matrix, Page};

use crate::document::{DocumentError, DocumentResult};

/// PDF user space is 72 points per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Upper bound on rendered pixels (~48 MP, about A3 at 400 DPI)
const MAX_PIXELS: f32 = 48_000_000.0;

/// Scale factor for a DPI, limited so huge pages do not blow the memory budget
pub fn scale_for_dpi(dpi: u32, page_width: f32, page_height: f32) -> f32 {
    let scale = (dpi as f32 / POINTS_PER_INCH).clamp(0.5, 8.0);
    let pixels = page_width * page_height * scale * scale;
    if pixels > MAX_PIXELS && pixels > 0.0 {
        scale * (MAX_PIXELS / pixels).sqrt()
    } else {
        scale
    }
}

/// Render a page at the given DPI and encode as PNG
pub fn render_page_png(page: &Page, dpi: u32) -> DocumentResult<Vec<u8>> {
    let bounds = page.bounds()?;
    let scale = scale_for_dpi(dpi, bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);

    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    let img = pixmap_to_image(&pixmap)?;
    encode_png(&img)
}

/// Oversampling factor for previews, downsampled afterwards
const PREVIEW_OVERSAMPLE: f32 = 2.0;

/// Render scale for a preview of a page
///
/// At most 2x, and small enough that the pixmap fits within twice the
/// preview box whatever the page size.
pub fn preview_scale(page_width: f32, page_height: f32, max_width: u32, max_height: u32) -> f32 {
    let mut scale = PREVIEW_OVERSAMPLE;
    if page_width > 0.0 {
        scale = scale.min(PREVIEW_OVERSAMPLE * max_width as f32 / page_width);
    }
    if page_height > 0.0 {
        scale = scale.min(PREVIEW_OVERSAMPLE * max_height as f32 / page_height);
    }
    scale
}

/// Render a preview scaled to fit within `max_width` x `max_height`
pub fn render_preview_png(
    page: &Page,
    max_width: u32,
    max_height: u32,
) -> DocumentResult<Vec<u8>> {
    let bounds = page.bounds()?;
    let scale = preview_scale(
        bounds.x1 - bounds.x0,
        bounds.y1 - bounds.y0,
        max_width,
        max_height,
    );
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, false)?;

    let img = pixmap_to_image(&pixmap)?;
    let thumb = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    encode_png(&thumb)
}

fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> DocumentResult<DynamicImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgba_buffer = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            rgba_buffer.extend_from_slice(&[r, g, b, a]);
        }
    }

    let img = image::RgbaImage::from_raw(width, height, rgba_buffer)
        .ok_or_else(|| DocumentError::ImageError("Failed to create image buffer".to_string()))?;

    Ok(DynamicImage::ImageRgba8(img))
}

fn encode_png(img: &DynamicImage) -> DocumentResult<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| DocumentError::ImageError(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mupdf::PROBE_PDF;

    #[test]
    fn test_scale_for_dpi() {
        assert!((scale_for_dpi(72, 612.0, 792.0) - 1.0).abs() < f32::EPSILON);
        assert!((scale_for_dpi(300, 612.0, 792.0) - 300.0 / 72.0).abs() < 1e-4);
    }

    #[test]
    fn test_scale_for_dpi_caps_pixels() {
        // A0 poster at 600 DPI would be ~140 MP
        let scale = scale_for_dpi(600, 2384.0, 3370.0);
        let pixels = 2384.0 * 3370.0 * scale * scale;
        assert!(pixels <= MAX_PIXELS * 1.001);
    }

    #[test]
    fn test_preview_scale() {
        // Letter page: limited by the 400pt box height
        let scale = preview_scale(612.0, 792.0, 300, 400);
        assert!((scale - 800.0 / 792.0).abs() < 1e-4);

        // Small page keeps the 2x oversample
        assert!((preview_scale(100.0, 100.0, 300, 400) - 2.0).abs() < f32::EPSILON);

        // Largest MuPDF page stays within twice the box
        let scale = preview_scale(14400.0, 14400.0, 300, 400);
        assert!(14400.0 * scale <= 600.5);
        assert!(14400.0 * scale <= 800.5);
    }

    #[test]
    fn test_render_preview_of_huge_page() {
        let source = std::str::from_utf8(PROBE_PDF).unwrap();
        let huge = source.replace(
            "/MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>",
            "/MediaBox [0 0 14400 14400] /Contents 4 0 R/Resources<<>>>>",
        );
        // Same length keeps the xref offsets valid
        assert_eq!(huge.len(), source.len());

        let doc = mupdf::Document::from_bytes(huge.as_bytes(), "application/pdf").unwrap();
        let page = doc.load_page(0).unwrap();
        let bounds = page.bounds().unwrap();
        assert!((bounds.x1 - bounds.x0 - 14400.0).abs() < 0.5);

        let preview = render_preview_png(&page, 300, 400).unwrap();
        let img = image::load_from_memory(&preview).unwrap();
        assert_eq!(img.width(), 300);
        assert_eq!(img.height(), 300);
    }

    #[test]
    fn test_render_probe_page() {
        let doc = mupdf::Document::from_bytes(PROBE_PDF, "application/pdf").unwrap();
        let page = doc.load_page(0).unwrap();

        let png = render_page_png(&page, 72).unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        let preview = render_preview_png(&page, 300, 400).unwrap();
        let img = image::load_from_memory(&preview).unwrap();
        assert!(img.width() <= 300);
        assert!(img.height() <= 400);
    }
}
