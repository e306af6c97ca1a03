//! Structured Text Helpers
//!
//! Walks MuPDF's structured text for a page and produces the plain text
//! together with block/line geometry used for layout and table detection.

use mupdf::{Page, TextPageOptions};

use crate::document::{BoundingBox, Result};

/// A horizontal gap wider than this many font sizes separates columns
const COLUMN_GAP_EMS: f32 = 1.5;
/// Lower bound for the column gap, in points
const MIN_COLUMN_GAP: f32 = 8.0;

/// Text and geometry of a single page
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// Plain text, one line per text line, blank line between blocks
    pub text: String,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Text blocks in reading order
    pub blocks: Vec<TextBlock>,
}

/// Text block (paragraph, heading, table cell run)
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub bbox: BoundingBox,
    pub lines: Vec<TextLine>,
}

/// Text line
#[derive(Debug, Clone)]
pub struct TextLine {
    pub bbox: BoundingBox,
    pub text: String,
    /// Number of horizontal gaps wide enough to separate table columns
    pub column_gaps: usize,
}

/// Extract text and geometry from a page
pub fn extract_page_text(page: &Page) -> Result<PageText> {
    let text_page = page.to_text_page(TextPageOptions::empty())?;
    let bounds = page.bounds()?;

    let width = bounds.x1 - bounds.x0;
    let height = bounds.y1 - bounds.y0;

    let mut text = String::new();
    let mut blocks = Vec::new();

    for block in text_page.blocks() {
        let block_bounds = block.bounds();
        let bbox = BoundingBox::from_ltrb(
            block_bounds.x0,
            block_bounds.y0,
            block_bounds.x1,
            block_bounds.y1,
        );

        let mut lines = Vec::new();

        for line in block.lines() {
            let line_bounds = line.bounds();
            let line_bbox = BoundingBox::from_ltrb(
                line_bounds.x0,
                line_bounds.y0,
                line_bounds.x1,
                line_bounds.y1,
            );

            let mut line_text = String::new();
            let mut gaps = GapCounter::default();

            for ch in line.chars() {
                if let Some(c) = ch.char() {
                    line_text.push(c);
                    if c.is_whitespace() {
                        continue;
                    }

                    let quad = ch.quad();
                    let left = quad.ul.x.min(quad.ll.x);
                    let right = quad.ur.x.max(quad.lr.x);
                    gaps.push(left, right, ch.size());
                }
            }

            text.push_str(&line_text);
            text.push('\n');

            lines.push(TextLine {
                bbox: line_bbox,
                text: line_text,
                column_gaps: gaps.count,
            });
        }

        if lines.is_empty() {
            continue;
        }

        text.push('\n');
        blocks.push(TextBlock { bbox, lines });
    }

    Ok(PageText {
        text,
        width,
        height,
        blocks,
    })
}

/// Counts column-sized gaps between consecutive glyphs of a line
#[derive(Debug, Default)]
struct GapCounter {
    last_right: Option<f32>,
    count: usize,
}

impl GapCounter {
    fn push(&mut self, left: f32, right: f32, font_size: f32) {
        if let Some(prev) = self.last_right {
            let threshold = (font_size * COLUMN_GAP_EMS).max(MIN_COLUMN_GAP);
            if left - prev > threshold {
                self.count += 1;
            }
        }
        self.last_right = Some(right);
    }
}
