//! Layout analysis over structured page text

use crate::mupdf::{PageText, TextLine};

use super::text::clean_text;
use super::types::{LayoutBlock, TableRegion};

/// Column gaps a line needs to count as a table row
const MIN_COLUMN_GAPS: usize = 2;
/// Consecutive table rows that make a table
const MIN_TABLE_ROWS: usize = 3;

/// Find table-like regions: runs of lines split into several columns
pub fn detect_tables(page: &PageText) -> Vec<TableRegion> {
    let mut tables = Vec::new();

    for block in &page.blocks {
        let mut run: Vec<&TextLine> = Vec::new();

        for line in &block.lines {
            if line.column_gaps >= MIN_COLUMN_GAPS {
                run.push(line);
            } else {
                flush_run(&mut run, &mut tables);
            }
        }
        flush_run(&mut run, &mut tables);
    }

    tables
}

fn flush_run(run: &mut Vec<&TextLine>, tables: &mut Vec<TableRegion>) {
    if run.len() >= MIN_TABLE_ROWS {
        let bbox = run
            .iter()
            .skip(1)
            .fold(run[0].bbox, |acc, line| acc.union(&line.bbox));
        let columns = run.iter().map(|l| l.column_gaps + 1).max().unwrap_or(0);

        tables.push(TableRegion {
            bbox,
            rows: run.len(),
            columns,
        });
    }
    run.clear();
}

/// Text blocks with their bounding boxes, empty blocks dropped
pub fn layout_blocks(page: &PageText) -> Vec<LayoutBlock> {
    page.blocks
        .iter()
        .filter_map(|block| {
            let raw: Vec<&str> = block.lines.iter().map(|l| l.text.as_str()).collect();
            let text = clean_text(&raw.join("\n"));
            if text.is_empty() {
                return None;
            }
            Some(LayoutBlock {
                bbox: block.bbox,
                line_count: block.lines.len(),
                text,
            })
        })
        .collect()
}
