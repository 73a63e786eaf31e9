use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{decode_utf8, read_bytes, run_blocking, Extractor};
use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

const OOXML_MAGIC: &[u8] = b"PK\x03\x04";

/// Word-processor documents. OOXML packages are parsed with docx-rs; any
/// other `.doc` payload is treated as plain UTF-8 text.
pub struct DocxExtractor;

#[async_trait]
impl Extractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    async fn extract(&self, path: &Path, _cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;

        if !bytes.starts_with(OOXML_MAGIC) {
            let text = decode_utf8(bytes, path)?;
            return Ok(vec![ContentUnit::new(text.trim(), path)]);
        }

        let source = path.to_path_buf();
        run_blocking(move || {
            let (text, title) = extract_document(&bytes)?;
            let mut unit = ContentUnit::new(text, &source);
            if let Some(title) = title {
                unit = unit.with_meta("title", title);
            }
            Ok(vec![unit])
        })
        .await
    }
}

/// Paragraph and table text joined by newlines, plus the first
/// `Title`/`Heading1` paragraph.
pub fn extract_document(bytes: &[u8]) -> Result<(String, Option<String>)> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| DocflowError::Parse(format!("DOCX parse error: {e}")))?;

    let mut blocks: Vec<String> = Vec::new();
    let mut title = None;

    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => {
                let para_text = paragraph_text(paragraph);
                if para_text.trim().is_empty() {
                    continue;
                }
                if title.is_none() {
                    if let Some(style) = &paragraph.property.style {
                        if style.val == "Heading1" || style.val == "Title" {
                            title = Some(para_text.trim().to_string());
                        }
                    }
                }
                blocks.push(para_text);
            }
            docx_rs::DocumentChild::Table(table) => {
                let table_text = table_text(table);
                if !table_text.is_empty() {
                    blocks.push(table_text);
                }
            }
            _ => {}
        }
    }

    Ok((blocks.join("\n"), title))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut content = String::new();
    for para_child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = para_child {
            for run_child in &run.children {
                if let docx_rs::RunChild::Text(text) = run_child {
                    content.push_str(&text.text);
                }
            }
        }
    }
    content
}

/// One line per row, cells separated by ` | `.
fn table_text(table: &docx_rs::Table) -> String {
    let mut lines: Vec<String> = Vec::new();

    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        let mut row_cells: Vec<String> = Vec::new();
        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            let mut cell_text = String::new();
            for cell_child in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(para) = cell_child {
                    let para_text = paragraph_text(para);
                    if !cell_text.is_empty() {
                        cell_text.push(' ');
                    }
                    cell_text.push_str(&para_text);
                }
            }
            row_cells.push(cell_text.trim().to_string());
        }
        if row_cells.iter().any(|c| !c.is_empty()) {
            lines.push(row_cells.join(" | "));
        }
    }

    lines.join("\n")
}
