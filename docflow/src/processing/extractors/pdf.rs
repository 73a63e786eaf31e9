use std::path::Path;

use async_trait::async_trait;
use lopdf::Document;
use tokio_util::sync::CancellationToken;

use super::{ensure_active, read_bytes, run_blocking, Extractor};
use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

/// One unit per page, in page order.
pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn extract(&self, path: &Path, cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let source = path.to_path_buf();
        run_blocking(move || extract_pages(&bytes, &source, &cancel)).await
    }
}

fn extract_pages(
    bytes: &[u8],
    source: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<ContentUnit>> {
    let document = Document::load_mem(bytes)
        .map_err(|e| DocflowError::Parse(format!("Failed to parse PDF: {e}")))?;

    let pages = document.get_pages();
    let total_pages = pages.len();
    let mut units = Vec::with_capacity(total_pages);

    // get_pages is keyed by 1-based page number
    for (&page_number, _) in pages.iter() {
        ensure_active(cancel)?;

        let text = match document.extract_text(&[page_number]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::debug!(page = page_number, error = %e, "Page text not decodable");
                String::new()
            }
        };

        units.push(
            ContentUnit::new(text, source)
                .with_meta("page", page_number)
                .with_meta("total_pages", total_pages),
        );
    }

    tracing::debug!(pages = total_pages, "Extracted PDF");
    Ok(units)
}
