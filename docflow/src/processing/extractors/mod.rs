use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

pub mod csv;
pub mod docx;
pub mod html;
pub mod image;
pub mod json;
pub mod pdf;
pub mod text;

pub use csv::CsvExtractor;
pub use docx::DocxExtractor;
pub use html::HtmlExtractor;
pub use image::ImageExtractor;
pub use json::JsonExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

/// Converts one file into zero or more content units.
///
/// Implementations must set `source` on every unit. The token is cancelled
/// when the surrounding deadline expires; long-running work should poll it.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, path: &Path, cancel: CancellationToken) -> Result<Vec<ContentUnit>>;
}

pub(crate) async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| DocflowError::Read(format!("{}: {e}", path.display())))
}

/// Run CPU-bound parsing off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DocflowError::Parse(format!("Extraction task failed: {e}")))?
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(DocflowError::Parse("Extraction cancelled".to_string()));
    }
    Ok(())
}

pub(crate) fn decode_utf8(bytes: Vec<u8>, path: &Path) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| DocflowError::Decode(format!("{} is not valid UTF-8: {e}", path.display())))
}
