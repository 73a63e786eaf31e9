use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{decode_utf8, read_bytes, Extractor};
use crate::error::Result;
use crate::models::ContentUnit;

/// Whole file as a single unit. Invalid UTF-8 is a decode failure, never
/// repaired.
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn extract(&self, path: &Path, _cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let text = decode_utf8(bytes, path)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        Ok(vec![ContentUnit::new(text, path)])
    }
}
