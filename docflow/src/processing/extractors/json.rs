use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{decode_utf8, read_bytes, Extractor};
use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

/// Whole document re-serialized compactly as one unit.
pub struct JsonExtractor;

#[async_trait]
impl Extractor for JsonExtractor {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn extract(&self, path: &Path, _cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let text = decode_utf8(bytes, path)?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| DocflowError::Parse(format!("Invalid JSON in {}: {e}", path.display())))?;
        let content = serde_json::to_string(&value)?;

        Ok(vec![ContentUnit::new(content, path).with_meta("seq_num", 1)])
    }
}
