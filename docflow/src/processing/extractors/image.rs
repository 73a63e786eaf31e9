use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{read_bytes, Extractor};
use crate::error::Result;
use crate::models::ContentUnit;
use crate::ocr::TextRecognizer;

/// Sends the image to a recognizer and returns the recognized text as one
/// unit tagged with the recognizer's name.
pub struct ImageExtractor {
    recognizer: Arc<dyn TextRecognizer>,
}

impl ImageExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

#[async_trait]
impl Extractor for ImageExtractor {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn extract(&self, path: &Path, _cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let text = self.recognizer.recognize(&bytes, mime.essence_str()).await?;

        Ok(vec![
            ContentUnit::new(text, path).with_meta("processor", self.recognizer.name())
        ])
    }
}
