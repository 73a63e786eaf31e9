//! Optical character recognition through a remote vision model.
//!
//! The image extractor only depends on the [`TextRecognizer`] capability;
//! [`OcrProvider`] is the production implementation, talking to any
//! OpenAI-compatible chat-completion endpoint selected by `OCR_MODEL`
//! (`dashscope/qwen-vl-ocr` by default).
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! let text = ocr.recognize(&image_bytes, "image/png").await?;
//! ```

use async_trait::async_trait;

use crate::error::Result;

mod api;
mod provider;

pub use api::default_base_url;
pub use provider::OcrProvider;

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recorded as the `processor` metadata of recognized units.
    fn name(&self) -> &str;

    async fn recognize(&self, image: &[u8], mime: &str) -> Result<String>;
}
