use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{parse_ocr_provider_model, OcrConfig};
use crate::error::{DocflowError, Result};

use super::api::VisionOcrClient;
use super::TextRecognizer;

enum OcrBackend {
    Api { client: VisionOcrClient },
    Unavailable { reason: String },
}

/// Remote recognition service selected by the `provider/model` string.
///
/// Construction never fails on a missing credential; the provider is left
/// unavailable and every call reports a remote-service error instead.
pub struct OcrProvider {
    backend: OcrBackend,
    model: String,
    timeout_secs: u64,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let (provider, model) = parse_ocr_provider_model(&config.model);
        let provider = provider.to_lowercase();

        let backend = match VisionOcrClient::new(config, &provider, model) {
            Ok(client) => {
                info!(
                    provider = %provider,
                    model = %client.model(),
                    "OCR API backend initialized"
                );
                OcrBackend::Api { client }
            }
            Err(e) => {
                let reason = format!("{provider} OCR backend unavailable: {e}");
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self {
            backend,
            model: model.to_string(),
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub async fn ocr(&self, image_bytes: &[u8], mime: &str) -> Result<String> {
        let timeout_duration = Duration::from_secs(self.timeout_secs);

        let result =
            tokio::time::timeout(timeout_duration, self.ocr_internal(image_bytes, mime)).await;

        match result {
            Ok(inner_result) => inner_result,
            Err(_) => Err(DocflowError::RemoteService(format!(
                "OCR operation timed out after {} seconds",
                self.timeout_secs
            ))),
        }
    }

    async fn ocr_internal(&self, image_bytes: &[u8], mime: &str) -> Result<String> {
        match &self.backend {
            OcrBackend::Api { client } => client.ocr(image_bytes, mime).await,
            OcrBackend::Unavailable { reason } => Err(DocflowError::RemoteService(reason.clone())),
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn recognize(&self, image: &[u8], mime: &str) -> Result<String> {
        self.ocr(image, mime).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn create_test_config() -> OcrConfig {
        OcrConfig {
            model: "dashscope/qwen-vl-ocr".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 60,
            max_retries: 3,
        }
    }

    #[test]
    fn test_missing_key_degrades_gracefully() {
        let provider = OcrProvider::new(&create_test_config());
        assert!(!provider.is_available());
        assert_eq!(provider.name(), "qwen-vl-ocr");
    }

    #[test]
    fn test_api_key_makes_provider_available() {
        let mut config = create_test_config();
        config.api_key = Some("test-key".to_string());
        config.model = "openai/gpt-4o".to_string();

        let provider = OcrProvider::new(&config);
        assert!(provider.is_available());
        assert_eq!(provider.name(), "gpt-4o");
    }

    #[tokio::test]
    async fn test_unavailable_returns_remote_service_error() {
        let provider = OcrProvider::new(&create_test_config());

        let err = provider.recognize(&[0x89, 0x50], "image/png").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteService);
        assert!(err.to_string().contains("unavailable"));
    }
}
