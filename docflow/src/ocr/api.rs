use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OcrConfig;
use crate::error::{DocflowError, Result};

const OCR_PROMPT: &str = "Extract all text from this image. Return only the extracted text without any explanations or formatting.";

/// Client for OpenAI-compatible chat-completion endpoints that accept image
/// content parts (DashScope compatible mode, OpenAI, Mistral).
#[derive(Clone, Debug)]
pub struct VisionOcrClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: serde_json::Value,
}

impl ChatMessageResponse {
    /// Content is either a plain string or a list of `{ "text": .. }` parts.
    fn into_text(self) -> String {
        match self.content {
            serde_json::Value::String(text) => text,
            serde_json::Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

pub fn default_base_url(provider: &str) -> &'static str {
    match provider {
        "openai" => "https://api.openai.com/v1",
        "mistral" => "https://api.mistral.ai/v1",
        _ => "https://dashscope.aliyuncs.com/compatible-mode/v1",
    }
}

impl VisionOcrClient {
    pub fn new(config: &OcrConfig, provider: &str, model: &str) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            DocflowError::RemoteService(format!("API key required for {provider} OCR"))
        })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DocflowError::RemoteService(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ocr(&self, image_bytes: &[u8], mime: &str) -> Result<String> {
        let base64_image = STANDARD.encode(image_bytes);
        let data_url = format!("data:{mime};base64,{base64_image}");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                    ContentPart::Text {
                        text: OCR_PROMPT.to_string(),
                    },
                ],
            }],
            max_tokens: 4096,
        };

        self.make_request(&request).await
    }

    async fn make_request(&self, request: &ChatRequest) -> Result<String> {
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    if resp.status().is_success() {
                        let chat_response: ChatResponse = resp.json().await.map_err(|e| {
                            DocflowError::RemoteService(format!("Failed to parse response: {e}"))
                        })?;

                        return chat_response
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.into_text().trim().to_string())
                            .ok_or_else(|| {
                                DocflowError::RemoteService("No response from API".to_string())
                            });
                    } else if resp.status().as_u16() == 429 || resp.status().is_server_error() {
                        if retries >= self.max_retries {
                            return Err(DocflowError::RemoteService(format!(
                                "API request failed after {} retries: {}",
                                retries,
                                resp.status()
                            )));
                        }
                        retries += 1;
                        tracing::warn!(
                            status = %resp.status(),
                            attempt = retries,
                            "OCR request throttled, retrying"
                        );
                        let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                        tokio::time::sleep(delay).await;
                        continue;
                    } else {
                        let status = resp.status();
                        let body = resp.text().await.unwrap_or_default();
                        return Err(DocflowError::RemoteService(format!(
                            "API request failed: {status} - {body}"
                        )));
                    }
                }
                Err(e) => {
                    if retries >= self.max_retries {
                        return Err(DocflowError::RemoteService(format!(
                            "API request failed after {retries} retries: {e}"
                        )));
                    }
                    retries += 1;
                    tracing::warn!(error = %e, attempt = retries, "OCR request failed, retrying");
                    let delay = Duration::from_millis(100 * (2_u64.pow(retries)));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
