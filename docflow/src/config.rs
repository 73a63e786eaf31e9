use serde::Deserialize;
use std::env;
use std::time::Duration;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Blank values count as unset.
fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|val| !val.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Deadline applied to every single extraction call.
    pub extract_timeout_secs: u64,
    /// Archives nested deeper than this are not expanded.
    pub max_archive_depth: usize,
}

impl PipelineConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract_timeout_secs: 120,
            max_archive_depth: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        let pipeline_defaults = PipelineConfig::default();
        Self {
            pipeline: PipelineConfig {
                extract_timeout_secs: parse_env_or(
                    "EXTRACT_TIMEOUT_SECS",
                    pipeline_defaults.extract_timeout_secs,
                ),
                max_archive_depth: parse_env_or(
                    "MAX_ARCHIVE_DEPTH",
                    pipeline_defaults.max_archive_depth,
                ),
            },
            ocr: OcrConfig {
                model: env::var("OCR_MODEL")
                    .unwrap_or_else(|_| "dashscope/qwen-vl-ocr".to_string()),
                api_key: non_empty_env("OCR_API_KEY")
                    .or_else(|| non_empty_env("DASHSCOPE_API_KEY")),
                base_url: env::var("OCR_BASE_URL").ok(),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                max_retries: parse_env_or("OCR_MAX_RETRIES", 3),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known recognition providers exposing an OpenAI-compatible chat endpoint.
pub const KNOWN_OCR_PROVIDERS: &[&str] = &["dashscope", "openai", "mistral"];

/// Split an OCR model string into (provider, model).
///
/// Unprefixed or unknown prefixes are treated as DashScope models.
pub fn parse_ocr_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_OCR_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("dashscope", model)
}
