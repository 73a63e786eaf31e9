use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::SupportedFormat;

pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A file discovered during enumeration.
///
/// `path` is where the bytes live on disk; `logical_path` is what gets
/// reported. They differ only for archive members, whose bytes sit in a
/// scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub logical_path: PathBuf,
    pub format: SupportedFormat,
    pub size: u64,
}

impl SourceFile {
    pub fn new(path: PathBuf, format: SupportedFormat, size: u64) -> Self {
        Self {
            logical_path: path.clone(),
            path,
            format,
            size,
        }
    }

    pub fn with_logical_path(mut self, logical_path: PathBuf) -> Self {
        self.logical_path = logical_path;
        self
    }

    pub fn file_name(&self) -> String {
        self.logical_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("unnamed.{}", self.format))
    }

    pub fn display_path(&self) -> String {
        self.logical_path.to_string_lossy().into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub content: String,
    pub metadata: Metadata,
}

impl ContentUnit {
    pub fn new(content: impl Into<String>, source: &Path) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(
            "source".to_string(),
            serde_json::Value::String(source.to_string_lossy().into_owned()),
        );
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }

    pub fn set_source(&mut self, source: &str) {
        self.metadata.insert(
            "source".to_string(),
            serde_json::Value::String(source.to_string()),
        );
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub source: SourceFile,
    pub format: SupportedFormat,
    pub units: Vec<ContentUnit>,
}

impl ProcessingResult {
    pub fn new(source: SourceFile, units: Vec<ContentUnit>) -> Self {
        Self {
            format: source.format,
            source,
            units,
        }
    }
}

/// Persisted form of a [`ProcessingResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub original_file: String,
    pub processed_time: String,
    pub documents: Vec<ContentUnit>,
}

impl OutputRecord {
    pub fn from_result(result: &ProcessingResult, processed_time: String) -> Self {
        Self {
            original_file: result.source.display_path(),
            processed_time,
            documents: result.units.clone(),
        }
    }
}
