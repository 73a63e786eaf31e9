use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{DocflowError, Result};
use crate::models::{OutputRecord, ProcessingResult, SupportedFormat};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Persists results as `output_dir/<format>/<file name>_<timestamp>.json`.
///
/// Records are only ever created, never reopened; a name that already
/// exists gets a `_1`, `_2`, ... suffix instead.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Best effort; `write` creates missing directories itself.
    pub async fn prepare(&self, formats: impl IntoIterator<Item = SupportedFormat>) {
        for format in formats {
            let dir = self.output_dir.join(format.as_str());
            if let Err(e) = tokio::fs::create_dir_all(&dir).await {
                tracing::warn!(dir = %dir.display(), error = %e, "Could not prepare output directory");
            }
        }
    }

    pub async fn write(&self, result: &ProcessingResult) -> Result<PathBuf> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let record = OutputRecord::from_result(result, timestamp.clone());
        let payload = serde_json::to_vec_pretty(&record)
            .map_err(|e| DocflowError::Write(format!("Failed to serialize record: {e}")))?;

        let dir = self.output_dir.join(result.format.as_str());
        let stem = format!("{}_{}", result.source.file_name(), timestamp);

        tokio::task::spawn_blocking(move || write_new_file(&dir, &stem, &payload))
            .await
            .map_err(|e| DocflowError::Write(format!("Write task failed: {e}")))?
    }
}

fn write_new_file(dir: &Path, stem: &str, payload: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| DocflowError::Write(format!("{}: {e}", dir.display())))?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{stem}.json")
        } else {
            format!("{stem}_{attempt}.json")
        };
        let path = dir.join(name);

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(DocflowError::Write(format!("{}: {e}", path.display()))),
        };

        if let Err(e) = file.write_all(payload).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(DocflowError::Write(format!("{}: {e}", path.display())));
        }
        return Ok(path);
    }

    Err(DocflowError::Write(format!(
        "No free record name for {stem} in {}",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{ContentUnit, SourceFile};

    fn result_for(path: &str, content: &str) -> ProcessingResult {
        let source = SourceFile::new(PathBuf::from(path), SupportedFormat::Txt, 5);
        let unit = ContentUnit::new(content, &source.path);
        ProcessingResult::new(source, vec![unit])
    }

    #[tokio::test]
    async fn test_writes_record_under_format_dir() {
        let out = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(out.path());

        let path = writer.write(&result_for("in/a.txt", "hello")).await.unwrap();

        assert_eq!(path.parent().unwrap(), out.path().join("txt"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("a.txt_"), "{name}");
        assert!(name.ends_with(".json"));

        let record: OutputRecord =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(record.original_file, "in/a.txt");
        assert_eq!(record.documents[0].content, "hello");
        assert_eq!(record.processed_time.len(), "20240101_120000".len());
    }

    #[test]
    fn test_existing_names_get_suffixes() {
        let out = tempfile::tempdir().unwrap();

        let first = write_new_file(out.path(), "a.txt_20240101_120000", b"{\"n\":1}").unwrap();
        let second = write_new_file(out.path(), "a.txt_20240101_120000", b"{\"n\":2}").unwrap();
        let third = write_new_file(out.path(), "a.txt_20240101_120000", b"{\"n\":3}").unwrap();

        assert_eq!(first.file_name().unwrap(), "a.txt_20240101_120000.json");
        assert_eq!(second.file_name().unwrap(), "a.txt_20240101_120000_1.json");
        assert_eq!(third.file_name().unwrap(), "a.txt_20240101_120000_2.json");
        assert_eq!(std::fs::read(&first).unwrap(), b"{\"n\":1}");
    }

    #[tokio::test]
    async fn test_prepare_creates_every_format_dir() {
        let out = tempfile::tempdir().unwrap();
        let writer = ResultWriter::new(out.path().join("nested"));

        writer.prepare(SupportedFormat::all().iter().copied()).await;

        for format in SupportedFormat::all() {
            assert!(out.path().join("nested").join(format.as_str()).is_dir());
        }
    }

    #[tokio::test]
    async fn test_unwritable_output_is_write_error() {
        let out = tempfile::tempdir().unwrap();
        let blocker = out.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let writer = ResultWriter::new(&blocker);
        let err = writer.write(&result_for("a.txt", "x")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Write);
    }
}
