use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ensure_active, read_bytes, run_blocking, Extractor};
use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

/// One unit per record, rendered as `header: value` lines.
pub struct CsvExtractor;

#[async_trait]
impl Extractor for CsvExtractor {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn extract(&self, path: &Path, cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let source = path.to_path_buf();
        run_blocking(move || parse_records(&bytes, &source, &cancel)).await
    }
}

fn parse_records(
    bytes: &[u8],
    source: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<ContentUnit>> {
    // Strip BOM if present
    let bytes = strip_bom(bytes);

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DocflowError::Parse("Empty CSV file".to_string()));
    }

    let delimiter = detect_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| classify(e, "headers"))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    if headers.is_empty() {
        return Err(DocflowError::Parse("CSV has no headers".to_string()));
    }

    let mut units = Vec::new();
    for (row, result) in reader.records().enumerate() {
        ensure_active(cancel)?;
        let record = result.map_err(|e| classify(e, "record"))?;
        let content = render_row(&headers, &record);
        units.push(ContentUnit::new(content, source).with_meta("row", row));
    }

    tracing::debug!(rows = units.len(), delimiter = ?(delimiter as char), "Parsed CSV");
    Ok(units)
}

fn classify(e: csv::Error, what: &str) -> DocflowError {
    match e.kind() {
        csv::ErrorKind::Utf8 { .. } => {
            DocflowError::Decode(format!("CSV {what} is not valid UTF-8: {e}"))
        }
        _ => DocflowError::Parse(format!("Failed to read CSV {what}: {e}")),
    }
}

fn render_row(headers: &[String], record: &csv::StringRecord) -> String {
    record
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let header = headers
                .get(i)
                .map(String::as_str)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("column_{}", i + 1));
            format!("{header}: {}", value.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip UTF-8 BOM if present
fn strip_bom(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 3 && bytes[0..3] == [0xEF, 0xBB, 0xBF] {
        &bytes[3..]
    } else {
        bytes
    }
}

/// Auto-detect delimiter by trying common delimiters and picking the one
/// that produces the most consistent number of columns
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let candidates = [b',', b';', b'\t'];
    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delimiter in &candidates {
        let score = evaluate_delimiter(bytes, delimiter);
        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

/// Higher is better
fn evaluate_delimiter(bytes: &[u8], delimiter: u8) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let mut column_counts: Vec<usize> = Vec::new();

    if let Ok(headers) = reader.headers() {
        column_counts.push(headers.len());
    }

    for (i, result) in reader.records().enumerate() {
        if i >= 5 {
            break;
        }
        if let Ok(record) = result {
            column_counts.push(record.len());
        }
    }

    if column_counts.is_empty() {
        return 0;
    }

    let first_count = column_counts[0];
    let consistent = column_counts.iter().all(|&c| c == first_count);
    let has_multiple_columns = first_count > 1;

    if consistent && has_multiple_columns {
        first_count * 10
    } else if has_multiple_columns {
        first_count
    } else {
        0
    }
}
