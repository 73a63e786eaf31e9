use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use encoding_rs::{Encoding, GBK, UTF_8, WINDOWS_1252};
use regex::bytes::Regex;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;

use super::{read_bytes, run_blocking, Extractor};
use crate::error::{DocflowError, Result};
use crate::models::ContentUnit;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Strips markup and returns the page text with `title`, `language` and
/// the encoding that decoded it.
pub struct HtmlExtractor;

#[async_trait]
impl Extractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn extract(&self, path: &Path, _cancel: CancellationToken) -> Result<Vec<ContentUnit>> {
        let bytes = read_bytes(path).await?;
        let source = path.to_path_buf();
        run_blocking(move || {
            let (markup, encoding) = decode_markup(&bytes)?;
            Ok(vec![parse_markup(&markup, &source, encoding)?])
        })
        .await
    }
}

fn charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?\s*([A-Za-z0-9_:.\-]+)"#)
            .expect("Invalid charset pattern")
    })
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(4096)];
    let label = charset_pattern().captures(head)?.get(1)?.as_bytes();
    Encoding::for_label(label)
}

/// Tries strict UTF-8, then the declared charset, GBK and finally
/// windows-1252, which maps every byte and therefore always succeeds.
/// A single-byte declaration never shadows a body that is valid UTF-8.
pub fn decode_markup(bytes: &[u8]) -> Result<(String, &'static str)> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut candidates: Vec<&'static Encoding> = vec![UTF_8];
    for candidate in declared_encoding(bytes).into_iter().chain([GBK, WINDOWS_1252]) {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    for encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            tracing::debug!(encoding = encoding.name(), "Decoded markup");
            return Ok((text.into_owned(), encoding.name()));
        }
        tracing::debug!(encoding = encoding.name(), "Markup not decodable, trying next encoding");
    }

    Err(DocflowError::Decode(
        "No candidate encoding could decode the markup".to_string(),
    ))
}

fn parse_markup(markup: &str, source: &Path, encoding: &str) -> Result<ContentUnit> {
    let document = Html::parse_document(markup);

    let title = extract_title(&document)?;
    let language = document
        .root_element()
        .value()
        .attr("lang")
        .map(|l| l.trim().to_string())
        .unwrap_or_default();
    let text = extract_text(&document);

    Ok(ContentUnit::new(text, source)
        .with_meta("title", title)
        .with_meta("language", language)
        .with_meta("encoding", encoding))
}

fn extract_title(document: &Html) -> Result<String> {
    let title_selector = Selector::parse("title")
        .map_err(|e| DocflowError::Parse(format!("Invalid selector: {e}")))?;
    Ok(document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default())
}

fn extract_text(document: &Html) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(text_node) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let content = text_node.trim();
        if !content.is_empty() {
            lines.push(content);
        }
    }

    lines.join("\n")
}
