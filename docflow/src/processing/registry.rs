use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::models::{ArchiveKind, FormatFamily, SupportedFormat};
use crate::ocr::TextRecognizer;

use super::extractors::{
    CsvExtractor, DocxExtractor, Extractor, HtmlExtractor, ImageExtractor, JsonExtractor,
    PdfExtractor, TextExtractor,
};

/// What a recognized token dispatches to.
#[derive(Clone)]
pub enum Handler {
    Extract(Arc<dyn Extractor>),
    Archive(ArchiveKind),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract(extractor) => write!(f, "Extract({})", extractor.name()),
            Self::Archive(kind) => write!(f, "Archive({kind})"),
        }
    }
}

/// Maps every extension token to exactly one handler. Tokens without an
/// entry are unsupported and get skipped.
#[derive(Default)]
pub struct ExtractorRegistry {
    handlers: HashMap<SupportedFormat, Handler>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full format set, with images routed to `recognizer`.
    pub fn with_defaults(recognizer: Arc<dyn TextRecognizer>) -> Self {
        let text: Arc<dyn Extractor> = Arc::new(TextExtractor);
        let csv: Arc<dyn Extractor> = Arc::new(CsvExtractor);
        let pdf: Arc<dyn Extractor> = Arc::new(PdfExtractor);
        let html: Arc<dyn Extractor> = Arc::new(HtmlExtractor);
        let json: Arc<dyn Extractor> = Arc::new(JsonExtractor);
        let docx: Arc<dyn Extractor> = Arc::new(DocxExtractor);
        let image: Arc<dyn Extractor> = Arc::new(ImageExtractor::new(recognizer));

        let mut registry = Self::new();
        for format in SupportedFormat::all() {
            let extractor = match format.family() {
                FormatFamily::Text => &text,
                FormatFamily::Delimited => &csv,
                FormatFamily::PageDocument => &pdf,
                FormatFamily::Markup => &html,
                FormatFamily::StructuredData => &json,
                FormatFamily::WordProcessor => &docx,
                FormatFamily::Image => &image,
                FormatFamily::Archive => {
                    if let Some(kind) = format.archive_kind() {
                        registry.handlers.insert(*format, Handler::Archive(kind));
                    }
                    continue;
                }
            };
            registry.register(*format, Arc::clone(extractor));
        }
        registry
    }

    /// Replaces whatever handled `format` before.
    pub fn register(&mut self, format: SupportedFormat, extractor: Arc<dyn Extractor>) {
        self.handlers.insert(format, Handler::Extract(extractor));
    }

    pub fn resolve(&self, token: &str) -> Option<(SupportedFormat, Handler)> {
        let format = SupportedFormat::from_extension(token)?;
        self.handlers
            .get(&format)
            .map(|handler| (format, handler.clone()))
    }

    pub fn resolve_path(&self, path: &Path) -> Option<(SupportedFormat, Handler)> {
        let token = SupportedFormat::extension_token(path)?;
        self.resolve(&token)
    }

    pub fn formats(&self) -> impl Iterator<Item = SupportedFormat> + '_ {
        self.handlers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocflowError, Result};
    use async_trait::async_trait;

    struct NoRecognizer;

    #[async_trait]
    impl TextRecognizer for NoRecognizer {
        fn name(&self) -> &str {
            "none"
        }

        async fn recognize(&self, _image: &[u8], _mime: &str) -> Result<String> {
            Err(DocflowError::RemoteService("offline".to_string()))
        }
    }

    fn registry() -> ExtractorRegistry {
        ExtractorRegistry::with_defaults(Arc::new(NoRecognizer))
    }

    #[test]
    fn test_every_format_has_a_handler() {
        let registry = registry();
        for format in SupportedFormat::all() {
            assert!(
                registry.resolve(format.as_str()).is_some(),
                "{format} has no handler"
            );
        }
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let registry = registry();
        let (format, handler) = registry.resolve_path(Path::new("Scans/REPORT.PDF")).unwrap();
        assert_eq!(format, SupportedFormat::Pdf);
        assert!(matches!(handler, Handler::Extract(e) if e.name() == "pdf"));
    }

    #[test]
    fn test_archives_route_to_expander() {
        let registry = registry();
        let (_, handler) = registry.resolve("7z").unwrap();
        assert!(matches!(handler, Handler::Archive(ArchiveKind::SevenZ)));
    }

    #[test]
    fn test_unknown_and_extensionless_are_unsupported() {
        let registry = registry();
        assert!(registry.resolve("xyz").is_none());
        assert!(registry.resolve_path(Path::new("Makefile")).is_none());
        assert!(registry.resolve_path(Path::new("notes.txt.bak")).is_none());
    }

    #[test]
    fn test_empty_registry_dispatches_nothing() {
        let registry = ExtractorRegistry::new();
        assert!(registry.resolve("txt").is_none());
        assert_eq!(registry.formats().count(), 0);
    }
}
