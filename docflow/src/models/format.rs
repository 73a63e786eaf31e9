use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Extension token recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedFormat {
    Txt,
    Csv,
    Pdf,
    Html,
    Htm,
    Json,
    Doc,
    Docx,
    Png,
    Jpg,
    Jpeg,
    Zip,
    #[serde(rename = "7z")]
    SevenZ,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    Text,
    Delimited,
    PageDocument,
    Markup,
    StructuredData,
    WordProcessor,
    Image,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    SevenZ,
}

const ALL_FORMATS: [SupportedFormat; 13] = [
    SupportedFormat::Txt,
    SupportedFormat::Csv,
    SupportedFormat::Pdf,
    SupportedFormat::Html,
    SupportedFormat::Htm,
    SupportedFormat::Json,
    SupportedFormat::Doc,
    SupportedFormat::Docx,
    SupportedFormat::Png,
    SupportedFormat::Jpg,
    SupportedFormat::Jpeg,
    SupportedFormat::Zip,
    SupportedFormat::SevenZ,
];

impl SupportedFormat {
    pub fn all() -> &'static [SupportedFormat] {
        &ALL_FORMATS
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            "html" => Some(Self::Html),
            "htm" => Some(Self::Htm),
            "json" => Some(Self::Json),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "zip" => Some(Self::Zip),
            "7z" => Some(Self::SevenZ),
            _ => None,
        }
    }

    /// Token taken from the text after the last `.` of the final path segment.
    ///
    /// Names without a dot (and dotfiles such as `.env`) carry no token.
    pub fn extension_token(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::extension_token(path).and_then(|ext| Self::from_extension(&ext))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Htm => "htm",
            Self::Json => "json",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Zip => "zip",
            Self::SevenZ => "7z",
        }
    }

    pub fn family(&self) -> FormatFamily {
        match self {
            Self::Txt => FormatFamily::Text,
            Self::Csv => FormatFamily::Delimited,
            Self::Pdf => FormatFamily::PageDocument,
            Self::Html | Self::Htm => FormatFamily::Markup,
            Self::Json => FormatFamily::StructuredData,
            Self::Doc | Self::Docx => FormatFamily::WordProcessor,
            Self::Png | Self::Jpg | Self::Jpeg => FormatFamily::Image,
            Self::Zip | Self::SevenZ => FormatFamily::Archive,
        }
    }

    pub fn archive_kind(&self) -> Option<ArchiveKind> {
        match self {
            Self::Zip => Some(ArchiveKind::Zip),
            Self::SevenZ => Some(ArchiveKind::SevenZ),
            _ => None,
        }
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::SevenZ => write!(f, "7z"),
        }
    }
}
