use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocflowError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Cannot enumerate input: {0}")]
    Enumeration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Classification used when a per-file failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    Read,
    Decode,
    Parse,
    RemoteService,
    Timeout,
    Write,
    Enumeration,
}

impl ErrorKind {
    /// Read and parse failures are reported together with the file size.
    pub fn reports_file_size(&self) -> bool {
        matches!(self, Self::Read | Self::Parse)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "UnsupportedFormat"),
            Self::Read => write!(f, "ReadError"),
            Self::Decode => write!(f, "DecodeError"),
            Self::Parse => write!(f, "ParseError"),
            Self::RemoteService => write!(f, "RemoteServiceError"),
            Self::Timeout => write!(f, "TimeoutError"),
            Self::Write => write!(f, "WriteError"),
            Self::Enumeration => write!(f, "EnumerationError"),
        }
    }
}

impl DocflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Read(_) | Self::Io(_) => ErrorKind::Read,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Parse(_) | Self::Json(_) => ErrorKind::Parse,
            Self::RemoteService(_) | Self::Http(_) => ErrorKind::RemoteService,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Write(_) => ErrorKind::Write,
            Self::Enumeration(_) => ErrorKind::Enumeration,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocflowError>;
