//! Batch document ingestion.
//!
//! Walks an input tree, extracts every file whose extension is recognized
//! (archives are unpacked and their members processed the same way), and
//! writes one JSON record per result under `output_dir/<format>/`.

pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod processing;

pub use config::Config;
pub use error::{DocflowError, ErrorKind, Result};
pub use processing::{ExtractorRegistry, ProcessingPipeline, ResultWriter};
