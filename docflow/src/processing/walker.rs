use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DocflowError, Result};
use crate::models::SourceFile;

use super::ExtractorRegistry;

/// Files found under a root, split by whether their extension resolves.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub supported: Vec<SourceFile>,
    pub skipped: Vec<PathBuf>,
}

impl DirectoryScan {
    pub fn total(&self) -> usize {
        self.supported.len() + self.skipped.len()
    }
}

/// Recursive walk in file-name order. Only files are classified.
///
/// Failing to read the root itself is fatal; anything unreadable deeper in
/// the tree is logged and left out.
pub fn scan_directory(root: &Path, registry: &ExtractorRegistry) -> Result<DirectoryScan> {
    let metadata = std::fs::metadata(root)
        .map_err(|e| DocflowError::Enumeration(format!("{}: {e}", root.display())))?;
    if !metadata.is_dir() {
        return Err(DocflowError::Enumeration(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut scan = DirectoryScan::default();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(DocflowError::Enumeration(format!("{}: {e}", root.display())));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        match registry.resolve_path(&path) {
            Some((format, _)) => {
                let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                scan.supported.push(SourceFile::new(path, format, size));
            }
            None => scan.skipped.push(path),
        }
    }

    tracing::debug!(
        root = %root.display(),
        supported = scan.supported.len(),
        skipped = scan.skipped.len(),
        "Enumerated input"
    );
    Ok(scan)
}
