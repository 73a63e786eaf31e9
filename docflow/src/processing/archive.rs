use std::fs::File;
use std::path::{Component, Path};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{DocflowError, Result};
use crate::models::{ArchiveKind, FileOutcome, MemberCounts, ProcessingResult, SourceFile};

use super::extractors::{ensure_active, run_blocking};
use super::pipeline::{log_failure, ProcessingPipeline, Processed};
use super::progress::{PipelineEvent, ProgressReporter};
use super::walker::DirectoryScan;

impl ProcessingPipeline {
    /// Unpacks `source` into a scratch directory and sends every member back
    /// through dispatch. Members get their own records; the returned result
    /// aggregates their units under the archive.
    pub(super) async fn expand_archive(
        &self,
        source: &SourceFile,
        kind: ArchiveKind,
        depth: usize,
        reporter: &dyn ProgressReporter,
        members: &mut MemberCounts,
    ) -> Result<ProcessingResult> {
        if depth >= self.max_archive_depth {
            return Err(DocflowError::Parse(format!(
                "Archive nesting exceeds maximum depth of {}",
                self.max_archive_depth
            )));
        }

        let scratch = self.scratch_dir()?;
        let archive_path = source.path.clone();
        // The blocking task owns the scratch dir until unpacking ends, so a
        // timed-out unpack still removes it once the task notices.
        let scratch = self
            .guard
            .run(|cancel| {
                run_blocking(move || {
                    unpack(kind, &archive_path, scratch.path(), &cancel)?;
                    Ok(scratch)
                })
            })
            .await?;

        let scan = self.scan_unpacked(scratch.path()).await?;
        members.skipped += scan.skipped.len();
        debug!(
            archive = %source.display_path(),
            supported = scan.supported.len(),
            skipped = scan.skipped.len(),
            "Unpacked archive"
        );

        let mut units = Vec::new();
        for member in scan.supported {
            let inner = member
                .path
                .strip_prefix(scratch.path())
                .unwrap_or(&member.path)
                .to_path_buf();
            let member = member.with_logical_path(source.logical_path.join(inner));

            let (result, nested) = self.process(&member, depth + 1, reporter).await;
            members.merge(nested);

            let outcome = match result {
                Ok(Processed { result, record }) => {
                    members.succeeded += 1;
                    let logical = member.display_path();
                    let count = result.units.len();
                    units.extend(result.units.into_iter().map(|mut unit| {
                        unit.metadata
                            .entry("archive_member".to_string())
                            .or_insert_with(|| serde_json::Value::String(logical.clone()));
                        unit
                    }));
                    FileOutcome::Succeeded {
                        record,
                        units: count,
                        members: nested,
                    }
                }
                Err(error) => {
                    members.failed += 1;
                    log_failure(&member, &error, reporter, "Archive member failed");
                    FileOutcome::Failed {
                        error,
                        size: member.size,
                        members: nested,
                    }
                }
            };
            reporter.report(&PipelineEvent::MemberFinished {
                file: &member,
                outcome: &outcome,
            });
        }

        drop(scratch);
        Ok(ProcessingResult::new(source.clone(), units))
    }

    /// Listing the scratch dir is a read of the archive, not input enumeration.
    async fn scan_unpacked(&self, dir: &Path) -> Result<DirectoryScan> {
        self.scan(dir).await.map_err(|e| {
            DocflowError::Read(format!("Cannot list unpacked archive members: {e}"))
        })
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docflow-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| DocflowError::Read(format!("Cannot create scratch directory: {e}")))
    }
}

fn unpack(kind: ArchiveKind, archive: &Path, dest: &Path, cancel: &CancellationToken) -> Result<()> {
    match kind {
        ArchiveKind::Zip => unpack_zip(archive, dest, cancel),
        ArchiveKind::SevenZ => unpack_7z(archive, dest, cancel),
    }
}

fn unpack_7z(archive: &Path, dest: &Path, cancel: &CancellationToken) -> Result<()> {
    let result =
        sevenz_rust::decompress_file_with_extract_fn(archive, dest, |entry, reader, target| {
            // Returning false stops the walk; the cancellation is reported below.
            if cancel.is_cancelled() {
                return Ok(false);
            }
            if !is_contained(Path::new(entry.name())) {
                warn!(entry = %entry.name(), "Skipping 7z entry outside the archive root");
                std::io::copy(reader, &mut std::io::sink())?;
                return Ok(true);
            }
            sevenz_rust::default_entry_extract_fn(entry, reader, target)
        });
    ensure_active(cancel)?;
    result.map_err(|e| DocflowError::Parse(format!("Failed to unpack 7z archive: {e}")))
}

fn unpack_zip(archive: &Path, dest: &Path, cancel: &CancellationToken) -> Result<()> {
    let file = File::open(archive)
        .map_err(|e| DocflowError::Read(format!("{}: {e}", archive.display())))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| DocflowError::Parse(format!("Failed to open zip archive: {e}")))?;

    for i in 0..zip.len() {
        ensure_active(cancel)?;

        let mut entry = zip
            .by_index(i)
            .map_err(|e| DocflowError::Parse(format!("Failed to read zip entry {i}: {e}")))?;

        let Some(relative) = entry.enclosed_name().filter(|p| is_contained(p)) else {
            warn!(entry = %entry.name(), "Skipping zip entry outside the archive root");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| DocflowError::Read(format!("{}: {e}", target.display())))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DocflowError::Read(format!("{}: {e}", parent.display())))?;
        }
        let mut out = File::create(&target)
            .map_err(|e| DocflowError::Read(format!("{}: {e}", target.display())))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| DocflowError::Parse(format!("Failed to extract {}: {e}", entry.name())))?;
    }

    Ok(())
}

fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
