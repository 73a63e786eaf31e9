use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, trace, warn};

use crate::config::PipelineConfig;
use crate::error::{DocflowError, Result};
use crate::models::{
    FileOutcome, MemberCounts, ProcessingResult, RunSummary, SourceFile, SupportedFormat,
};

use super::extractors::Extractor;
use super::progress::{PipelineEvent, ProgressReporter};
use super::walker::{scan_directory, DirectoryScan};
use super::{ExtractorRegistry, Handler, ResultWriter, TimeoutGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Enumerating,
    Processing,
    Summarizing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStage {
    Dispatching,
    Extracting,
    Writing,
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatching => write!(f, "dispatching"),
            Self::Extracting => write!(f, "extracting"),
            Self::Writing => write!(f, "writing"),
        }
    }
}

/// A result that made it to disk.
pub(super) struct Processed {
    pub(super) result: ProcessingResult,
    pub(super) record: PathBuf,
}

/// Walks an input tree one file at a time: resolve, extract under the
/// deadline, write. A file that fails is counted and the walk moves on.
pub struct ProcessingPipeline {
    pub(super) registry: Arc<ExtractorRegistry>,
    pub(super) writer: ResultWriter,
    pub(super) guard: TimeoutGuard,
    pub(super) max_archive_depth: usize,
    pub(super) scratch_root: Option<PathBuf>,
}

impl ProcessingPipeline {
    pub fn new(registry: ExtractorRegistry, writer: ResultWriter, config: &PipelineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            writer,
            guard: TimeoutGuard::new(config.extract_timeout()),
            max_archive_depth: config.max_archive_depth,
            scratch_root: None,
        }
    }

    pub fn with_timeout(mut self, deadline: Duration) -> Self {
        self.guard = TimeoutGuard::new(deadline);
        self
    }

    /// Directory under which archives are unpacked. Defaults to the system
    /// temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Only a failure to enumerate `input_dir` is returned as an error;
    /// per-file failures end up in the summary.
    pub async fn run(
        &self,
        input_dir: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let mut state = RunState::Idle;
        debug!(
            input = %input_dir.display(),
            output = %self.writer.output_dir().display(),
            deadline = ?self.guard.deadline(),
            max_archive_depth = self.max_archive_depth,
            "Starting run"
        );
        transition(&mut state, RunState::Enumerating);

        let scan = self.scan(input_dir).await?;
        let formats: Vec<SupportedFormat> = self.registry.formats().collect();
        self.writer.prepare(formats).await;

        let mut summary = RunSummary::discovered(scan.supported.len(), scan.skipped.len());
        reporter.report(&PipelineEvent::Discovered {
            supported: scan.supported.len(),
            skipped: &scan.skipped,
        });

        transition(&mut state, RunState::Processing);
        for file in &scan.supported {
            reporter.report(&PipelineEvent::FileStarted { file });
            let outcome = self.process_file(file, 0, reporter).await;
            summary.record(&outcome);
            reporter.report(&PipelineEvent::FileFinished {
                file,
                outcome: &outcome,
            });
        }

        transition(&mut state, RunState::Summarizing);
        if !summary.is_consistent() {
            warn!(?summary, "Run counters do not reconcile");
        }
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Run finished"
        );
        reporter.report(&PipelineEvent::Finished { summary: &summary });

        transition(&mut state, RunState::Done);
        Ok(summary)
    }

    pub(super) async fn scan(&self, root: &Path) -> Result<DirectoryScan> {
        let registry = Arc::clone(&self.registry);
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || scan_directory(&root, &registry))
            .await
            .map_err(|e| DocflowError::Enumeration(format!("Enumeration task failed: {e}")))?
    }

    /// Runs one file to a terminal outcome.
    pub async fn process_file(
        &self,
        source: &SourceFile,
        depth: usize,
        reporter: &dyn ProgressReporter,
    ) -> FileOutcome {
        let (result, members) = self.process(source, depth, reporter).await;
        match result {
            Ok(Processed { result, record }) => FileOutcome::Succeeded {
                record,
                units: result.units.len(),
                members,
            },
            Err(error) => {
                log_failure(source, &error, reporter, "File failed");
                FileOutcome::Failed {
                    error,
                    size: source.size,
                    members,
                }
            }
        }
    }

    /// Boxed so archive expansion can recurse back into it.
    pub(super) fn process<'a>(
        &'a self,
        source: &'a SourceFile,
        depth: usize,
        reporter: &'a dyn ProgressReporter,
    ) -> BoxFuture<'a, (Result<Processed>, MemberCounts)> {
        async move {
            let mut members = MemberCounts::default();
            let result = self
                .dispatch(source, depth, reporter, &mut members)
                .await;
            (result, members)
        }
        .boxed()
    }

    async fn dispatch(
        &self,
        source: &SourceFile,
        depth: usize,
        reporter: &dyn ProgressReporter,
        members: &mut MemberCounts,
    ) -> Result<Processed> {
        stage(source, FileStage::Dispatching);
        let (_, handler) = self
            .registry
            .resolve(source.format.as_str())
            .ok_or_else(|| DocflowError::UnsupportedFormat(source.format.to_string()))?;

        let mut result = match handler {
            Handler::Extract(extractor) => {
                stage(source, FileStage::Extracting);
                self.extract(extractor.as_ref(), source).await?
            }
            Handler::Archive(kind) => {
                self.expand_archive(source, kind, depth, reporter, members)
                    .await?
            }
        };

        let logical = source.display_path();
        for unit in &mut result.units {
            unit.set_source(&logical);
        }

        stage(source, FileStage::Writing);
        let record = self.writer.write(&result).await?;
        debug!(path = %logical, record = %record.display(), "Record written");

        Ok(Processed { result, record })
    }

    async fn extract(
        &self,
        extractor: &dyn Extractor,
        source: &SourceFile,
    ) -> Result<ProcessingResult> {
        let units = self
            .guard
            .run(|cancel| extractor.extract(&source.path, cancel))
            .await?;
        Ok(ProcessingResult::new(source.clone(), units))
    }
}

/// Logs a per-file failure with its kind, and its size for read/parse
/// failures.
pub(super) fn log_failure(
    source: &SourceFile,
    error: &DocflowError,
    reporter: &dyn ProgressReporter,
    message: &str,
) {
    let kind = error.kind();
    let path = source.display_path();
    let size_bytes = kind.reports_file_size().then_some(source.size);
    if reporter.renders_failures() {
        debug!(%path, %kind, ?size_bytes, error = %error, "{}", message);
    } else {
        warn!(%path, %kind, ?size_bytes, error = %error, "{}", message);
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug!(from = ?*state, to = ?next, "Pipeline state");
    *state = next;
}

fn stage(source: &SourceFile, stage: FileStage) {
    trace!(path = %source.display_path(), %stage, "File stage");
}
