use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::DocflowError;
use crate::models::{FileOutcome, RunSummary, SourceFile};

/// Emitted by the pipeline as it moves through a run.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Discovered {
        supported: usize,
        skipped: &'a [PathBuf],
    },
    FileStarted {
        file: &'a SourceFile,
    },
    FileFinished {
        file: &'a SourceFile,
        outcome: &'a FileOutcome,
    },
    /// A file inside an archive; not part of the top-level progress.
    MemberFinished {
        file: &'a SourceFile,
        outcome: &'a FileOutcome,
    },
    Finished {
        summary: &'a RunSummary,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &PipelineEvent<'_>);

    /// True when failures are printed by the reporter itself; the pipeline
    /// then logs them at debug instead of warn.
    fn renders_failures(&self) -> bool {
        false
    }
}

/// Path, error kind, message and, for read/parse failures, the size in KB.
pub fn failure_message(file: &SourceFile, error: &DocflowError, size: u64) -> String {
    let kind = error.kind();
    let mut message = format!("Failed: {} [{kind}] {error}", file.display_path());
    if kind.reports_file_size() {
        message.push_str(&format!(" (size: {:.2} KB)", size as f64 / 1024.0));
    }
    message
}

/// Terminal progress bar.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for BarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarReporter {
    fn report(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Discovered { supported, skipped } => {
                for path in skipped.iter() {
                    self.bar
                        .println(format!("Skipped (unsupported): {}", path.display()));
                }
                self.bar.set_length(*supported as u64);
            }
            PipelineEvent::FileStarted { file } => {
                self.bar.set_message(file.file_name());
            }
            PipelineEvent::FileFinished { file, outcome } => {
                if let FileOutcome::Failed { error, size, .. } = outcome {
                    self.bar.println(failure_message(file, error, *size));
                }
                self.bar.inc(1);
            }
            PipelineEvent::MemberFinished { file, outcome } => {
                if let FileOutcome::Failed { error, size, .. } = outcome {
                    self.bar.println(failure_message(file, error, *size));
                }
            }
            PipelineEvent::Finished { .. } => self.bar.finish_and_clear(),
        }
    }

    fn renders_failures(&self) -> bool {
        true
    }
}

/// Plain log lines, for non-interactive runs.
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Discovered { supported, skipped } => {
                for path in skipped.iter() {
                    tracing::info!(path = %path.display(), "Skipped (unsupported)");
                }
                tracing::info!(supported, skipped = skipped.len(), "Starting processing");
            }
            PipelineEvent::FileStarted { file } => {
                tracing::info!(path = %file.display_path(), "Processing");
            }
            PipelineEvent::FileFinished { file, outcome }
            | PipelineEvent::MemberFinished { file, outcome } => {
                if let FileOutcome::Succeeded { record, units, .. } = outcome {
                    tracing::info!(
                        path = %file.display_path(),
                        record = %record.display(),
                        units,
                        "Processed"
                    );
                }
            }
            PipelineEvent::Finished { .. } => {}
        }
    }
}

/// Discards every event.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _event: &PipelineEvent<'_>) {}
}
