use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::DocflowError;

/// Outcomes of files found inside archives, kept apart from the top-level
/// counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl MemberCounts {
    pub fn merge(&mut self, other: MemberCounts) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded == 0 && self.failed == 0 && self.skipped == 0
    }
}

/// Terminal state of one supported file.
#[derive(Debug)]
pub enum FileOutcome {
    Succeeded {
        record: PathBuf,
        units: usize,
        members: MemberCounts,
    },
    Failed {
        error: DocflowError,
        size: u64,
        members: MemberCounts,
    },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn members(&self) -> MemberCounts {
        match self {
            Self::Succeeded { members, .. } | Self::Failed { members, .. } => *members,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub supported: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub archive_members: MemberCounts,
}

impl RunSummary {
    pub fn discovered(supported: usize, skipped: usize) -> Self {
        Self {
            total: supported + skipped,
            supported,
            skipped,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.archive_members.merge(outcome.members());
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.succeeded + self.failed + self.skipped
            && self.supported == self.succeeded + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing complete")?;
        writeln!(f, "  total:     {}", self.total)?;
        writeln!(f, "  succeeded: {}", self.succeeded)?;
        writeln!(f, "  failed:    {}", self.failed)?;
        write!(f, "  skipped:   {}", self.skipped)?;
        if !self.archive_members.is_empty() {
            write!(
                f,
                "\n  archive members: {} succeeded, {} failed, {} skipped",
                self.archive_members.succeeded,
                self.archive_members.failed,
                self.archive_members.skipped
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_counters_reconcile() {
        let mut summary = RunSummary::discovered(3, 1);
        summary.record(&FileOutcome::Succeeded {
            record: PathBuf::from("out/txt/a.txt_20240101_000000.json"),
            units: 1,
            members: MemberCounts::default(),
        });
        summary.record(&FileOutcome::Succeeded {
            record: PathBuf::from("out/zip/d.zip_20240101_000000.json"),
            units: 2,
            members: MemberCounts {
                succeeded: 2,
                failed: 1,
                skipped: 4,
            },
        });
        summary.record(&FileOutcome::Failed {
            error: DocflowError::Timeout(Duration::from_secs(1)),
            size: 10,
            members: MemberCounts::default(),
        });

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.archive_members.skipped, 4);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_incomplete_run_is_inconsistent() {
        let summary = RunSummary::discovered(2, 0);
        assert!(!summary.is_consistent());
    }

    #[test]
    fn test_display_hides_empty_member_counts() {
        let summary = RunSummary::discovered(0, 2);
        let rendered = summary.to_string();
        assert!(rendered.contains("skipped:   2"));
        assert!(!rendered.contains("archive members"));
    }
}
