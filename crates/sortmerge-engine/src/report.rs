use std::path::PathBuf;

use sortmerge_types::SourceId;

use crate::error::DropReason;

/// Final state of one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    /// Read to the end and fully merged.
    Merged,
    /// Merged up to a read error that ended the input early.
    Truncated(String),
    /// Excluded from the output from some point on.
    Dropped(DropReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceReport {
    pub source: SourceId,
    pub path: PathBuf,
    /// Values from this source written to the output.
    pub emitted: u64,
    pub status: SourceStatus,
}

impl SourceReport {
    pub fn is_dropped(&self) -> bool {
        matches!(self.status, SourceStatus::Dropped(_))
    }
}

/// Outcome of a completed merge run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Values written to the output.
    pub emitted: u64,
    /// Values selected but lost to an output write error.
    pub write_errors: u64,
    /// One entry per input, in input order.
    pub sources: Vec<SourceReport>,
}

impl MergeReport {
    pub fn merged_count(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_dropped()).count()
    }

    pub fn dropped(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.is_dropped())
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped().count()
    }

    pub fn truncated(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Truncated(_)))
    }

    /// Mark a merged source as cut short by `error`. Dropped sources keep
    /// their drop reason.
    pub fn record_read_failure(&mut self, source: SourceId, error: impl Into<String>) {
        if let Some(entry) = self.sources.iter_mut().find(|s| s.source == source) {
            if entry.status == SourceStatus::Merged {
                entry.status = SourceStatus::Truncated(error.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize, status: SourceStatus) -> SourceReport {
        SourceReport {
            source: SourceId::new(i),
            path: format!("in{i}.txt").into(),
            emitted: 0,
            status,
        }
    }

    #[test]
    fn counts_merged_and_dropped() {
        let report = MergeReport {
            emitted: 3,
            write_errors: 0,
            sources: vec![
                entry(0, SourceStatus::Merged),
                entry(1, SourceStatus::Dropped(DropReason::OpenFailed("gone".into()))),
                entry(2, SourceStatus::Merged),
            ],
        };
        assert_eq!(report.merged_count(), 2);
        assert_eq!(report.dropped_count(), 1);
        assert_eq!(report.dropped().next().unwrap().source, SourceId::new(1));
    }

    #[test]
    fn read_failure_marks_only_merged_sources() {
        let mut report = MergeReport {
            emitted: 0,
            write_errors: 0,
            sources: vec![
                entry(0, SourceStatus::Merged),
                entry(1, SourceStatus::Dropped(DropReason::InvalidValue { line: "x".into() })),
            ],
        };
        report.record_read_failure(SourceId::new(0), "Is a directory");
        report.record_read_failure(SourceId::new(1), "Is a directory");

        assert_eq!(
            report.sources[0].status,
            SourceStatus::Truncated("Is a directory".into())
        );
        assert!(report.sources[1].is_dropped());
        assert_eq!(report.truncated().count(), 1);
        assert_eq!(report.merged_count(), 1);
    }
}
