use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use sortmerge_types::SourceId;

use crate::buffer::BoundedBuffer;
use crate::error::{EngineError, Result};
use crate::tracker::CompletionTracker;

/// How a feed stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Reached end of input.
    Exhausted,
    /// A read failed; everything before it was still delivered.
    ReadFailed(String),
    /// The merge closed the buffer, usually because the source was dropped.
    Abandoned,
}

/// Counters returned when a feed finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSummary {
    pub source: SourceId,
    pub lines_read: u64,
    pub values_pushed: u64,
    pub outcome: FeedOutcome,
}

/// Reports completion when dropped, so every exit path of [`SourceFeed::run`]
/// (including a panic) reaches the tracker.
struct CompletionGuard<'a> {
    source: SourceId,
    tracker: &'a CompletionTracker,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.tracker.on_complete(self.source);
    }
}

/// Producer side of one input: reads lines and pushes them into a
/// [`BoundedBuffer`].
///
/// Lines are decoded as UTF-8 with invalid sequences replaced by U+FFFD,
/// so a stray byte never ends the input early.
pub struct SourceFeed<R = BufReader<File>> {
    source: SourceId,
    path: PathBuf,
    reader: R,
}

impl SourceFeed {
    /// Open `path` for reading.
    pub fn open(source: SourceId, path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EngineError::SourceOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            source,
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }
}

impl<R: BufRead> SourceFeed<R> {
    /// Wrap an already open reader. `path` is only used for logging.
    pub fn from_reader(source: SourceId, path: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            source,
            path: path.into(),
            reader,
        }
    }

    /// Push every non-blank trimmed line into `buffer`, then report
    /// completion to `tracker` exactly once.
    ///
    /// Consumes the feed; the reader is closed when this returns.
    pub fn run(self, buffer: &BoundedBuffer, tracker: &CompletionTracker) -> FeedSummary {
        let _guard = CompletionGuard {
            source: self.source,
            tracker,
        };
        let Self {
            source,
            path,
            mut reader,
        } = self;

        let mut summary = FeedSummary {
            source,
            lines_read: 0,
            values_pushed: 0,
            outcome: FeedOutcome::Exhausted,
        };

        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(
                        %source, path = %path.display(), error = %e,
                        "read failed; treating as end of input"
                    );
                    summary.outcome = FeedOutcome::ReadFailed(e.to_string());
                    break;
                }
            }
            summary.lines_read += 1;

            let line = String::from_utf8_lossy(&raw);
            let value = line.trim();
            if value.is_empty() {
                continue;
            }
            if buffer.push(value.to_string()).is_err() {
                debug!(%source, "buffer closed; abandoning feed");
                summary.outcome = FeedOutcome::Abandoned;
                break;
            }
            summary.values_pushed += 1;
        }

        debug!(
            %source,
            lines = summary.lines_read,
            pushed = summary.values_pushed,
            outcome = ?summary.outcome,
            "feed finished"
        );
        summary
    }
}
