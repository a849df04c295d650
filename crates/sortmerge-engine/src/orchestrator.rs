use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use sortmerge_types::{MergeConfig, SourceId};

use crate::buffer::BoundedBuffer;
use crate::engine::MergeEngine;
use crate::error::{DropReason, EngineError, Result};
use crate::feed::{FeedOutcome, SourceFeed};
use crate::report::MergeReport;
use crate::sink::OutputSink;
use crate::tracker::CompletionTracker;

/// Merge every input of `config` into its output file.
///
/// The output is created first; failing that, or opening none of the
/// inputs, aborts the run. Inputs that cannot be opened are skipped and
/// reported. Each opened input gets its own feed thread and the merge runs
/// on one more; all of them are joined before this returns.
pub fn run_merge(config: &MergeConfig) -> Result<MergeReport> {
    config.validate()?;

    let mut sink = OutputSink::create(&config.output)?;
    let tracker = Arc::new(CompletionTracker::new());
    let mut engine = MergeEngine::new(config, Arc::clone(&tracker));

    let mut feeds: Vec<(SourceFeed, Arc<BoundedBuffer>)> = Vec::with_capacity(config.inputs.len());
    for (index, path) in config.inputs.iter().enumerate() {
        let source = SourceId::new(index);
        match SourceFeed::open(source, path) {
            Ok(feed) => {
                let buffer = engine.add_source(source, path);
                feeds.push((feed, buffer));
            }
            Err(e) => {
                warn!(%source, path = %path.display(), error = %e, "skipping unreadable input");
                let cause = match e {
                    EngineError::SourceOpen { source: io_err, .. } => io_err.to_string(),
                    other => other.to_string(),
                };
                engine.record_skipped(source, path, DropReason::OpenFailed(cause));
            }
        }
    }

    if feeds.is_empty() {
        error!(attempted = config.inputs.len(), "no files that can be processed");
        return Err(EngineError::NoUsableSources {
            attempted: config.inputs.len(),
        });
    }

    info!(
        output = %config.output.display(),
        inputs = feeds.len(),
        mode = %config.mode,
        "starting merge"
    );

    let buffers: Vec<Arc<BoundedBuffer>> = feeds.iter().map(|(_, b)| Arc::clone(b)).collect();

    thread::scope(|scope| {
        let feed_handles: Vec<_> = feeds
            .into_iter()
            .map(|(feed, buffer)| {
                let tracker = &tracker;
                scope.spawn(move || feed.run(&buffer, tracker))
            })
            .collect();

        let merge = scope.spawn(move || {
            let report = engine.run(&mut sink);
            sink.close();
            report
        });
        let outcome = merge.join().map_err(|_| EngineError::MergePanicked);

        // Release any feed still blocked on a full buffer.
        for buffer in &buffers {
            buffer.close();
        }
        let mut read_failures = Vec::new();
        for handle in feed_handles {
            match handle.join() {
                Ok(summary) => {
                    debug!(
                        source = %summary.source,
                        pushed = summary.values_pushed,
                        outcome = ?summary.outcome,
                        "feed joined"
                    );
                    if let FeedOutcome::ReadFailed(cause) = summary.outcome {
                        read_failures.push((summary.source, cause));
                    }
                }
                Err(_) => error!("feed thread panicked"),
            }
        }
        debug!(completed = tracker.completed_count(), "all feeds joined");

        let mut report = outcome?;
        for (source, cause) in read_failures {
            report.record_read_failure(source, cause);
        }
        Ok(report)
    })
}
