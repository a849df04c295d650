use std::cmp::Ordering;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, trace};

use sortmerge_types::{MergeConfig, MergeMode, SortKey, SourceId};

use crate::buffer::BoundedBuffer;
use crate::error::DropReason;
use crate::report::{MergeReport, SourceReport, SourceStatus};
use crate::signal::Doorbell;
use crate::sink::OutputSink;
use crate::tracker::CompletionTracker;

/// One active input as seen by the merge.
struct Lane {
    source: SourceId,
    path: PathBuf,
    buffer: Arc<BoundedBuffer>,
    emitted: u64,
}

impl Lane {
    fn finish(self, status: SourceStatus) -> SourceReport {
        self.buffer.close();
        SourceReport {
            source: self.source,
            path: self.path,
            emitted: self.emitted,
            status,
        }
    }
}

/// Result of one iteration of the merge loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A value from this source was written.
    Emitted(SourceId),
    /// This source was removed as malformed; nothing was written.
    Dropped(SourceId),
    /// A live source has nothing buffered yet.
    Waiting,
    /// Every source is exhausted and drained.
    Finished,
}

enum Selection {
    Pending,
    Corrupt(usize, DropReason),
    Winner(usize),
}

/// Single consumer that interleaves all source buffers into one sorted
/// stream.
///
/// Each iteration retires drained sources, then picks the buffer whose
/// front value comes next under the run's [`MergeMode`], checks it, and
/// writes it. A source whose values fail to parse or whose buffered window
/// is out of order is dropped without stopping the run. The order check
/// only ever sees the values currently buffered, not the whole file.
pub struct MergeEngine {
    mode: MergeMode,
    capacity: usize,
    idle_wait: Duration,
    tracker: Arc<CompletionTracker>,
    doorbell: Arc<Doorbell>,
    active: Vec<Lane>,
    finished: Vec<SourceReport>,
    write_errors: u64,
}

impl MergeEngine {
    /// Create an engine and subscribe its wake-up signal to `tracker`.
    pub fn new(config: &MergeConfig, tracker: Arc<CompletionTracker>) -> Self {
        let doorbell = Arc::new(Doorbell::new());
        tracker.subscribe(doorbell.clone());
        Self {
            mode: config.mode,
            capacity: config.buffer_capacity,
            idle_wait: config.idle_wait(),
            tracker,
            doorbell,
            active: Vec::new(),
            finished: Vec::new(),
            write_errors: 0,
        }
    }

    /// Register a source and return the buffer its feed must fill.
    ///
    /// Sources are compared in registration order when fronts tie.
    pub fn add_source(
        &mut self,
        source: SourceId,
        path: impl Into<PathBuf>,
    ) -> Arc<BoundedBuffer> {
        let buffer = BoundedBuffer::new(self.capacity).with_doorbell(Arc::clone(&self.doorbell));
        let buffer = Arc::new(buffer);
        self.active.push(Lane {
            source,
            path: path.into(),
            buffer: Arc::clone(&buffer),
            emitted: 0,
        });
        buffer
    }

    /// Record a source that never made it into the active set.
    pub fn record_skipped(
        &mut self,
        source: SourceId,
        path: impl Into<PathBuf>,
        reason: DropReason,
    ) {
        self.finished.push(SourceReport {
            source,
            path: path.into(),
            emitted: 0,
            status: SourceStatus::Dropped(reason),
        });
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Run until every source is exhausted and drained.
    pub fn run<W: Write>(mut self, sink: &mut OutputSink<W>) -> MergeReport {
        info!(sources = self.active_count(), mode = %self.mode, "merge started");
        loop {
            match self.step(sink) {
                Step::Finished => break,
                Step::Waiting => {
                    self.doorbell.wait(self.idle_wait);
                }
                Step::Emitted(_) | Step::Dropped(_) => {}
            }
        }
        let report = self.into_report();
        info!(
            emitted = report.emitted,
            merged = report.merged_count(),
            dropped = report.dropped_count(),
            "merge finished"
        );
        report
    }

    /// One retire / terminate / select-and-emit iteration.
    pub fn step<W: Write>(&mut self, sink: &mut OutputSink<W>) -> Step {
        self.retire_drained();
        if self.active.is_empty() {
            return Step::Finished;
        }

        let winner = match self.select() {
            Selection::Pending => return Step::Waiting,
            Selection::Corrupt(index, reason) => return self.drop_lane(index, reason),
            Selection::Winner(index) => index,
        };
        if let Some(reason) = self.check_window(winner) {
            return self.drop_lane(winner, reason);
        }

        let lane = &mut self.active[winner];
        let Some(value) = lane.buffer.pop() else {
            return Step::Waiting;
        };
        match sink.emit(&value) {
            Ok(()) => {
                lane.emitted += 1;
                trace!(source = %lane.source, %value, "emitted");
            }
            Err(e) => {
                self.write_errors += 1;
                error!(
                    source = %lane.source, output = %sink.path().display(), error = %e,
                    "failed to write to output"
                );
            }
        }
        Step::Emitted(lane.source)
    }

    /// Remove every lane whose source is complete and whose buffer is empty.
    fn retire_drained(&mut self) {
        let mut i = 0;
        while i < self.active.len() {
            let lane = &self.active[i];
            // Completion is reported after the final push, so it must be
            // observed before emptiness.
            if self.tracker.is_complete(lane.source) && lane.buffer.is_empty() {
                let lane = self.active.remove(i);
                debug!(
                    source = %lane.source,
                    emitted = lane.emitted,
                    peak_buffered = lane.buffer.high_water(),
                    "source retired"
                );
                self.finished.push(lane.finish(SourceStatus::Merged));
            } else {
                i += 1;
            }
        }
    }

    fn select(&self) -> Selection {
        let mut fronts = Vec::with_capacity(self.active.len());
        for lane in &self.active {
            match lane.buffer.front() {
                Some(front) => fronts.push(front),
                None => return Selection::Pending,
            }
        }

        let mut best: Option<(usize, SortKey<'_>)> = None;
        for (index, front) in fronts.iter().enumerate() {
            let key = match self.mode.key(front) {
                Ok(key) => key,
                Err(_) => {
                    let reason = DropReason::InvalidValue { line: front.clone() };
                    return Selection::Corrupt(index, reason);
                }
            };
            let better = match &best {
                Some((_, current)) => self.mode.compare(&key, current) == Ordering::Less,
                None => true,
            };
            if better {
                best = Some((index, key));
            }
        }
        best.map_or(Selection::Pending, |(index, _)| Selection::Winner(index))
    }

    /// Compare the buffered front and back of one lane.
    fn check_window(&self, index: usize) -> Option<DropReason> {
        let (front, back) = self.active[index].buffer.window()?;
        let front_key = match self.mode.key(&front) {
            Ok(key) => key,
            Err(_) => return Some(DropReason::InvalidValue { line: front }),
        };
        let back_key = match self.mode.key(&back) {
            Ok(key) => key,
            Err(_) => return Some(DropReason::InvalidValue { line: back }),
        };
        if self.mode.is_out_of_order(&front_key, &back_key) {
            return Some(DropReason::OrderViolation { front, back });
        }
        None
    }

    fn drop_lane(&mut self, index: usize, reason: DropReason) -> Step {
        let lane = self.active.remove(index);
        let source = lane.source;
        match &reason {
            DropReason::InvalidValue { line } => error!(
                %source, path = %lane.path.display(), %line,
                "incorrect value format in input; file was removed"
            ),
            DropReason::OrderViolation { front, back } => error!(
                %source, path = %lane.path.display(), %front, %back,
                "wrong sort order in input; file was removed"
            ),
            DropReason::OpenFailed(_) => {}
        }
        self.finished.push(lane.finish(SourceStatus::Dropped(reason)));
        Step::Dropped(source)
    }

    fn into_report(mut self) -> MergeReport {
        for lane in std::mem::take(&mut self.active) {
            self.finished.push(lane.finish(SourceStatus::Merged));
        }
        self.finished.sort_by_key(|s| s.source);
        MergeReport {
            emitted: self.finished.iter().map(|s| s.emitted).sum(),
            write_errors: self.write_errors,
            sources: self.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortmerge_types::{SortOrder, ValueKind};

    fn engine(kind: ValueKind, order: SortOrder) -> MergeEngine {
        let config = MergeConfig::new(MergeMode::new(kind, order), "out.txt", vec!["in".into()]);
        MergeEngine::new(&config, Arc::new(CompletionTracker::new()))
    }

    /// Preload a lane fully and mark it complete, so no feed thread is needed.
    fn preload(engine: &mut MergeEngine, index: usize, values: &[&str]) -> Arc<BoundedBuffer> {
        let id = SourceId::new(index);
        let buffer = engine.add_source(id, format!("in{index}"));
        for v in values {
            buffer.push(v.to_string()).unwrap();
        }
        engine.tracker.on_complete(id);
        buffer
    }

    fn sink() -> OutputSink<Vec<u8>> {
        OutputSink::from_writer("mem", Vec::new())
    }

    fn output(sink: OutputSink<Vec<u8>>) -> Vec<String> {
        String::from_utf8(sink.close().unwrap())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn picks_minimum_front_in_ascending_mode() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["5"]);
        preload(&mut e, 1, &["2"]);
        preload(&mut e, 2, &["9"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(2)));
        assert_eq!(e.step(&mut out), Step::Finished);
        assert_eq!(output(out), vec!["2", "5", "9"]);
    }

    #[test]
    fn picks_maximum_front_in_descending_mode() {
        let mut e = engine(ValueKind::String, SortOrder::Descending);
        preload(&mut e, 0, &["banana"]);
        preload(&mut e, 1, &["cherry"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
    }

    #[test]
    fn ties_go_to_the_earliest_source() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["4"]);
        preload(&mut e, 1, &["4"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
    }

    #[test]
    fn waits_for_live_source_with_empty_buffer() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["1"]);
        let live = e.add_source(SourceId::new(1), "live");
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Waiting);
        live.push("0".into()).unwrap();
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
    }

    #[test]
    fn exhausted_empty_source_is_retired() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &[]);
        preload(&mut e, 1, &["3"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
        assert_eq!(e.active_count(), 1);
        assert_eq!(e.step(&mut out), Step::Finished);
        assert_eq!(e.active_count(), 0);
    }

    #[test]
    fn non_integer_front_drops_source_without_emitting() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["1"]);
        let bad = preload(&mut e, 1, &["oops", "2"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Dropped(SourceId::new(1)));
        assert!(bad.is_closed());
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Finished);

        let report = e.into_report();
        assert_eq!(report.emitted, 1);
        assert_eq!(
            report.sources[1].status,
            SourceStatus::Dropped(DropReason::InvalidValue { line: "oops".into() })
        );
    }

    #[test]
    fn non_integer_back_drops_winner() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["1", "x"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Dropped(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Finished);
        assert!(output(out).is_empty());
    }

    #[test]
    fn integer_beyond_i32_drops_source() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["1", "3000000000"]);
        preload(&mut e, 1, &["2"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Dropped(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
        assert_eq!(e.step(&mut out), Step::Finished);
        let report = e.into_report();
        assert_eq!(report.dropped_count(), 1);
        assert_eq!(output(out), vec!["2"]);
    }

    #[test]
    fn out_of_order_window_drops_source() {
        let mut e = engine(ValueKind::Integer, SortOrder::Ascending);
        preload(&mut e, 0, &["2", "1"]);
        preload(&mut e, 1, &["3"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Dropped(SourceId::new(0)));
        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(1)));
        let report = e.into_report();
        assert_eq!(
            report.sources[0].status,
            SourceStatus::Dropped(DropReason::OrderViolation {
                front: "2".into(),
                back: "1".into()
            })
        );
    }

    #[test]
    fn order_check_respects_descending_mode() {
        let mut e = engine(ValueKind::Integer, SortOrder::Descending);
        preload(&mut e, 0, &["9", "3"]);
        let mut out = sink();

        assert_eq!(e.step(&mut out), Step::Emitted(SourceId::new(0)));
    }

    #[test]
    fn skipped_sources_appear_in_report_order() {
        let mut e = engine(ValueKind::String, SortOrder::Ascending);
        preload(&mut e, 1, &["a"]);
        e.record_skipped(SourceId::new(0), "gone", DropReason::OpenFailed("not found".into()));
        let mut out = sink();

        let report = e.run(&mut out);
        assert_eq!(report.sources.len(), 2);
        assert_eq!(report.sources[0].source, SourceId::new(0));
        assert!(report.sources[0].is_dropped());
        assert_eq!(report.sources[1].emitted, 1);
        assert_eq!(output(out), vec!["a"]);
    }
}
