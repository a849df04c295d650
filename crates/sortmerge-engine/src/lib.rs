//! Concurrent k-way merge engine for sortmerge.
//!
//! Merges any number of pre-sorted line files into one sorted output.
//! Every input is read on its own thread into a [`BoundedBuffer`] of at
//! most two values; a single [`MergeEngine`] repeatedly takes the next
//! value across all buffers and appends it to an [`OutputSink`]. Feeds
//! announce end of input through a [`CompletionTracker`], which knows
//! nothing about the engine beyond its registered listeners.
//!
//! Malformed inputs (unparseable values, or a buffered window that
//! contradicts the sort order) are dropped and the merge continues with
//! the rest. Only an uncreatable output or a run with no readable inputs
//! fails as a whole. [`run_merge`] wires everything together.

pub mod buffer;
pub mod engine;
pub mod error;
pub mod feed;
pub mod orchestrator;
pub mod report;
pub mod signal;
pub mod sink;
pub mod tracker;

pub use buffer::BoundedBuffer;
pub use engine::{MergeEngine, Step};
pub use error::{BufferClosed, DropReason, EngineError, Result};
pub use feed::{FeedOutcome, FeedSummary, SourceFeed};
pub use orchestrator::run_merge;
pub use report::{MergeReport, SourceReport, SourceStatus};
pub use signal::Doorbell;
pub use sink::OutputSink;
pub use tracker::{CompletionListener, CompletionTracker};
