use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::debug;

use sortmerge_types::SourceId;

/// Reacts to a source reaching end of input.
///
/// Called on the feed's thread; implementations must not block.
pub trait CompletionListener: Send + Sync {
    fn on_complete(&self, source: SourceId);
}

/// Registry of sources that have finished producing.
///
/// Feeds report here without knowing who listens. The merge queries
/// [`is_complete`](Self::is_complete) every iteration; any number of
/// listeners may additionally be notified as completions happen.
#[derive(Default)]
pub struct CompletionTracker {
    completed: RwLock<HashSet<SourceId>>,
    listeners: RwLock<Vec<Arc<dyn CompletionListener>>>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for all future completions.
    pub fn subscribe(&self, listener: Arc<dyn CompletionListener>) {
        self.listeners
            .write()
            .expect("tracker lock poisoned")
            .push(listener);
    }

    /// Record that `source` has no more values and notify listeners.
    pub fn on_complete(&self, source: SourceId) {
        let first = self
            .completed
            .write()
            .expect("tracker lock poisoned")
            .insert(source);
        if !first {
            debug!(%source, "duplicate completion ignored");
            return;
        }
        debug!(%source, "source exhausted");

        let listeners = self.listeners.read().expect("tracker lock poisoned");
        for listener in listeners.iter() {
            listener.on_complete(source);
        }
    }

    pub fn is_complete(&self, source: SourceId) -> bool {
        self.completed
            .read()
            .expect("tracker lock poisoned")
            .contains(&source)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.read().expect("tracker lock poisoned").len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().expect("tracker lock poisoned").len()
    }
}
