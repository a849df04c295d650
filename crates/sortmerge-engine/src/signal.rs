use std::sync::{Condvar, Mutex};
use std::time::Duration;

use sortmerge_types::SourceId;

use crate::tracker::CompletionListener;

/// Wake-up signal for the merge thread.
///
/// Rung by producers after every push and by the tracker on every
/// completion. A ring that arrives while nobody waits is remembered, so
/// the next [`wait`](Doorbell::wait) returns immediately.
#[derive(Default)]
pub struct Doorbell {
    rung: Mutex<bool>,
    cv: Condvar,
}

impl Doorbell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ring(&self) {
        let mut rung = self.rung.lock().expect("doorbell mutex poisoned");
        *rung = true;
        self.cv.notify_one();
    }

    /// Block until rung or until `timeout` elapses. Returns `true` if rung.
    pub fn wait(&self, timeout: Duration) -> bool {
        let rung = self.rung.lock().expect("doorbell mutex poisoned");
        let (mut rung, _) = self
            .cv
            .wait_timeout_while(rung, timeout, |rung| !*rung)
            .expect("doorbell mutex poisoned");
        std::mem::replace(&mut *rung, false)
    }
}

impl CompletionListener for Doorbell {
    fn on_complete(&self, _source: SourceId) {
        self.ring();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ring_before_wait_is_not_lost() {
        let bell = Doorbell::new();
        bell.ring();
        assert!(bell.wait(Duration::from_secs(5)));
        // Consumed by the first wait.
        assert!(!bell.wait(Duration::from_millis(1)));
    }

    #[test]
    fn wait_times_out_without_ring() {
        let bell = Doorbell::new();
        assert!(!bell.wait(Duration::from_millis(5)));
    }

    #[test]
    fn ring_from_other_thread_wakes_waiter() {
        let bell = Arc::new(Doorbell::new());
        let remote = Arc::clone(&bell);
        let handle = thread::spawn(move || remote.ring());
        assert!(bell.wait(Duration::from_secs(5)));
        handle.join().unwrap();
    }
}
