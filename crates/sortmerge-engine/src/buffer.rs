use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use sortmerge_types::MAX_BUFFER_CAPACITY;

use crate::error::BufferClosed;
use crate::signal::Doorbell;

struct BufferState {
    values: VecDeque<String>,
    closed: bool,
    high_water: usize,
}

/// Bounded FIFO between one source feed and the merge.
///
/// Exactly one producer pushes and exactly one consumer peeks and pops.
/// A push into a full buffer blocks the producer until the consumer frees
/// a slot or closes the buffer; this is the only backpressure in the run.
pub struct BoundedBuffer {
    capacity: usize,
    state: Mutex<BufferState>,
    not_full: Condvar,
    doorbell: Option<Arc<Doorbell>>,
}

impl BoundedBuffer {
    /// Create a buffer holding at most `capacity` values, clamped to
    /// `1..=MAX_BUFFER_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, MAX_BUFFER_CAPACITY),
            state: Mutex::new(BufferState {
                values: VecDeque::with_capacity(MAX_BUFFER_CAPACITY),
                closed: false,
                high_water: 0,
            }),
            not_full: Condvar::new(),
            doorbell: None,
        }
    }

    /// Ring `doorbell` after every successful push.
    pub fn with_doorbell(mut self, doorbell: Arc<Doorbell>) -> Self {
        self.doorbell = Some(doorbell);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a value, blocking while the buffer is full.
    pub fn push(&self, value: String) -> Result<(), BufferClosed> {
        let mut state = self.state.lock().expect("buffer mutex poisoned");
        while state.values.len() >= self.capacity && !state.closed {
            state = self.not_full.wait(state).expect("buffer mutex poisoned");
        }
        if state.closed {
            return Err(BufferClosed);
        }
        state.values.push_back(value);
        state.high_water = state.high_water.max(state.values.len());
        drop(state);

        if let Some(bell) = &self.doorbell {
            bell.ring();
        }
        Ok(())
    }

    /// Oldest buffered value, if any.
    pub fn front(&self) -> Option<String> {
        let state = self.state.lock().expect("buffer mutex poisoned");
        state.values.front().cloned()
    }

    /// Oldest and newest buffered values, taken under one lock.
    ///
    /// `None` unless at least two values are buffered.
    pub fn window(&self) -> Option<(String, String)> {
        let state = self.state.lock().expect("buffer mutex poisoned");
        if state.values.len() < 2 {
            return None;
        }
        let front = state.values.front()?.clone();
        let back = state.values.back()?.clone();
        Some((front, back))
    }

    /// Remove and return the oldest value, waking a blocked producer.
    pub fn pop(&self) -> Option<String> {
        let mut state = self.state.lock().expect("buffer mutex poisoned");
        let value = state.values.pop_front();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("buffer mutex poisoned").values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting values. Pending and future pushes fail with
    /// [`BufferClosed`]; already buffered values are discarded.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("buffer mutex poisoned");
        state.closed = true;
        state.values.clear();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("buffer mutex poisoned").closed
    }

    /// Largest number of values ever held at once.
    pub fn high_water(&self) -> usize {
        self.state.lock().expect("buffer mutex poisoned").high_water
    }
}

impl std::fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
