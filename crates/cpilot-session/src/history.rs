//! Bounded history of inference events.
//!
//! A fixed-capacity ring: once full, each append overwrites the oldest
//! slot. Iteration is always in insertion order, oldest first.

use cpilot_models::InferenceEvent;

use crate::error::{SessionError, SessionResult};

/// FIFO ring buffer of the most recent `capacity` events.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    slots: Vec<InferenceEvent>,
    /// Index of the oldest event once the ring is full.
    head: usize,
    capacity: usize,
}

impl HistoryLog {
    /// Create an empty log. A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> SessionResult<Self> {
        if capacity == 0 {
            return Err(SessionError::config_error("history capacity must be positive"));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append an event, evicting the oldest one when full.
    pub fn append(&mut self, event: InferenceEvent) {
        if self.slots.len() < self.capacity {
            self.slots.push(event);
        } else {
            self.slots[self.head] = event;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Events oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &InferenceEvent> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// All retained events, most recent last.
    pub fn recent(&self) -> Vec<InferenceEvent> {
        self.iter().copied().collect()
    }

    /// The last `n` events, most recent last.
    pub fn recent_n(&self, n: usize) -> Vec<InferenceEvent> {
        let skip = self.len().saturating_sub(n);
        self.iter().skip(skip).copied().collect()
    }

    pub fn latest(&self) -> Option<&InferenceEvent> {
        self.iter().next_back()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}
