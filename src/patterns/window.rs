// src/patterns/window.rs — Bounded window of the most recent events

use std::collections::VecDeque;

use crate::core::types::Event;

/// The live matching context: the last `max_len` events, oldest first.
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    events: VecDeque<Event>,
    max_len: usize,
}

impl SequenceWindow {
    pub fn new(max_len: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_len),
            max_len: max_len.max(1),
        }
    }

    /// Append an event, evicting the oldest ones beyond capacity.
    pub fn add(&mut self, event: Event) {
        self.events.push_back(event);
        while self.events.len() > self.max_len {
            self.events.pop_front();
        }
    }

    /// Owned copy for scoring; later `add` calls never affect it.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
