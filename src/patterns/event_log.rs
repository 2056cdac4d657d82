// src/patterns/event_log.rs — Append-only event history

use std::sync::Arc;

use crate::core::types::Event;
use crate::memory::{read_or_default, Storage};

/// Capped, append-only history of every observed event, kept by the
/// storage adapter.
#[derive(Clone)]
pub struct EventLog {
    storage: Arc<dyn Storage>,
}

impl EventLog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Record an event. A failed write is logged; the kernel keeps going.
    pub fn append(&self, event: &Event) {
        if let Err(e) = self.storage.append_event(event) {
            tracing::warn!("Failed to persist event {}: {}", event.id, e);
        }
    }

    /// The full retained log, oldest first; empty if the store is unreadable.
    pub fn read(&self) -> Vec<Event> {
        read_or_default(self.storage.read_event_log(), "event log")
    }

    /// Find the most recent logged event with this id.
    pub fn find(&self, id: &str) -> Option<Event> {
        self.read().into_iter().rev().find(|e| e.id == id)
    }
}
