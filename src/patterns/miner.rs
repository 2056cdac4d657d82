// src/patterns/miner.rs — n-gram mining over the event log

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::types::{Event, PatternKey};
use crate::infra::errors::FlowError;
use crate::memory::{read_or_default, Storage};

/// Maintains the pattern table: n-gram → occurrence count.
///
/// Each rebuild adds this pass's occurrences on top of the stored counts, so
/// counts only ever grow. Re-running over an unchanged log double-counts; the
/// table is a lifetime tally, not a snapshot.
pub struct PatternMiner {
    storage: Arc<dyn Storage>,
    max_pattern_length: usize,
}

/// Summary of one rebuild pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Events scanned.
    pub events: usize,
    /// n-gram occurrences found in this pass.
    pub occurrences: u64,
    /// Distinct keys in the table after the pass.
    pub distinct_patterns: usize,
}

impl PatternMiner {
    pub fn new(storage: Arc<dyn Storage>, max_pattern_length: usize) -> Self {
        Self {
            storage,
            max_pattern_length: max_pattern_length.max(2),
        }
    }

    /// Scan the log and fold this pass's counts into the stored table.
    pub fn rebuild(&self, log: &[Event]) -> Result<RebuildStats, FlowError> {
        let found = count_ngrams(log, self.max_pattern_length);
        let occurrences = found.values().sum();

        let mut table = read_or_default(self.storage.get_patterns(), "patterns");
        for (key, count) in found {
            *table.entry(key).or_insert(0) += count;
        }
        self.storage.set_patterns(&table)?;

        let stats = RebuildStats {
            events: log.len(),
            occurrences,
            distinct_patterns: table.len(),
        };
        tracing::debug!(
            "Pattern rebuild: {} events, {} occurrences, {} distinct patterns",
            stats.events,
            stats.occurrences,
            stats.distinct_patterns
        );
        Ok(stats)
    }
}

/// Count every contiguous id-sequence of length 2..=max_len in `log`.
pub fn count_ngrams(log: &[Event], max_len: usize) -> HashMap<PatternKey, u64> {
    let mut counts: HashMap<PatternKey, u64> = HashMap::new();
    for len in 2..=max_len {
        for window in log.windows(len) {
            *counts.entry(PatternKey::from_events(window)).or_default() += 1;
        }
    }
    counts
}

/// Debounced timer for periodic rebuilds.
///
/// The first event after a rebuild arms the timer; further events while it
/// is armed leave the deadline untouched.
#[derive(Debug, Clone)]
pub struct RebuildSchedule {
    interval_ms: i64,
    due_at: Option<i64>,
}

impl RebuildSchedule {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            due_at: None,
        }
    }

    /// Arm the timer if it is not armed. Returns true when newly armed.
    pub fn schedule(&mut self, now: i64) -> bool {
        if self.due_at.is_some() {
            return false;
        }
        self.due_at = Some(now + self.interval_ms);
        true
    }

    /// Disarm and return true if the deadline has passed.
    pub fn take_due(&mut self, now: i64) -> bool {
        match self.due_at {
            Some(due) if now >= due => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm regardless of the deadline. Returns whether it was armed.
    pub fn take(&mut self) -> bool {
        self.due_at.take().is_some()
    }

    pub fn due_at(&self) -> Option<i64> {
        self.due_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;

    fn log(ids: &[&str]) -> Vec<Event> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Event::new(*id, format!("GET:/{id}"), i as i64))
            .collect()
    }

    fn key(ids: &[&str]) -> PatternKey {
        PatternKey::new(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_count_ngrams_lengths() {
        let counts = count_ngrams(&log(&["a", "b", "a", "b"]), 3);
        assert_eq!(counts[&key(&["a", "b"])], 2);
        assert_eq!(counts[&key(&["b", "a"])], 1);
        assert_eq!(counts[&key(&["a", "b", "a"])], 1);
        assert_eq!(counts[&key(&["b", "a", "b"])], 1);
        assert!(counts.keys().all(|k| (2..=3).contains(&k.len())));
    }

    #[test]
    fn test_count_ngrams_short_log() {
        assert!(count_ngrams(&log(&["a"]), 5).is_empty());
        assert!(count_ngrams(&[], 5).is_empty());
    }

    #[test]
    fn test_rebuild_accumulates() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new(100));
        let miner = PatternMiner::new(storage.clone(), 3);
        let events = log(&["a", "b", "c"]);

        miner.rebuild(&events).unwrap();
        let first = storage.get_patterns().unwrap();
        assert_eq!(first[&key(&["a", "b"])], 1);

        let stats = miner.rebuild(&events).unwrap();
        let second = storage.get_patterns().unwrap();
        assert_eq!(second[&key(&["a", "b"])], 2);
        assert_eq!(second[&key(&["a", "b", "c"])], 2);
        assert_eq!(stats.occurrences, 3);
        assert_eq!(stats.distinct_patterns, 3);
    }

    #[test]
    fn test_schedule_is_debounced() {
        let mut schedule = RebuildSchedule::new(30_000);
        assert!(schedule.schedule(1_000));
        assert!(!schedule.schedule(5_000));
        assert_eq!(schedule.due_at(), Some(31_000));

        assert!(!schedule.take_due(30_999));
        assert!(schedule.take_due(31_000));
        assert_eq!(schedule.due_at(), None);

        // Re-arms after firing
        assert!(schedule.schedule(40_000));
        assert!(schedule.take());
        assert!(!schedule.take());
    }
}
