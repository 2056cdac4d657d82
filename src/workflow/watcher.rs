// src/workflow/watcher.rs — Repeated-transition detection

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{AutomationSuggestion, Event};

/// An adjacent (from, to) pair of event signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionKey {
    pub from: String,
    pub to: String,
}

impl TransitionKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionCounter {
    pub count: u32,
    pub last_suggested_at: Option<i64>,
}

/// Counts live transitions and proposes automating the ones that recur.
#[derive(Debug)]
pub struct RepetitionWatcher {
    threshold: u32,
    cooldown_ms: i64,
    counters: HashMap<TransitionKey, TransitionCounter>,
}

impl RepetitionWatcher {
    pub fn new(threshold: u32, cooldown_ms: i64) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown_ms,
            counters: HashMap::new(),
        }
    }

    /// Count one occurrence of `current` followed by `next`.
    ///
    /// Returns a suggestion when the pair has reached the threshold and was
    /// not suggested within the cooldown.
    pub fn observe(
        &mut self,
        current: &Event,
        next: &Event,
        now: i64,
    ) -> Option<AutomationSuggestion> {
        if current.signature == next.signature {
            return None;
        }

        let key = TransitionKey::new(&current.signature, &next.signature);
        let counter = self.counters.entry(key).or_default();
        counter.count = counter.count.saturating_add(1);

        if counter.count < self.threshold {
            return None;
        }
        let cooled = match counter.last_suggested_at {
            None => true,
            Some(at) => now.saturating_sub(at) > self.cooldown_ms,
        };
        if !cooled {
            return None;
        }

        counter.last_suggested_at = Some(now);
        tracing::info!(
            "Repeated transition {} → {} ({}x), suggesting automation",
            current.signature,
            next.signature,
            counter.count
        );
        Some(AutomationSuggestion {
            current: current.clone(),
            next: next.clone(),
            count: counter.count,
        })
    }

    pub fn counter(&self, from: &str, to: &str) -> Option<&TransitionCounter> {
        self.counters.get(&TransitionKey::new(from, to))
    }

    pub fn count(&self, from: &str, to: &str) -> u32 {
        self.counter(from, to).map_or(0, |c| c.count)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    fn pair() -> (Event, Event) {
        (
            Event::new("1", "GET:/inbox", 0),
            Event::new("2", "POST:/archive", 0),
        )
    }

    #[test]
    fn test_suggests_once_at_threshold() {
        let mut watcher = RepetitionWatcher::new(3, HOUR);
        let (a, b) = pair();

        assert!(watcher.observe(&a, &b, 1_000).is_none());
        assert!(watcher.observe(&a, &b, 2_000).is_none());
        let suggestion = watcher.observe(&a, &b, 3_000).unwrap();
        assert_eq!(suggestion.count, 3);
        assert_eq!(suggestion.current.signature, "GET:/inbox");

        // Within the cooldown nothing more is suggested
        assert!(watcher.observe(&a, &b, 4_000).is_none());
        assert!(watcher.observe(&a, &b, 3_000 + HOUR).is_none());
        assert_eq!(watcher.count("GET:/inbox", "POST:/archive"), 5);
    }

    #[test]
    fn test_suggests_again_after_cooldown() {
        let mut watcher = RepetitionWatcher::new(3, HOUR);
        let (a, b) = pair();
        for t in 0..3 {
            watcher.observe(&a, &b, t);
        }
        let again = watcher.observe(&a, &b, 2 + HOUR + 1).unwrap();
        assert_eq!(again.count, 4);
        assert_eq!(
            watcher.counter("GET:/inbox", "POST:/archive").unwrap().last_suggested_at,
            Some(2 + HOUR + 1)
        );
    }

    #[test]
    fn test_self_pairs_are_ignored() {
        let mut watcher = RepetitionWatcher::new(1, HOUR);
        let a = Event::new("1", "GET:/poll", 0);
        let b = Event::new("2", "GET:/poll", 0);
        assert!(watcher.observe(&a, &b, 0).is_none());
        assert!(watcher.is_empty());
    }

    #[test]
    fn test_pairs_are_directional() {
        let mut watcher = RepetitionWatcher::new(3, HOUR);
        let (a, b) = pair();
        watcher.observe(&a, &b, 0);
        watcher.observe(&b, &a, 0);
        assert_eq!(watcher.count("GET:/inbox", "POST:/archive"), 1);
        assert_eq!(watcher.count("POST:/archive", "GET:/inbox"), 1);
        assert_eq!(watcher.len(), 2);
    }
}
