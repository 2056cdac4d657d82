// src/patterns/predictor.rs — Next-event prediction from the pattern table

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::types::{Event, PatternKey, PredictionSource};

/// Time constant of the recency decay, in milliseconds.
pub const RECENCY_DECAY_MS: f64 = 3_600_000.0;

const FREQUENCY_WEIGHT: f64 = 0.6;
const LENGTH_WEIGHT: f64 = 0.3;
const RECENCY_WEIGHT: f64 = 0.1;

/// A predicted next event id, before it is resolved to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    pub id: String,
    pub confidence: f64,
    pub context: String,
    pub source: PredictionSource,
}

/// Blend of how often a pattern was seen, how specific it is, and how
/// fresh the current window is. Always within [0, 1].
pub fn confidence(frequency: u64, token_count: usize, delta_ms: f64) -> f64 {
    let frequency = (frequency as f64 / 10.0).min(1.0);
    let specificity = (token_count as f64 / 10.0).min(1.0);
    let score = FREQUENCY_WEIGHT * frequency
        + LENGTH_WEIGHT * specificity
        + RECENCY_WEIGHT * recency_factor(delta_ms);
    score.clamp(0.0, 1.0)
}

/// `exp(-Δt / 1h)`, with future timestamps treated as Δt = 0.
pub fn recency_factor(delta_ms: f64) -> f64 {
    if delta_ms.is_nan() {
        return 0.0;
    }
    (-delta_ms.max(0.0) / RECENCY_DECAY_MS).exp().clamp(0.0, 1.0)
}

/// Mean timestamp of the window, `None` when empty.
pub fn mean_timestamp(events: &[Event]) -> Option<f64> {
    if events.is_empty() {
        return None;
    }
    let sum: f64 = events.iter().map(|e| e.timestamp as f64).sum();
    Some(sum / events.len() as f64)
}

/// Longest-prefix lookup over the n-gram table.
#[derive(Debug, Clone)]
pub struct Predictor {
    max_pattern_length: usize,
    min_confidence: f64,
}

impl Predictor {
    pub fn new(max_pattern_length: usize, min_confidence: f64) -> Self {
        Self {
            max_pattern_length: max_pattern_length.max(2),
            min_confidence,
        }
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Best continuation of `window` found in `patterns`.
    ///
    /// Prefixes are tried longest first (down to 2 ids); the first prefix
    /// length with any candidate at or above the threshold wins. Within a
    /// length the highest confidence wins, and equal confidences go to the
    /// lexicographically smallest pattern key.
    pub fn from_pattern_table(
        &self,
        window: &[Event],
        patterns: &HashMap<PatternKey, u64>,
        now: i64,
    ) -> Option<Continuation> {
        if window.len() < 2 {
            return None;
        }

        let delta_ms = mean_timestamp(window).map_or(f64::INFINITY, |avg| now as f64 - avg);
        let ids: Vec<String> = window.iter().map(|e| e.id.clone()).collect();
        let longest_prefix = ids.len().min(self.max_pattern_length - 1);

        for prefix_len in (2..=longest_prefix).rev() {
            let prefix = &ids[ids.len() - prefix_len..];
            let mut best: Option<(f64, &PatternKey, &str, u64)> = None;

            for (key, &count) in patterns {
                let Some(next) = key.continuation_after(prefix) else {
                    continue;
                };
                let score = confidence(count, key.len(), delta_ms);
                if score < self.min_confidence {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_score, best_key, _, _)) => match score.total_cmp(&best_score) {
                        Ordering::Greater => true,
                        Ordering::Equal => key < best_key,
                        Ordering::Less => false,
                    },
                };
                if better {
                    best = Some((score, key, next, count));
                }
            }

            if let Some((score, key, next, count)) = best {
                return Some(Continuation {
                    id: next.to_string(),
                    confidence: score,
                    context: format!(
                        "Follows {} (pattern {} seen {}x)",
                        prefix.join(" → "),
                        key,
                        count
                    ),
                    source: PredictionSource::Pattern,
                });
            }
        }

        None
    }
}
