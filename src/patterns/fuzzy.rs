// src/patterns/fuzzy.rs — Similarity fallback when no n-gram matches
//
// Finds historical events whose signature resembles the latest one and
// votes on what usually came next.

use std::collections::HashMap;

use crate::core::types::{Event, PredictionSource};
use crate::patterns::predictor::Continuation;

const URL_WEIGHT: f64 = 0.8;
const METHOD_WEIGHT: f64 = 0.2;

/// Normalized edit-distance similarity in [0, 1]; 1 means identical.
pub fn url_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// `0.8 * url similarity + 0.2 * same method`.
pub fn event_similarity(a: &Event, b: &Event) -> f64 {
    let same_method = match (a.method(), b.method()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => false,
    };
    URL_WEIGHT * url_similarity(a.target(), b.target())
        + METHOD_WEIGHT * if same_method { 1.0 } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Tally what followed every logged event similar to `last` and return
    /// the most common follower. Confidence is its share of the tally.
    pub fn continuation(&self, last: &Event, log: &[Event]) -> Option<(Continuation, Event)> {
        let mut tallies: HashMap<&str, (u32, &Event)> = HashMap::new();
        let mut similar = 0usize;
        let mut total = 0u32;

        for (pos, candidate) in log.iter().enumerate() {
            if candidate.id == last.id {
                continue;
            }
            if event_similarity(last, candidate) <= self.threshold {
                continue;
            }
            similar += 1;
            if let Some(follower) = log.get(pos + 1) {
                let entry = tallies.entry(follower.id.as_str()).or_insert((0, follower));
                entry.0 += 1;
                total += 1;
            }
        }

        if similar == 0 || total == 0 {
            return None;
        }

        let (id, (tally, follower)) = tallies
            .into_iter()
            .max_by(|(a_id, (a, _)), (b_id, (b, _))| a.cmp(b).then_with(|| b_id.cmp(a_id)))?;

        tracing::debug!(
            "Similarity fallback: {} similar events, '{}' followed {}/{}",
            similar,
            id,
            tally,
            total
        );

        Some((
            Continuation {
                id: id.to_string(),
                confidence: tally as f64 / total as f64,
                context: format!("Similar to {} ({} of {} times)", last.signature, tally, total),
                source: PredictionSource::Similarity,
            },
            follower.clone(),
        ))
    }
}
