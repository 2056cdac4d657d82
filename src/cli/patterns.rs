// src/cli/patterns.rs — Pattern table inspection and mining

use std::sync::Arc;

use crate::core::types::{Event, PatternKey};
use crate::infra::config::Config;
use crate::memory::{read_or_default, SqliteStorage, Storage};
use crate::patterns::PatternMiner;

/// Handle `flowcast patterns`.
pub fn show_patterns(storage: &SqliteStorage, limit: u32) -> anyhow::Result<()> {
    let top = storage.top_patterns(limit)?;
    if top.is_empty() {
        println!("No patterns mined yet. Replay some events, then run `flowcast rebuild`.");
        return Ok(());
    }

    let log = read_or_default(storage.read_event_log(), "event log");
    println!("Top patterns ({}):", storage.namespace());
    println!();
    for (key, count) in &top {
        println!("  {:>6}x  {}", count, describe(key, &log));
    }
    Ok(())
}

/// Render a key with signatures where the ids are still in the log.
fn describe(key: &PatternKey, log: &[Event]) -> String {
    key.tokens()
        .iter()
        .map(|id| {
            log.iter()
                .rev()
                .find(|e| &e.id == id)
                .map(|e| e.signature.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Handle `flowcast rebuild`.
pub fn rebuild(storage: Arc<SqliteStorage>, config: &Config) -> anyhow::Result<()> {
    let log = storage.read_event_log()?;
    let miner = PatternMiner::new(storage, config.kernel.max_pattern_length);
    let stats = miner.rebuild(&log)?;
    println!(
        "Scanned {} events: {} occurrences, {} distinct patterns",
        stats.events, stats.occurrences, stats.distinct_patterns
    );
    Ok(())
}
